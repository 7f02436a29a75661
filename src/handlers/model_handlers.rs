use crate::error::AppError;
use crate::services::hub_client::HubError;
use crate::services::publish_service::PublishError;
use crate::services::training_service::TrainingError;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde_json::{json, Value};

const CSV_FIELD: &str = "file";

pub async fn train_handler(
    State(app_state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let mut multipart = multipart?;
    let mut csv = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(CSV_FIELD) {
            csv = Some(field.bytes().await?);
        }
    }

    let csv = csv.ok_or_else(|| AppError::Validation("CSV file missing".to_string()))?;

    match app_state.training_service.train_csv(&csv).await {
        Ok(_) => Ok(Json(json!({ "message": "Model fine-tuned and saved." }))),
        Err(TrainingError::MissingColumns) => {
            Err(AppError::Validation(TrainingError::MissingColumns.to_string()))
        }
        Err(e) => {
            tracing::error!("Training failed: {}", e);
            Err(AppError::Internal(e.to_string()))
        }
    }
}

pub async fn push_model_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    match app_state.publish_service.push().await {
        Ok(url) => Ok(Json(json!({
            "message": format!("Model pushed to Hugging Face: {}", url)
        }))),
        Err(e @ PublishError::MissingToken) => Err(AppError::Unauthorized(e.to_string())),
        Err(e @ PublishError::Hub(HubError::Http { .. })) => {
            tracing::warn!("Hub rejected push: {}", e);
            Err(AppError::Forbidden(e.to_string()))
        }
        Err(e) => {
            tracing::error!("Model push failed: {}", e);
            Err(AppError::Internal(e.to_string()))
        }
    }
}
