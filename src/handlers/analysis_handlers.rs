use crate::error::AppError;
use crate::models::{AnalysisResult, JobPosting, UploadedResume};
use crate::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::collections::HashMap;

const RESUMES_FIELD: &str = "resumes";
const MISSING_FIELDS: &str = "Missing required form fields";

pub async fn analyze_resume_handler(
    State(app_state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<AnalysisResult>>, AppError> {
    let mut multipart = multipart?;
    let mut files = Vec::new();
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == RESUMES_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;

            // Browsers send an empty unnamed part when no file was picked.
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }
            files.push(UploadedResume {
                filename,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await?;
            fields.insert(name, value);
        }
    }

    let job = JobPosting::from_fields(&fields)
        .filter(|_| !files.is_empty())
        .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;

    tracing::debug!(files = files.len(), "Analyzing resumes");
    let results = app_state.analysis_service.analyze(&job, files).await;

    Ok(Json(results))
}
