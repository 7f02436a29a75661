use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn health_handler(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": app_state.model.model_name(),
        "fine_tuned": app_state.model.is_fine_tuned(),
    }))
}
