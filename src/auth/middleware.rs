use crate::auth::SESSION_USER_ID;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_sessions::Session;

pub async fn require_auth(session: Session, request: Request, next: Next) -> Response {
    if let Ok(Some(_user_id)) = session.get::<i64>(SESSION_USER_ID).await {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Not logged in" })),
        )
            .into_response()
    }
}
