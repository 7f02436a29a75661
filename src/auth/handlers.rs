use crate::auth::{SESSION_EMAIL, SESSION_USER_ID};
use crate::error::AppError;
use crate::models::user::PublicUser;
use crate::services::{
    auth_service::{AuthServiceError, LoginRequest},
    user_service::{CreateUserRequest, UserServiceError},
};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct CredentialsPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn register_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    let request = CreateUserRequest {
        email: payload.email,
        password: payload.password,
    };

    match app_state.user_service.create_user(request).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "User registered successfully!" })),
        )
            .into_response()),
        Err(err) => Err(match err {
            UserServiceError::InvalidEmail | UserServiceError::WeakPassword => {
                AppError::Validation(err.to_string())
            }
            UserServiceError::EmailTaken => AppError::Conflict(err.to_string()),
            other => {
                tracing::error!("Registration failed: {}", other);
                AppError::Internal("Registration failed".to_string())
            }
        }),
    }
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    session: Session,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let request = LoginRequest {
        email: payload.email,
        password: payload.password,
    };

    match app_state.auth_service.authenticate(request).await {
        Ok(user) => {
            if let Err(e) = session.cycle_id().await {
                tracing::error!("Failed to rotate session id: {}", e);
                return session_failure();
            }
            if session.insert(SESSION_USER_ID, user.id).await.is_err()
                || session.insert(SESSION_EMAIL, &user.email).await.is_err()
            {
                return session_failure();
            }

            tracing::info!(user_id = user.id, "User logged in");
            (
                StatusCode::OK,
                Json(json!({ "message": "Login successful!" })),
            )
                .into_response()
        }
        Err(AuthServiceError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Login failed: {}", err);
            AppError::Internal("Login failed".to_string()).into_response()
        }
    }
}

fn session_failure() -> Response {
    AppError::Internal("Failed to create session".to_string()).into_response()
}

pub async fn logout_handler(session: Session) -> impl IntoResponse {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to clear session on logout: {}", e);
    }
    Json(json!({ "message": "Logged out" }))
}

/// Requires `require_auth` in front of it.
pub async fn me_handler(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<PublicUser>, AppError> {
    let user_id = session
        .get::<i64>(SESSION_USER_ID)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    match app_state.auth_service.get_user_by_id(user_id).await {
        Ok(user) => Ok(Json(PublicUser::from(&user))),
        Err(AuthServiceError::UserNotFound) => {
            if let Err(e) = session.flush().await {
                tracing::warn!("Failed to clear stale session: {}", e);
            }
            Err(AppError::Unauthorized("Not logged in".to_string()))
        }
        Err(err) => Err(AppError::Internal(err.to_string())),
    }
}
