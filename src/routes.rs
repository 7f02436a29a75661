use crate::{auth, config::session::SessionLayer, handlers, middleware::add_security_headers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// The full HTTP surface. `max_upload_bytes` caps every request body.
pub fn build_router(
    app_state: AppState,
    session_layer: SessionLayer,
    max_upload_bytes: usize,
) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(auth::handlers::me_handler))
        .layer(middleware::from_fn(auth::middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/analyze_resume", post(handlers::analyze_resume_handler))
        .route("/train", post(handlers::train_handler))
        .route("/push_model", post(handlers::push_model_handler))
        .route("/register", post(auth::handlers::register_handler))
        .route("/login", post(auth::handlers::login_handler))
        .route("/logout", post(auth::handlers::logout_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(session_layer)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
