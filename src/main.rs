use resume_matcher::{
    config::{
        session::{validate_production_config, SessionConfig},
        Settings,
    },
    db, load_model, routes, AppState,
};

use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "resume_matcher=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    validate_production_config()?;

    // Database connection
    let pool = db::create_pool(&settings.database_url).await?;
    db::run_migrations(&pool).await?;

    // The encoder download can take a while on first start
    tracing::info!(model = %settings.embedding_model, "Loading sentence encoder...");
    let loader_settings = settings.clone();
    let model = tokio::task::spawn_blocking(move || load_model(&loader_settings)).await??;
    tracing::info!(
        model = model.model_name(),
        fine_tuned = model.is_fine_tuned(),
        "Model ready"
    );

    let app_state = AppState::new(pool.clone(), model, &settings);

    // Session store
    let session_store = SqliteStore::new(pool.clone()).with_table_name("sessions")?;
    session_store.migrate().await?;
    let session_layer = SessionConfig::from_env().create_layer(session_store);

    let app = routes::build_router(app_state, session_layer, settings.max_upload_bytes);

    let addr = settings.bind_addr();
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
