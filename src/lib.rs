pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use config::{EmbeddingBackend, Settings};
use repositories::SqliteUserRepository;
use services::{
    embedding::EmbeddingError, AnalysisService, AuthService, Embedder, ExtractiveSummarizer,
    FastEmbedder, HashingEmbedder, HubClient, MatchModel, PublishService, RemoteSummarizer,
    Summarizer, TrainingParams, TrainingService, UserService,
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub analysis_service: Arc<AnalysisService>,
    pub training_service: Arc<TrainingService>,
    pub publish_service: Arc<PublishService>,
    pub model: Arc<MatchModel>,
    pub pool: SqlitePool,
}

impl AppState {
    /// Wires every service around one shared model instance.
    pub fn new(pool: SqlitePool, model: Arc<MatchModel>, settings: &Settings) -> Self {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));

        let summarizer: Arc<dyn Summarizer> = match &settings.summarizer {
            Some(remote) => {
                tracing::info!(url = %remote.url, "Using remote summarizer");
                Arc::new(RemoteSummarizer::new(remote.clone()))
            }
            None => Arc::new(ExtractiveSummarizer::new(model.clone())),
        };

        AppState {
            user_service: Arc::new(UserService::new(user_repository.clone())),
            auth_service: Arc::new(AuthService::new(user_repository)),
            analysis_service: Arc::new(AnalysisService::new(model.clone(), summarizer)),
            training_service: Arc::new(TrainingService::new(
                model.clone(),
                settings.model_dir.clone(),
                TrainingParams::default(),
            )),
            publish_service: Arc::new(PublishService::new(
                model.clone(),
                HubClient::new(&settings.hf_endpoint),
                settings.hf_model_name.clone(),
                settings.hf_token.clone(),
            )),
            model,
            pool,
        }
    }
}

/// Builds the configured encoder and loads the fine-tuned adapter if present.
pub fn load_model(settings: &Settings) -> Result<Arc<MatchModel>, EmbeddingError> {
    let embedder: Arc<dyn Embedder> = match settings.embedding_backend {
        EmbeddingBackend::FastEmbed => Arc::new(FastEmbedder::new(
            &settings.embedding_model,
            settings.model_cache_dir.clone(),
        )?),
        EmbeddingBackend::Hashing => {
            tracing::warn!("Using hashing encoder; similarity is lexical only");
            Arc::new(HashingEmbedder::default())
        }
    };

    Ok(Arc::new(MatchModel::load(embedder, &settings.model_dir)))
}
