pub mod adapter;
pub mod analysis_service;
pub mod auth_service;
pub mod embedding;
pub mod hub_client;
pub mod matcher;
pub mod pdf;
pub mod publish_service;
pub mod sections;
pub mod summarizer;
pub mod training_service;
pub mod user_service;

pub use adapter::{Adapter, TrainingParams, TrainingReport};
pub use analysis_service::AnalysisService;
pub use auth_service::AuthService;
pub use embedding::{Embedder, FastEmbedder, HashingEmbedder};
pub use hub_client::HubClient;
pub use matcher::MatchModel;
pub use publish_service::PublishService;
pub use summarizer::{ExtractiveSummarizer, RemoteSummarizer, Summarizer};
pub use training_service::TrainingService;
pub use user_service::UserService;
