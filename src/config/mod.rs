pub mod session;
pub mod settings;

pub use settings::{ConfigError, EmbeddingBackend, RemoteSummarizerSettings, Settings};
