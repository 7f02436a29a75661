//! Sentence encoders behind the matcher.
//!
//! - `FastEmbedder` runs a local ONNX sentence-transformer through fastembed,
//!   downloading it into the cache directory on first use.
//! - `HashingEmbedder` is a deterministic bag-of-words encoder that needs no
//!   model files; it backs offline deployments and the test suite.

use fastembed::{InitOptions, TextEmbedding};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Mutex;
use tokenizers::Tokenizer;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

/// A sentence encoder. Implementations must be deterministic for a given input.
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Number of tokens the encoder's tokenizer produces for `text`, without special tokens.
    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError>;
}

/// fastembed's `TextEmbedding`. `embed()` needs `&mut`, hence the mutex.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    // Copy of the model tokenizer with truncation and padding disabled.
    tokenizer: Tokenizer,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedder {
    /// Loads (downloading if needed) `model_name` into `cache_dir/models`.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let model_enum = Self::parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut model)?;
        let tokenizer = Self::counting_tokenizer(&model)?;
        tracing::info!(model = model_name, dimensions, "Loaded sentence encoder");

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
        match name.to_lowercase().trim_start_matches("sentence-transformers/") {
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l6-v2-q" | "allminiml6v2q" => {
                Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q)
            }
            "all-minilm-l12-v2" | "allminiml12v2" => {
                Ok(fastembed::EmbeddingModel::AllMiniLML12V2)
            }
            "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: all-MiniLM-L6-v2, all-MiniLM-L12-v2, bge-small-en-v1.5, bge-base-en-v1.5",
                name
            ))),
        }
    }

    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
        let test_embeddings = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::InitFailed(format!("Failed to probe dimensions: {}", e)))?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))
    }

    fn counting_tokenizer(model: &TextEmbedding) -> Result<Tokenizer, EmbeddingError> {
        let mut tokenizer = model.tokenizer.clone();
        tokenizer.with_truncation(None).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to configure tokenizer: {}", e))
        })?;
        tokenizer.with_padding(None);
        Ok(tokenizer)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TextEmbedding>, EmbeddingError> {
        self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self.lock()?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self.lock()?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
    }

    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        self.tokenizer
            .encode(text, false)
            .map(|encoding| encoding.len())
            .map_err(|e| EmbeddingError::TokenizationFailed(e.to_string()))
    }
}

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}+#]+").expect("word pattern is valid"));

pub const HASHING_DIMENSIONS: usize = 384;

/// Feature-hashing encoder over lowercase word unigrams and bigrams.
/// Output vectors are L2-normalized; empty input yields the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HASHING_DIMENSIONS)
    }
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        WORD.find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let index = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let tokens = Self::tokens(text);
        let mut vector = vec![0.0f32; self.dimensions];

        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            vector.iter_mut().for_each(|x| *x /= norm);
        }

        Ok(vector)
    }

    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        Ok(Self::tokens(text).len())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}
