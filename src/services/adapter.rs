//! Fine-tunable head on top of a frozen sentence encoder.
//!
//! The adapter rescales each embedding dimension before cosine similarity.
//! Training fits those scales to labelled resume/job pairs with the
//! cosine-similarity loss `(cos(w*a, w*b) - label)^2`, so dimensions that
//! carry signal for the matching task gain weight and noisy ones fade.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ADAPTER_FILE: &str = "adapter.json";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Training data is empty")]
    EmptyDataset,
    #[error("Embedding has {actual} dimensions, adapter expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Adapter file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Adapter format error: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub warmup_steps: usize,
    pub learning_rate: f32,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 2,
            batch_size: 16,
            warmup_steps: 100,
            learning_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub examples: usize,
    pub steps: usize,
    pub initial_loss: f32,
    pub final_loss: f32,
}

/// One embedded training pair: resume embedding, job embedding, target similarity.
pub type EmbeddedPair = (Vec<f32>, Vec<f32>, f32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adapter {
    pub base_model: String,
    pub weights: Vec<f32>,
    #[serde(default)]
    pub trained_examples: usize,
    #[serde(default)]
    pub epochs: usize,
    #[serde(default)]
    pub trained_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AdapterConfig {
    base_model: String,
    dimensions: usize,
    adapter: String,
    similarity: String,
}

impl Adapter {
    /// An untrained adapter: every weight is 1, so similarity equals the base model's.
    pub fn identity(base_model: &str, dimensions: usize) -> Self {
        Self {
            base_model: base_model.to_string(),
            weights: vec![1.0; dimensions],
            trained_examples: 0,
            epochs: 0,
            trained_at: None,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.weights.len()
    }

    pub fn is_fine_tuned(&self) -> bool {
        self.trained_examples > 0
    }

    pub fn apply(&self, embedding: &[f32]) -> Result<Vec<f32>, AdapterError> {
        self.check_dimensions(embedding)?;
        Ok(embedding
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .collect())
    }

    pub fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f32, AdapterError> {
        Ok(cosine(&self.apply(a)?, &self.apply(b)?))
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<(), AdapterError> {
        if embedding.len() != self.weights.len() {
            return Err(AdapterError::DimensionMismatch {
                expected: self.weights.len(),
                actual: embedding.len(),
            });
        }
        Ok(())
    }

    /// Reads `adapter.json` from `dir`. `Ok(None)` when the directory holds no adapter.
    pub fn load(dir: &Path) -> Result<Option<Self>, AdapterError> {
        let path = dir.join(ADAPTER_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, dir: &Path) -> Result<(), AdapterError> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(ADAPTER_FILE), self.to_json()?)?;
        std::fs::write(dir.join(CONFIG_FILE), self.config_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, AdapterError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn config_json(&self) -> Result<String, AdapterError> {
        let config = AdapterConfig {
            base_model: self.base_model.clone(),
            dimensions: self.dimensions(),
            adapter: "diagonal".to_string(),
            similarity: "cosine".to_string(),
        };
        Ok(serde_json::to_string_pretty(&config)?)
    }

    /// Mean cosine-similarity loss over `pairs`.
    pub fn loss(&self, pairs: &[EmbeddedPair]) -> Result<f32, AdapterError> {
        if pairs.is_empty() {
            return Err(AdapterError::EmptyDataset);
        }
        let mut total = 0.0;
        for (a, b, label) in pairs {
            let diff = self.similarity(a, b)? - label;
            total += diff * diff;
        }
        Ok(total / pairs.len() as f32)
    }

    /// Mini-batch gradient descent on the cosine-similarity loss, continuing
    /// from the current weights. Learning rate warms up linearly over
    /// `warmup_steps`; weights are kept non-negative.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        pairs: &[EmbeddedPair],
        params: &TrainingParams,
        rng: &mut R,
    ) -> Result<TrainingReport, AdapterError> {
        if pairs.is_empty() {
            return Err(AdapterError::EmptyDataset);
        }
        for (a, b, _) in pairs {
            self.check_dimensions(a)?;
            self.check_dimensions(b)?;
        }

        let initial_loss = self.loss(pairs)?;
        let batch_size = params.batch_size.max(1);
        let mut order: Vec<usize> = (0..pairs.len()).collect();
        let mut step = 0usize;

        for epoch in 0..params.epochs {
            order.shuffle(rng);

            for batch in order.chunks(batch_size) {
                let mut gradient = vec![0.0f32; self.weights.len()];
                for &index in batch {
                    let (a, b, label) = &pairs[index];
                    self.accumulate_gradient(a, b, *label, &mut gradient);
                }

                let lr = warmup_rate(params, step) / batch.len() as f32;
                for (w, g) in self.weights.iter_mut().zip(&gradient) {
                    let updated = *w - lr * g;
                    *w = if updated.is_finite() { updated.max(0.0) } else { *w };
                }
                step += 1;
            }

            tracing::debug!(epoch = epoch + 1, step, "Adapter epoch finished");
        }

        let final_loss = self.loss(pairs)?;
        self.trained_examples += pairs.len();
        self.epochs += params.epochs;
        self.trained_at = Some(chrono::Utc::now().to_rfc3339());

        Ok(TrainingReport {
            examples: pairs.len(),
            steps: step,
            initial_loss,
            final_loss,
        })
    }

    /// Adds d/dw of `(cos(w*a, w*b) - label)^2` into `gradient`.
    fn accumulate_gradient(&self, a: &[f32], b: &[f32], label: f32, gradient: &mut [f32]) {
        let u: Vec<f32> = a.iter().zip(&self.weights).map(|(x, w)| x * w).collect();
        let v: Vec<f32> = b.iter().zip(&self.weights).map(|(x, w)| x * w).collect();

        let norm_u = l2_norm(&u);
        let norm_v = l2_norm(&v);
        if norm_u < f32::EPSILON || norm_v < f32::EPSILON {
            return;
        }

        let cos = dot(&u, &v) / (norm_u * norm_v);
        let scale = 2.0 * (cos - label);
        let inv_uv = 1.0 / (norm_u * norm_v);
        let inv_uu = 1.0 / (norm_u * norm_u);
        let inv_vv = 1.0 / (norm_v * norm_v);

        for i in 0..gradient.len() {
            let d_cos_du = v[i] * inv_uv - cos * u[i] * inv_uu;
            let d_cos_dv = u[i] * inv_uv - cos * v[i] * inv_vv;
            gradient[i] += scale * (a[i] * d_cos_du + b[i] * d_cos_dv);
        }
    }
}

fn warmup_rate(params: &TrainingParams, step: usize) -> f32 {
    if params.warmup_steps == 0 || step >= params.warmup_steps {
        params.learning_rate
    } else {
        params.learning_rate * (step + 1) as f32 / params.warmup_steps as f32
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm = l2_norm(a) * l2_norm(b);
    if norm < f32::EPSILON {
        return 0.0;
    }
    dot(a, b) / norm
}
