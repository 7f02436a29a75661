use crate::models::job::{JobField, JobPosting};
use crate::services::adapter::{Adapter, AdapterError};
use crate::services::embedding::{Embedder, EmbeddingError};
use crate::services::sections::ResumeSections;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Texts are cut to this many characters before encoding.
pub const MAX_ENCODE_CHARS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("Model state is unavailable")]
    Poisoned,
}

/// The process-wide matching model: a frozen encoder plus the current adapter.
pub struct MatchModel {
    embedder: Arc<dyn Embedder>,
    adapter: RwLock<Adapter>,
}

impl MatchModel {
    pub fn new(embedder: Arc<dyn Embedder>, adapter: Adapter) -> Self {
        Self {
            embedder,
            adapter: RwLock::new(adapter),
        }
    }

    /// Uses the fine-tuned adapter in `model_dir` when it was trained on this
    /// encoder, otherwise starts from the identity adapter.
    pub fn load(embedder: Arc<dyn Embedder>, model_dir: &Path) -> Self {
        let identity = Adapter::identity(embedder.model_name(), embedder.dimensions());

        let adapter = match Adapter::load(model_dir) {
            Ok(Some(adapter))
                if adapter.base_model == embedder.model_name()
                    && adapter.dimensions() == embedder.dimensions() =>
            {
                tracing::info!(
                    path = %model_dir.display(),
                    examples = adapter.trained_examples,
                    "Loading fine-tuned model"
                );
                adapter
            }
            Ok(Some(adapter)) => {
                tracing::warn!(
                    saved_for = %adapter.base_model,
                    current = embedder.model_name(),
                    "Fine-tuned adapter does not match the encoder; using base model"
                );
                identity
            }
            Ok(None) => {
                tracing::info!(model = embedder.model_name(), "Loading base model");
                identity
            }
            Err(e) => {
                tracing::warn!("Failed to read fine-tuned adapter: {}; using base model", e);
                identity
            }
        };

        Self::new(embedder, adapter)
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn adapter(&self) -> Result<Adapter, MatchError> {
        self.adapter
            .read()
            .map(|adapter| adapter.clone())
            .map_err(|_| MatchError::Poisoned)
    }

    pub fn is_fine_tuned(&self) -> bool {
        self.adapter
            .read()
            .map(|adapter| adapter.is_fine_tuned())
            .unwrap_or(false)
    }

    pub fn replace_adapter(&self, adapter: Adapter) -> Result<(), MatchError> {
        let mut current = self.adapter.write().map_err(|_| MatchError::Poisoned)?;
        *current = adapter;
        Ok(())
    }

    /// Raw encoder output for `text` after truncation.
    pub fn encode(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        Ok(self.embedder.embed(truncate_chars(text, MAX_ENCODE_CHARS))?)
    }

    /// Adapted cosine similarity of two texts.
    pub fn similarity(&self, a: &str, b: &str) -> Result<f32, MatchError> {
        let ea = self.encode(a)?;
        let eb = self.encode(b)?;
        let adapter = self.adapter.read().map_err(|_| MatchError::Poisoned)?;
        Ok(adapter.similarity(&ea, &eb)?)
    }

    /// Adapted similarity of each candidate to `query`, in candidate order.
    pub fn similarities(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, MatchError> {
        let query_embedding = self.encode(query)?;
        let truncated: Vec<String> = candidates
            .iter()
            .map(|c| truncate_chars(c, MAX_ENCODE_CHARS).to_string())
            .collect();
        let embeddings = self.embedder.embed_batch(&truncated)?;

        let adapter = self.adapter.read().map_err(|_| MatchError::Poisoned)?;
        embeddings
            .iter()
            .map(|e| Ok(adapter.similarity(&query_embedding, e)?))
            .collect()
    }

    /// Mean field-by-field similarity as a whole percentage. Fields empty on
    /// either side are skipped; no comparable field scores 0.
    pub fn section_score(
        &self,
        resume: &ResumeSections,
        job: &JobPosting,
    ) -> Result<i64, MatchError> {
        let mut scores = Vec::with_capacity(JobField::ALL.len());

        for field in JobField::ALL {
            let resume_part = resume.get(field);
            let job_part = job.field(field);
            if resume_part.is_empty() || job_part.is_empty() {
                continue;
            }
            let score = self.similarity(resume_part, job_part)?;
            tracing::debug!(field = field.as_str(), score, "Section similarity");
            scores.push(score);
        }

        Ok(to_percentage(&scores))
    }
}

fn to_percentage(scores: &[f32]) -> i64 {
    if scores.is_empty() {
        return 0;
    }
    let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64;
    (mean * 100.0).round_ties_even() as i64
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedding::HashingEmbedder;

    fn job() -> JobPosting {
        JobPosting {
            skills: "Rust, PostgreSQL".to_string(),
            experience: "Five years building backend services".to_string(),
            education: "Computer Science degree".to_string(),
            tools: "Docker, Git".to_string(),
            description: "Backend engineer for payments".to_string(),
        }
    }

    fn model() -> MatchModel {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let adapter = Adapter::identity(embedder.model_name(), embedder.dimensions());
        MatchModel::new(embedder, adapter)
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn percentage_rounds_half_to_even() {
        assert_eq!(to_percentage(&[]), 0);
        assert_eq!(to_percentage(&[0.125, 0.125]), 12);
        assert_eq!(to_percentage(&[1.0]), 100);
    }

    #[test]
    fn identical_sections_score_one_hundred() {
        let model = model();
        let posting = job();
        let resume_text = "Skills: Rust, PostgreSQL\nExperience: Five years building backend services\nEducation: Computer Science degree\nTools: Docker, Git\nDescription: Backend engineer for payments";
        let sections = ResumeSections::from_text(resume_text);

        assert_eq!(model.section_score(&sections, &posting).unwrap(), 100);
    }

    #[test]
    fn unrelated_resume_scores_lower() {
        let model = model();
        let posting = job();
        let related = ResumeSections::from_text(
            "Skills: Rust and PostgreSQL\nExperience: backend services for five years",
        );
        let unrelated = ResumeSections::from_text("Pastry chef. Croissants and baguettes.");

        let related_score = model.section_score(&related, &posting).unwrap();
        let unrelated_score = model.section_score(&unrelated, &posting).unwrap();
        assert!(related_score > unrelated_score);
    }

    #[test]
    fn empty_resume_scores_zero() {
        let model = model();
        let sections = ResumeSections::from_text("");
        assert_eq!(model.section_score(&sections, &job()).unwrap(), 0);
    }

    #[test]
    fn mismatched_saved_adapter_falls_back_to_identity() {
        let dir = tempfile::tempdir().unwrap();
        let mut saved = Adapter::identity("some-other-model", 8);
        saved.trained_examples = 5;
        saved.save(dir.path()).unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let model = MatchModel::load(embedder, dir.path());
        assert!(!model.is_fine_tuned());
    }

    #[test]
    fn compatible_saved_adapter_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let mut saved = Adapter::identity(embedder.model_name(), embedder.dimensions());
        saved.trained_examples = 5;
        saved.save(dir.path()).unwrap();

        let model = MatchModel::load(embedder, dir.path());
        assert!(model.is_fine_tuned());
    }
}
