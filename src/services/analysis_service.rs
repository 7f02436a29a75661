use crate::models::analysis::{AnalysisResult, UploadedResume};
use crate::models::job::JobPosting;
use crate::services::matcher::{MatchError, MatchModel};
use crate::services::pdf::{self, PdfError};
use crate::services::sections::{missing_skills, ResumeSections};
use crate::services::summarizer::{Summarizer, SummaryError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Model(#[from] MatchError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
    #[error("Analysis task failed: {0}")]
    Task(String),
}

/// Scores uploaded resumes against a job posting.
pub struct AnalysisService {
    model: Arc<MatchModel>,
    summarizer: Arc<dyn Summarizer>,
}

struct Scored {
    match_percentage: i64,
    tokens_used: usize,
}

impl AnalysisService {
    pub fn new(model: Arc<MatchModel>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { model, summarizer }
    }

    /// One result per file, in upload order. A file that fails is reported
    /// in its own result and does not stop the rest of the batch.
    pub async fn analyze(&self, job: &JobPosting, files: Vec<UploadedResume>) -> Vec<AnalysisResult> {
        let mut results = Vec::with_capacity(files.len());

        for file in files {
            let filename = file.filename.clone();
            match self.analyze_file(job, file).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(filename = %filename, "Resume analysis failed: {}", e);
                    results.push(AnalysisResult::failed(filename, e));
                }
            }
        }

        results
    }

    async fn analyze_file(
        &self,
        job: &JobPosting,
        file: UploadedResume,
    ) -> Result<AnalysisResult, AnalysisError> {
        let text = pdf::extract_text(&file.bytes)?;
        self.analyze_text(job, &file.filename, &text).await
    }

    /// Scores already-extracted resume text.
    pub async fn analyze_text(
        &self,
        job: &JobPosting,
        filename: &str,
        text: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let model = Arc::clone(&self.model);
        let posting = job.clone();
        let resume_text = text.to_string();

        let scored = tokio::task::spawn_blocking(move || -> Result<Scored, MatchError> {
            let tokens_used = model.embedder().count_tokens(&resume_text).map_err(MatchError::from)?;
            let sections = ResumeSections::from_text(&resume_text);
            let match_percentage = model.section_score(&sections, &posting)?;
            Ok(Scored {
                match_percentage,
                tokens_used,
            })
        })
        .await
        .map_err(|e| AnalysisError::Task(e.to_string()))??;

        let summary = self
            .summarizer
            .summarize(text, &job.combined_text())
            .await?;

        tracing::info!(
            filename,
            match_percentage = scored.match_percentage,
            tokens_used = scored.tokens_used,
            "Analyzed resume"
        );

        Ok(AnalysisResult {
            filename: filename.to_string(),
            match_percentage: scored.match_percentage,
            summary,
            tokens_used: scored.tokens_used,
            missing_skills: missing_skills(job, text),
        })
    }
}
