use serde::{Deserialize, Serialize};

/// A resume file received in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-file outcome of `/analyze_resume`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub filename: String,
    pub match_percentage: i64,
    pub summary: String,
    pub tokens_used: usize,
    pub missing_skills: Vec<String>,
}

impl AnalysisResult {
    /// Result reported for a file whose processing failed.
    pub fn failed(filename: impl Into<String>, error: impl std::fmt::Display) -> Self {
        AnalysisResult {
            filename: filename.into(),
            match_percentage: 0,
            summary: format!("Error: {}", error),
            tokens_used: 0,
            missing_skills: Vec::new(),
        }
    }
}
