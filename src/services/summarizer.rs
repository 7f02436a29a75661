//! Candidate summaries.
//!
//! The default summarizer is extractive: it keeps the resume sentences that
//! sit closest to the job posting in embedding space. When an
//! OpenAI-compatible endpoint is configured, summaries are generated there
//! instead.

use crate::config::RemoteSummarizerSettings;
use crate::services::matcher::{truncate_chars, MatchError, MatchModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const SUMMARY_PROMPT: &str =
    "Summarize the candidate's resume focusing on job-relevant skills and experience:";
pub const MAX_SUMMARY_WORDS: usize = 150;
const MAX_PROMPT_CHARS: usize = 2000;
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_CANDIDATE_SENTENCES: usize = 64;
const SUMMARY_SENTENCES: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error(transparent)]
    Model(#[from] MatchError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Summarizer returned empty content")]
    EmptyContent,
    #[error("Summarizer task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, resume_text: &str, job_text: &str) -> Result<String, SummaryError>;
}

pub struct ExtractiveSummarizer {
    model: Arc<MatchModel>,
}

impl ExtractiveSummarizer {
    pub fn new(model: Arc<MatchModel>) -> Self {
        Self { model }
    }

    fn summarize_blocking(
        model: &MatchModel,
        resume_text: &str,
        job_text: &str,
    ) -> Result<String, SummaryError> {
        let candidates: Vec<String> = split_sentences(resume_text)
            .into_iter()
            .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
            .take(MAX_CANDIDATE_SENTENCES)
            .collect();

        if candidates.is_empty() {
            return Ok(limit_words(&collapse_whitespace(resume_text), MAX_SUMMARY_WORDS));
        }

        let scores = model.similarities(job_text, &candidates)?;
        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(SUMMARY_SENTENCES);
        ranked.sort_by_key(|(index, _)| *index);

        let summary = ranked
            .iter()
            .map(|(index, _)| candidates[*index].as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(limit_words(&summary, MAX_SUMMARY_WORDS))
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, resume_text: &str, job_text: &str) -> Result<String, SummaryError> {
        let model = Arc::clone(&self.model);
        let resume_text = resume_text.to_string();
        let job_text = job_text.to_string();

        tokio::task::spawn_blocking(move || {
            Self::summarize_blocking(&model, &resume_text, &job_text)
        })
        .await
        .map_err(|e| SummaryError::Task(e.to_string()))?
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Summaries from an OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct RemoteSummarizer {
    client: reqwest::Client,
    settings: RemoteSummarizerSettings,
}

impl RemoteSummarizer {
    pub fn new(settings: RemoteSummarizerSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, settings }
    }
}

#[async_trait]
impl Summarizer for RemoteSummarizer {
    async fn summarize(&self, resume_text: &str, _job_text: &str) -> Result<String, SummaryError> {
        let prompt = format!(
            "{}\n\n{}",
            SUMMARY_PROMPT,
            truncate_chars(resume_text, MAX_PROMPT_CHARS)
        );
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_SUMMARY_WORDS as u32,
            temperature: 0.0,
        };

        let mut request = self.client.post(&self.settings.url).json(&body);
        if let Some(api_key) = &self.settings.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SummaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(SummaryError::EmptyContent)
    }
}

/// Splits on sentence-ending punctuation followed by whitespace, and on line
/// breaks. Whitespace inside each sentence is collapsed.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = collapse_whitespace(current);
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
    current.clear();
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn limit_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::adapter::Adapter;
    use crate::services::embedding::{Embedder, HashingEmbedder};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model() -> Arc<MatchModel> {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let adapter = Adapter::identity(embedder.model_name(), embedder.dimensions());
        Arc::new(MatchModel::new(embedder, adapter))
    }

    #[test]
    fn sentences_split_on_punctuation_and_newlines() {
        let sentences = split_sentences("Built APIs in Rust. Led a team!\nLikes   hiking\n\nv1.2 shipped");
        assert_eq!(
            sentences,
            vec!["Built APIs in Rust.", "Led a team!", "Likes hiking", "v1.2 shipped"]
        );
    }

    #[test]
    fn word_limit_is_applied() {
        let text = "word ".repeat(200);
        assert_eq!(limit_words(&text, MAX_SUMMARY_WORDS).split(' ').count(), 150);
    }

    #[tokio::test]
    async fn extractive_summary_prefers_job_relevant_sentences() {
        let summarizer = ExtractiveSummarizer::new(model());
        let resume = "I enjoy cooking pasta on weekends with friends. \
                      Built distributed payment services in Rust and PostgreSQL. \
                      Volunteered at the local animal shelter every summer. \
                      Maintained Docker based deployment pipelines for backend services. \
                      Collects vintage postcards from many different countries.";
        let job = "Rust PostgreSQL backend services Docker deployment";

        let summary = summarizer.summarize(resume, job).await.unwrap();

        assert!(summary.contains("payment services in Rust"));
        assert!(summary.contains("Docker based deployment"));
        let payments = summary.find("payment").unwrap();
        let docker = summary.find("Docker").unwrap();
        assert!(payments < docker, "document order is preserved");
    }

    #[tokio::test]
    async fn extractive_summary_of_short_text_is_the_text() {
        let summarizer = ExtractiveSummarizer::new(model());
        let summary = summarizer.summarize("Jane Doe\nRust", "Rust").await.unwrap();
        assert_eq!(summary, "Jane Doe Rust");
    }

    #[tokio::test]
    async fn remote_summarizer_returns_first_choice() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "  Strong Rust engineer. " } }]
            })))
            .mount(&mock_server)
            .await;

        let summarizer = RemoteSummarizer::new(RemoteSummarizerSettings {
            url: format!("{}/v1/chat/completions", mock_server.uri()),
            model: "test-model".to_string(),
            api_key: Some("secret".to_string()),
        });

        let summary = summarizer.summarize("resume text", "job").await.unwrap();
        assert_eq!(summary, "Strong Rust engineer.");
    }

    #[tokio::test]
    async fn remote_summarizer_surfaces_api_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&mock_server)
            .await;

        let summarizer = RemoteSummarizer::new(RemoteSummarizerSettings {
            url: mock_server.uri(),
            model: "test-model".to_string(),
            api_key: None,
        });

        let result = summarizer.summarize("resume text", "job").await;
        assert!(matches!(result, Err(SummaryError::Api { status: 503, .. })));
    }
}
