//! Minimal Hugging Face Hub API client: identity lookup, repository creation
//! and single-commit file uploads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("{status}: {message}")]
    Http { status: u16, message: String },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected Hub response: {0}")]
    InvalidResponse(String),
}

/// A file to place in the repository, path relative to the repo root.
#[derive(Debug, Clone)]
pub struct HubFile {
    pub path: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct WhoAmI {
    name: Option<String>,
}

#[derive(Clone)]
pub struct HubClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HubClient {
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Browser URL of a model repository.
    pub fn repo_url(&self, repo_id: &str) -> String {
        format!("{}/{}", self.endpoint, repo_id)
    }

    /// The account name the token belongs to.
    pub async fn whoami(&self, token: &str) -> Result<String, HubError> {
        let response = self
            .client
            .get(format!("{}/api/whoami-v2", self.endpoint))
            .bearer_auth(token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: WhoAmI = response.json().await?;
        body.name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| HubError::InvalidResponse("whoami response has no name".to_string()))
    }

    /// Creates a public model repository. An existing repository is not an error.
    pub async fn create_repo(&self, token: &str, name: &str) -> Result<(), HubError> {
        let response = self
            .client
            .post(format!("{}/api/repos/create", self.endpoint))
            .bearer_auth(token)
            .json(&json!({ "name": name, "type": "model", "private": false }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(repo = name, "Hub repository already exists");
            return Ok(());
        }
        ensure_success(response).await?;
        Ok(())
    }

    /// Uploads `files` to the `main` branch of `repo_id` as one commit.
    pub async fn upload_files(
        &self,
        token: &str,
        repo_id: &str,
        files: &[HubFile],
        summary: &str,
    ) -> Result<(), HubError> {
        let response = self
            .client
            .post(format!(
                "{}/api/models/{}/commit/main",
                self.endpoint, repo_id
            ))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(commit_payload(files, summary))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// NDJSON commit body: a header line followed by one line per file.
fn commit_payload(files: &[HubFile], summary: &str) -> String {
    let mut lines = Vec::with_capacity(files.len() + 1);
    lines.push(json!({
        "key": "header",
        "value": { "summary": summary, "description": "" }
    }));
    for file in files {
        lines.push(json!({
            "key": "file",
            "value": {
                "content": STANDARD.encode(&file.content),
                "path": file.path,
                "encoding": "base64"
            }
        }));
    }

    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(HubError::Http {
        status: status.as_u16(),
        message,
    })
}
