use crate::services::adapter::{AdapterError, ADAPTER_FILE, CONFIG_FILE};
use crate::services::hub_client::{HubClient, HubError, HubFile};
use crate::services::matcher::{MatchError, MatchModel};
use sha2::{Digest, Sha256};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("HF_TOKEN environment variable not set.")]
    MissingToken,
    #[error("HuggingFace Hub error: {0}")]
    Hub(#[from] HubError),
    #[error(transparent)]
    Model(#[from] MatchError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Publishes the live model to `{user}/{model_name}` on the Hub.
pub struct PublishService {
    model: Arc<MatchModel>,
    hub: HubClient,
    model_name: String,
    token: Option<String>,
}

impl PublishService {
    pub fn new(
        model: Arc<MatchModel>,
        hub: HubClient,
        model_name: String,
        token: Option<String>,
    ) -> Self {
        Self {
            model,
            hub,
            model_name,
            token,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Uploads the adapter, its config and a model card. Returns the repository URL.
    pub async fn push(&self) -> Result<String, PublishError> {
        let token = self.token.as_deref().ok_or(PublishError::MissingToken)?;

        let username = self.hub.whoami(token).await?;
        let repo_id = format!("{}/{}", username, self.model_name);
        tracing::info!(repo = %repo_id, "Pushing model to the Hub");

        self.hub.create_repo(token, &self.model_name).await?;

        let adapter = self.model.adapter()?;
        let adapter_json = adapter.to_json()?;
        let fingerprint = hex::encode(Sha256::digest(adapter_json.as_bytes()));

        let files = vec![
            HubFile {
                path: ADAPTER_FILE.to_string(),
                content: adapter_json.into_bytes(),
            },
            HubFile {
                path: CONFIG_FILE.to_string(),
                content: adapter.config_json()?.into_bytes(),
            },
            HubFile {
                path: "README.md".to_string(),
                content: model_card(
                    &self.model_name,
                    &adapter.base_model,
                    adapter.trained_examples,
                    adapter.epochs,
                )
                .into_bytes(),
            },
        ];

        let summary = format!("Upload resume matcher adapter {}", &fingerprint[..12]);
        self.hub
            .upload_files(token, &repo_id, &files, &summary)
            .await?;

        let url = self.hub.repo_url(&repo_id);
        tracing::info!(url = %url, "Model pushed");
        Ok(url)
    }
}

fn model_card(name: &str, base_model: &str, examples: usize, epochs: usize) -> String {
    format!(
        "---\nbase_model: {base}\ntags:\n- sentence-similarity\n- resume-matching\n---\n\n\
         # {name}\n\n\
         Per-dimension similarity adapter for `{base}`, fine-tuned on {examples} labelled \
         resume/job pairs over {epochs} epochs with a cosine-similarity loss.\n\n\
         Apply `adapter.json` weights element-wise to both sentence embeddings before \
         computing cosine similarity.\n",
        base = base_model,
        name = name,
        examples = examples,
        epochs = epochs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::adapter::Adapter;
    use crate::services::embedding::{Embedder, HashingEmbedder};

    fn model() -> Arc<MatchModel> {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(8));
        let adapter = Adapter::identity(embedder.model_name(), embedder.dimensions());
        Arc::new(MatchModel::new(embedder, adapter))
    }

    #[tokio::test]
    async fn push_without_token_fails_fast() {
        let service = PublishService::new(
            model(),
            HubClient::new("http://127.0.0.1:9"),
            "resume-matcher".to_string(),
            None,
        );
        assert!(!service.has_token());
        assert!(matches!(
            service.push().await,
            Err(PublishError::MissingToken)
        ));
    }

    #[test]
    fn model_card_names_base_model() {
        let card = model_card("matcher", "all-MiniLM-L6-v2", 40, 2);
        assert!(card.contains("base_model: all-MiniLM-L6-v2"));
        assert!(card.contains("40 labelled"));
    }
}
