use crate::models::training::TrainingExample;
use crate::services::adapter::{AdapterError, EmbeddedPair, TrainingParams, TrainingReport};
use crate::services::matcher::{MatchError, MatchModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;

pub const REQUIRED_COLUMNS: [&str; 3] = ["resume_text", "job_desc", "label"];

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("CSV must have columns: resume_text, job_desc, label")]
    MissingColumns,
    #[error("Invalid label {value:?} on row {row}")]
    InvalidLabel { row: usize, value: String },
    #[error("CSV contains no training rows")]
    EmptyDataset,
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Model(#[from] MatchError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("Training task failed: {0}")]
    Task(String),
}

/// Parses a labelled CSV. Extra columns are ignored; rows are numbered from 1
/// after the header.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<TrainingExample>, TrainingError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let (resume_idx, job_idx, label_idx) = match (
        position(REQUIRED_COLUMNS[0]),
        position(REQUIRED_COLUMNS[1]),
        position(REQUIRED_COLUMNS[2]),
    ) {
        (Some(r), Some(j), Some(l)) => (r, j, l),
        _ => return Err(TrainingError::MissingColumns),
    };

    let mut examples = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 1;
        let field = |i: usize| record.get(i).unwrap_or("").to_string();

        let raw_label = field(label_idx);
        let label = raw_label
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|l| l.is_finite())
            .ok_or_else(|| TrainingError::InvalidLabel {
                row,
                value: raw_label.clone(),
            })?;

        examples.push(TrainingExample {
            resume_text: field(resume_idx),
            job_desc: field(job_idx),
            label,
        });
    }

    if examples.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    Ok(examples)
}

/// Fine-tunes the live model's adapter and persists it.
pub struct TrainingService {
    model: Arc<MatchModel>,
    model_dir: PathBuf,
    params: TrainingParams,
}

impl TrainingService {
    pub fn new(model: Arc<MatchModel>, model_dir: PathBuf, params: TrainingParams) -> Self {
        Self {
            model,
            model_dir,
            params,
        }
    }

    pub fn model_dir(&self) -> &PathBuf {
        &self.model_dir
    }

    pub async fn train_csv(&self, bytes: &[u8]) -> Result<TrainingReport, TrainingError> {
        let examples = parse_csv(bytes)?;
        self.train(examples).await
    }

    pub async fn train(
        &self,
        examples: Vec<TrainingExample>,
    ) -> Result<TrainingReport, TrainingError> {
        if examples.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let model = Arc::clone(&self.model);
        let model_dir = self.model_dir.clone();
        let params = self.params;

        tracing::info!(examples = examples.len(), "Fine-tuning started");

        let report = tokio::task::spawn_blocking(move || -> Result<TrainingReport, TrainingError> {
            let pairs = examples
                .iter()
                .map(|ex| {
                    Ok((
                        model.encode(&ex.resume_text)?,
                        model.encode(&ex.job_desc)?,
                        ex.label,
                    ))
                })
                .collect::<Result<Vec<EmbeddedPair>, MatchError>>()?;

            let mut adapter = model.adapter()?;
            let mut rng = StdRng::from_entropy();
            let report = adapter.fit(&pairs, &params, &mut rng)?;

            adapter.save(&model_dir)?;
            model.replace_adapter(adapter)?;
            Ok(report)
        })
        .await
        .map_err(|e| TrainingError::Task(e.to_string()))??;

        tracing::info!(
            steps = report.steps,
            initial_loss = report.initial_loss,
            final_loss = report.final_loss,
            path = %self.model_dir.display(),
            "Model fine-tuned and saved"
        );

        Ok(report)
    }
}
