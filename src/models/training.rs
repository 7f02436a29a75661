use serde::{Deserialize, Serialize};

/// One labelled resume/job pair. `label` is the target cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub resume_text: String,
    pub job_desc: String,
    pub label: f32,
}
