pub mod analysis;
pub mod job;
pub mod training;
pub mod user;

pub use analysis::{AnalysisResult, UploadedResume};
pub use job::{JobField, JobPosting};
pub use training::TrainingExample;
pub use user::{PublicUser, User};
