pub mod analysis_handlers;
pub mod model_handlers;
pub mod system_handlers;

pub use analysis_handlers::analyze_resume_handler;
pub use model_handlers::{push_model_handler, train_handler};
pub use system_handlers::health_handler;
