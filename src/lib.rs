//! Insect-bite photo triage: classify a bite photo with a hosted ONNX image
//! model and resolve the top prediction into first-aid guidance from a
//! built-in knowledge base.
//!
//! # Basic Usage
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use biteguard::{load_image, resolve, BuiltinModel, KnowledgeBase, ModelContext};
//!
//! let context = ModelContext::new(BuiltinModel::BiteNetV1);
//! context.load().await?;
//!
//! let image = load_image("photos/bite.jpg")?;
//! let predictions = context.predict_image(&image)?;
//! let resolution = resolve(&predictions, KnowledgeBase::builtin());
//!
//! println!("Identified: {}", resolution.name());
//! if let Some(guidance) = resolution.guidance() {
//!     for step in &guidance.treatment {
//!         println!("  - {}", step);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # State machine
//!
//! [`AnalysisSession`] drives the full flow (`loading → idle → analyzing →
//! success | error`) for callers that want the lifecycle managed for them;
//! [`ModelContext`] plus [`resolve`] is the lower-level pair. The model
//! handle is written once on first successful load and shared read-only
//! afterwards, so contexts are cheap to use from multiple tasks via `Arc`.

pub mod classifier;
pub mod context;
pub mod knowledge;
pub mod model_manager;
pub mod models;
pub mod resolver;
mod runtime;
pub mod session;

pub use classifier::{
    load_image, BiteClassifier, ClassifierBuilder, ClassifierError, ClassifierInfo,
    InferenceBackend, OrtBackend,
};
pub use context::ModelContext;
pub use knowledge::{BiteInfo, KnowledgeBase, Severity};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo, ModelMetadata};
pub use resolver::{
    resolve, ConfidenceTier, Prediction, RankedPrediction, Resolution,
    HIGH_CONFIDENCE_THRESHOLD,
};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use session::{AnalysisSession, AnalysisStatus, SessionConfig};

pub fn init_logger() {
    env_logger::init();
}
