use std::fmt;

/// Represents the different types of errors that can occur while loading the
/// model or classifying images.
#[derive(Debug)]
pub enum ClassifierError {
    /// The inference runtime is not available in this environment
    ModelUnavailable(String),
    /// Fetching or parsing the remote model artifacts failed
    ModelLoadFailed(String),
    /// A prediction was attempted before the model finished loading
    ModelNotLoaded,
    /// The model failed while running a prediction
    InferenceFailed(String),
    /// A bounded wait on the model fetch expired
    TimedOut(String),
    /// The supplied image could not be decoded or prepared
    ImageError(String),
    /// Invalid input parameters or analysis state
    ValidationError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelUnavailable(msg) => write!(f, "Inference runtime unavailable: {}", msg),
            Self::ModelLoadFailed(msg) => write!(f, "Model load failed: {}", msg),
            Self::ModelNotLoaded => write!(f, "Model not loaded"),
            Self::InferenceFailed(msg) => write!(f, "Inference failed: {}", msg),
            Self::TimedOut(msg) => write!(f, "Timed out: {}", msg),
            Self::ImageError(msg) => write!(f, "Image error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<crate::model_manager::ModelError> for ClassifierError {
    fn from(err: crate::model_manager::ModelError) -> Self {
        match err {
            crate::model_manager::ModelError::TimedOut(_) => {
                ClassifierError::TimedOut(err.to_string())
            }
            other => ClassifierError::ModelLoadFailed(other.to_string()),
        }
    }
}
