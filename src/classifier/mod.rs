mod backend;
mod builder;
mod classifier;
mod error;
mod image;

pub use backend::{InferenceBackend, OrtBackend};
pub use builder::ClassifierBuilder;
pub use classifier::BiteClassifier;
pub use error::ClassifierError;
pub use image::load_image;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the class-metadata file
    pub metadata_path: String,
    /// Number of classes in the model's vocabulary
    pub num_classes: usize,
    /// Labels of the classes, in output order
    pub class_labels: Vec<String>,
    /// Edge length of the square model input, in pixels
    pub input_size: usize,
}
