use std::sync::Arc;

use image::DynamicImage;
use log::debug;

use super::backend::InferenceBackend;
use super::error::ClassifierError;
use super::image::validate_surface;
use crate::models::ModelCharacteristics;
use crate::resolver::Prediction;

/// An image classifier over a fixed bite-type vocabulary.
///
/// Thread-safe: the backend is shared behind an `Arc` and inference takes
/// `&self`, so a classifier can be cloned into an `Arc` and used from
/// multiple tasks. Construction goes through [`ClassifierBuilder`], which
/// guarantees a loaded, validated model; a `BiteClassifier` in hand is
/// always ready to predict.
#[derive(Clone)]
pub struct BiteClassifier {
    pub model_path: String,
    pub metadata_path: String,
    backend: Arc<dyn InferenceBackend>,
    pub characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<BiteClassifier>();
    }
};

impl BiteClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    pub(crate) fn from_parts(
        model_path: String,
        metadata_path: String,
        backend: Arc<dyn InferenceBackend>,
        characteristics: ModelCharacteristics,
    ) -> Self {
        Self {
            model_path,
            metadata_path,
            backend,
            characteristics,
        }
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            metadata_path: self.metadata_path.clone(),
            num_classes: self.backend.class_labels().len(),
            class_labels: self.backend.class_labels().to_vec(),
            input_size: self.characteristics.input_size,
        }
    }

    /// Classifies an image surface.
    ///
    /// Returns one prediction per class in the model's vocabulary, in the
    /// model's output order (unranked; see `resolver::resolve` for ranking).
    /// Does not mutate any shared state.
    pub fn predict_image(&self, image: &DynamicImage) -> Result<Vec<Prediction>, ClassifierError> {
        validate_surface(image)?;
        debug!(
            "classifying {}x{} surface over {} classes",
            image.width(),
            image.height(),
            self.backend.class_labels().len()
        );
        self.backend.infer(image)
    }
}
