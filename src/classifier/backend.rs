use std::collections::HashMap;

use image::DynamicImage;
use log::debug;
use ndarray::s;
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::image::to_model_input;
use crate::models::ModelCharacteristics;
use crate::resolver::Prediction;

/// The seam between the classifier and a concrete inference vendor.
///
/// A backend owns a fixed class vocabulary and produces one prediction per
/// vocabulary entry for each image it is given. Implementations must be
/// side-effect-free beyond the inference call itself, so backends are
/// interchangeable: the bundled ONNX adapter, a remote service, or a canned
/// stand-in for tests all satisfy the same contract.
pub trait InferenceBackend: Send + Sync {
    /// The model's class vocabulary, in output order.
    fn class_labels(&self) -> &[String];

    /// Runs one inference over the image surface.
    ///
    /// Returns one `Prediction` per vocabulary class. Probabilities are the
    /// model's own outputs; they are expected, but not guaranteed, to sum to
    /// approximately 1.0.
    fn infer(&self, image: &DynamicImage) -> Result<Vec<Prediction>, ClassifierError>;
}

/// ONNX Runtime adapter behind [`InferenceBackend`].
pub struct OrtBackend {
    session: Session,
    labels: Vec<String>,
    characteristics: ModelCharacteristics,
}

impl OrtBackend {
    pub(crate) fn new(
        session: Session,
        labels: Vec<String>,
        characteristics: ModelCharacteristics,
    ) -> Self {
        Self {
            session,
            labels,
            characteristics,
        }
    }
}

impl InferenceBackend for OrtBackend {
    fn class_labels(&self) -> &[String] {
        &self.labels
    }

    fn infer(&self, image: &DynamicImage) -> Result<Vec<Prediction>, ClassifierError> {
        let input = to_model_input(image, self.characteristics.input_size)?;
        let input_dyn = input.into_dyn();
        let input_view = input_dyn.as_standard_layout();

        let input_name = self
            .session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| {
                ClassifierError::InferenceFailed("model declares no input tensor".into())
            })?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            input_name.as_str(),
            Tensor::from_array(&input_view).map_err(|e| {
                ClassifierError::InferenceFailed(format!("failed to create input tensor: {}", e))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::InferenceFailed(format!("model run failed: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::InferenceFailed(format!("failed to extract output tensor: {}", e))
        })?;

        let scores = output_tensor.slice(s![0, ..]);
        if scores.len() != self.labels.len() {
            return Err(ClassifierError::InferenceFailed(format!(
                "model produced {} scores for a vocabulary of {}",
                scores.len(),
                self.labels.len()
            )));
        }

        let predictions: Vec<Prediction> = self
            .labels
            .iter()
            .zip(scores.iter())
            .map(|(label, &probability)| Prediction::new(label.clone(), probability))
            .collect();
        debug!("inference produced {} class scores", predictions.len());
        Ok(predictions)
    }
}
