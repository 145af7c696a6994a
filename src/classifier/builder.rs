use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use ort::session::Session;

use super::backend::{InferenceBackend, OrtBackend};
use super::classifier::BiteClassifier;
use super::error::ClassifierError;
use crate::model_manager::ModelManager;
use crate::models::{BuiltinModel, ModelCharacteristics, ModelMetadata};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Input edge assumed for custom models that don't state one.
const DEFAULT_INPUT_SIZE: usize = 224;

/// A builder for constructing a [`BiteClassifier`] with a fluent interface.
///
/// Exactly one model source must be configured: a builtin model
/// ([`Self::with_model`]), explicit artifact paths
/// ([`Self::with_custom_model`]), or an injected backend
/// ([`Self::with_backend`]).
#[derive(Default)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    metadata_path: Option<String>,
    backend: Option<Arc<dyn InferenceBackend>>,
    characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Configures a built-in model. The artifacts must already be downloaded
    /// (see [`ModelManager::download_model`]); the builder itself never
    /// fetches.
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        self.ensure_unconfigured()?;

        let manager = ModelManager::new_default().map_err(|e| {
            ClassifierError::ModelLoadFailed(format!("failed to create model manager: {}", e))
        })?;

        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::ModelLoadFailed(format!(
                "model '{:?}' is not downloaded; fetch it first with ModelManager::download_model()",
                model
            )));
        }

        let model_path = manager.get_model_path(model);
        let metadata_path = manager.get_metadata_path(model);
        let metadata = load_metadata(&metadata_path)?;
        validate_labels(&metadata.labels)?;
        info!(
            "metadata loaded: {} classes{}",
            metadata.labels.len(),
            metadata
                .model_name
                .as_deref()
                .map(|n| format!(" ({})", n))
                .unwrap_or_default()
        );

        let session = self.open_session(&model_path)?;
        let characteristics = model.characteristics();

        self.backend = Some(Arc::new(OrtBackend::new(
            session,
            metadata.labels,
            characteristics.clone(),
        )));
        self.characteristics = Some(characteristics);
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.metadata_path = Some(metadata_path.to_string_lossy().to_string());
        Ok(self)
    }

    /// Configures a model from explicit artifact paths.
    ///
    /// `input_size` is the square input edge the model expects; when omitted
    /// the default of 224 is assumed.
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        metadata_path: &str,
        input_size: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || metadata_path.is_empty() {
            return Err(ClassifierError::ValidationError(
                "model and metadata paths cannot be empty".to_string(),
            ));
        }
        self.ensure_unconfigured()?;

        if !Path::new(model_path).exists() {
            return Err(ClassifierError::ModelLoadFailed(format!(
                "model file not found: {}",
                model_path
            )));
        }
        if !Path::new(metadata_path).exists() {
            return Err(ClassifierError::ModelLoadFailed(format!(
                "metadata file not found: {}",
                metadata_path
            )));
        }

        let metadata = load_metadata(Path::new(metadata_path))?;
        validate_labels(&metadata.labels)?;

        let session = self.open_session(Path::new(model_path))?;
        let characteristics = ModelCharacteristics {
            input_size: input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            model_size_mb: 0, // Not critical for functionality
        };

        self.backend = Some(Arc::new(OrtBackend::new(
            session,
            metadata.labels,
            characteristics.clone(),
        )));
        self.characteristics = Some(characteristics);
        self.model_path = Some(model_path.to_string());
        self.metadata_path = Some(metadata_path.to_string());
        Ok(self)
    }

    /// Injects a prebuilt inference backend.
    ///
    /// This is the seam for alternate vendors and for tests; no artifacts
    /// are touched.
    pub fn with_backend(
        mut self,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self, ClassifierError> {
        self.ensure_unconfigured()?;
        self.backend = Some(backend);
        Ok(self)
    }

    /// Builds and returns the final [`BiteClassifier`] instance.
    pub fn build(self) -> Result<BiteClassifier, ClassifierError> {
        let backend = self.backend.ok_or_else(|| {
            ClassifierError::ValidationError("no model source configured".to_string())
        })?;
        validate_labels(backend.class_labels())?;

        Ok(BiteClassifier::from_parts(
            self.model_path.unwrap_or_else(|| "<in-memory>".to_string()),
            self.metadata_path
                .unwrap_or_else(|| "<in-memory>".to_string()),
            backend,
            self.characteristics.unwrap_or(ModelCharacteristics {
                input_size: DEFAULT_INPUT_SIZE,
                model_size_mb: 0,
            }),
        ))
    }

    fn ensure_unconfigured(&self) -> Result<(), ClassifierError> {
        if self.backend.is_some() {
            return Err(ClassifierError::ValidationError(
                "model source already configured".to_string(),
            ));
        }
        Ok(())
    }

    fn open_session(&self, model_path: &Path) -> Result<Session, ClassifierError> {
        // Environment init failing means the inference runtime itself is
        // missing or unusable, distinct from a bad artifact.
        let builder = create_session_builder(&self.runtime_config).map_err(|e| {
            error!("ONNX Runtime environment unavailable: {}", e);
            ClassifierError::ModelUnavailable(e.to_string())
        })?;
        let session = builder.commit_from_file(model_path).map_err(|e| {
            error!("failed to load model from {:?}: {}", model_path, e);
            ClassifierError::ModelLoadFailed(format!("failed to load model: {}", e))
        })?;
        validate_model(&session)?;
        info!("model structure validated successfully");
        Ok(session)
    }
}

/// Validates that the model declares an input for the image tensor and an
/// output for the class scores.
fn validate_model(session: &Session) -> Result<(), ClassifierError> {
    if session.inputs.is_empty() {
        return Err(ClassifierError::ModelLoadFailed(
            "model must declare an input tensor for the image".to_string(),
        ));
    }
    if session.outputs.is_empty() {
        return Err(ClassifierError::ModelLoadFailed(
            "model must declare an output tensor for class scores".to_string(),
        ));
    }
    Ok(())
}

fn load_metadata(path: &Path) -> Result<ModelMetadata, ClassifierError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        ClassifierError::ModelLoadFailed(format!("failed to read metadata {:?}: {}", path, e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        ClassifierError::ModelLoadFailed(format!("failed to parse metadata {:?}: {}", path, e))
    })
}

/// Label rules: at least one class, no empty labels.
fn validate_labels(labels: &[String]) -> Result<(), ClassifierError> {
    if labels.is_empty() {
        return Err(ClassifierError::ValidationError(
            "model vocabulary is empty".to_string(),
        ));
    }
    if let Some(pos) = labels.iter().position(|l| l.is_empty()) {
        return Err(ClassifierError::ValidationError(format!(
            "label {} is empty",
            pos + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_source_fails() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_custom_model_rejects_empty_paths() {
        let result = ClassifierBuilder::new().with_custom_model("", "", None);
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_custom_model_rejects_missing_files() {
        let result = ClassifierBuilder::new().with_custom_model(
            "/nonexistent/model.onnx",
            "/nonexistent/metadata.json",
            None,
        );
        assert!(matches!(result, Err(ClassifierError::ModelLoadFailed(_))));
    }

    #[test]
    fn test_label_validation() {
        assert!(validate_labels(&[]).is_err());
        assert!(validate_labels(&["Tick".to_string(), String::new()]).is_err());
        assert!(validate_labels(&["Tick".to_string()]).is_ok());
    }
}
