use std::future::Future;
use std::sync::Arc;

use image::DynamicImage;
use log::info;
use tokio::sync::OnceCell;

use crate::classifier::{BiteClassifier, ClassifierError};
use crate::model_manager::ModelManager;
use crate::models::BuiltinModel;
use crate::resolver::Prediction;
use crate::runtime::RuntimeConfig;

/// Holds the process-wide model handle with a typed loaded/not-loaded state.
///
/// The handle is written exactly once, by the first successful [`load`],
/// and is read-only afterwards; repeated loads are no-ops that reuse the
/// stored classifier without touching the network. Predictions requested
/// before a successful load fail fast with
/// [`ClassifierError::ModelNotLoaded`] rather than blocking. A failed load
/// leaves the context unloaded; the caller decides whether to retry by
/// calling [`load`] again.
///
/// [`load`]: ModelContext::load
pub struct ModelContext {
    model: BuiltinModel,
    runtime_config: RuntimeConfig,
    slot: OnceCell<Arc<BiteClassifier>>,
}

impl ModelContext {
    pub fn new(model: BuiltinModel) -> Self {
        Self::with_runtime_config(model, RuntimeConfig::default())
    }

    pub fn with_runtime_config(model: BuiltinModel, runtime_config: RuntimeConfig) -> Self {
        Self {
            model,
            runtime_config,
            slot: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.initialized()
    }

    /// Acquires the model: downloads (or verifies) the remote artifacts and
    /// builds the classifier. Idempotent — once a load has succeeded,
    /// further calls return immediately with the same handle and perform no
    /// network fetch.
    pub async fn load(&self) -> Result<(), ClassifierError> {
        let model = self.model;
        let runtime_config = self.runtime_config.clone();
        self.load_with(|| async move {
            let manager = ModelManager::new_default().map_err(|e| {
                ClassifierError::ModelLoadFailed(format!("failed to create model manager: {}", e))
            })?;
            manager.ensure_model_downloaded(model).await?;
            BiteClassifier::builder()
                .with_runtime_config(runtime_config)
                .with_model(model)?
                .build()
        })
        .await
    }

    /// Like [`Self::load`], with a caller-supplied initializer. The
    /// initializer runs only when the context is not yet loaded.
    pub async fn load_with<F, Fut>(&self, init: F) -> Result<(), ClassifierError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BiteClassifier, ClassifierError>>,
    {
        self.slot
            .get_or_try_init(|| async {
                let classifier = init().await?;
                info!(
                    "model loaded: {} classes from {}",
                    classifier.info().num_classes,
                    classifier.model_path
                );
                Ok(Arc::new(classifier))
            })
            .await
            .map(|_| ())
    }

    /// The loaded classifier, or `ModelNotLoaded` before a successful load.
    pub fn classifier(&self) -> Result<&Arc<BiteClassifier>, ClassifierError> {
        self.slot.get().ok_or(ClassifierError::ModelNotLoaded)
    }

    /// Classifies an image with the loaded model. Fails fast with
    /// `ModelNotLoaded` when the load has not completed; never returns an
    /// empty prediction list in that case.
    pub fn predict_image(&self, image: &DynamicImage) -> Result<Vec<Prediction>, ClassifierError> {
        self.classifier()?.predict_image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[tokio::test]
    async fn test_predict_before_load_fails_fast() {
        let context = ModelContext::new(BuiltinModel::BiteNetV1);
        assert!(!context.is_loaded());
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3])));
        match context.predict_image(&image) {
            Err(ClassifierError::ModelNotLoaded) => {}
            other => panic!("expected ModelNotLoaded, got {:?}", other.map(|p| p.len())),
        }
    }

    #[tokio::test]
    async fn test_failed_load_leaves_context_unloaded() {
        let context = ModelContext::new(BuiltinModel::BiteNetV1);
        let result = context
            .load_with(|| async {
                Err(ClassifierError::ModelLoadFailed("synthetic failure".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(!context.is_loaded());
        assert!(matches!(
            context.classifier(),
            Err(ClassifierError::ModelNotLoaded)
        ));
    }
}
