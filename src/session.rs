use std::future::Future;
use std::time::Duration;

use image::DynamicImage;
use log::{info, warn};
use tokio::time::Instant;

use crate::classifier::{BiteClassifier, ClassifierError};
use crate::context::ModelContext;
use crate::knowledge::KnowledgeBase;
use crate::models::BuiltinModel;
use crate::resolver::{resolve, Resolution};

/// Where an analysis session currently is.
///
/// `Loading` covers model acquisition; `Idle` means ready for an image;
/// `Analyzing` is one in-flight inference; `Success` carries the latest
/// resolution; `Error` is terminal — the only way out is re-initializing,
/// which re-runs the model load from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    Loading,
    Idle,
    Analyzing,
    Success,
    Error,
}

/// Session tuning knobs.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Minimum perceived analysis duration. When inference finishes faster,
    /// the session waits out the remainder before reporting success. Off by
    /// default.
    pub min_analysis_latency: Option<Duration>,
}

/// Drives the capture-to-guidance pipeline as a state machine.
///
/// One inference and one resolution are in flight at a time; the session is
/// cooperative and single-consumer. There is no cancellation primitive for
/// a running analysis — callers await its outcome or drop the session.
pub struct AnalysisSession {
    context: ModelContext,
    kb: &'static KnowledgeBase,
    config: SessionConfig,
    status: AnalysisStatus,
    last_resolution: Option<Resolution>,
}

impl AnalysisSession {
    pub fn new(model: BuiltinModel) -> Self {
        Self::with_config(model, SessionConfig::default())
    }

    pub fn with_config(model: BuiltinModel, config: SessionConfig) -> Self {
        Self {
            context: ModelContext::new(model),
            kb: KnowledgeBase::builtin(),
            config,
            status: AnalysisStatus::Loading,
            last_resolution: None,
        }
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    /// Resolution of the most recent successful analysis, if any.
    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.last_resolution.as_ref()
    }

    /// Loads the model, entering `Idle` on success and `Error` on failure.
    /// Safe to call again after a failure; a completed load is reused.
    pub async fn initialize(&mut self) -> Result<(), ClassifierError> {
        self.status = AnalysisStatus::Loading;
        match self.context.load().await {
            Ok(()) => {
                self.status = AnalysisStatus::Idle;
                Ok(())
            }
            Err(e) => {
                warn!("model load failed: {}", e);
                self.status = AnalysisStatus::Error;
                Err(e)
            }
        }
    }

    /// Like [`Self::initialize`], with a caller-supplied model initializer
    /// (custom artifacts, alternate backends).
    pub async fn initialize_with<F, Fut>(&mut self, init: F) -> Result<(), ClassifierError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BiteClassifier, ClassifierError>>,
    {
        self.status = AnalysisStatus::Loading;
        match self.context.load_with(init).await {
            Ok(()) => {
                self.status = AnalysisStatus::Idle;
                Ok(())
            }
            Err(e) => {
                warn!("model load failed: {}", e);
                self.status = AnalysisStatus::Error;
                Err(e)
            }
        }
    }

    /// Runs one analysis over the supplied image.
    ///
    /// Permitted from `Idle` and `Success` only. A load or inference
    /// failure moves the session to the terminal `Error` state; further
    /// analyses are refused until the session is re-initialized.
    pub async fn analyze(&mut self, image: &DynamicImage) -> Result<&Resolution, ClassifierError> {
        match self.status {
            AnalysisStatus::Idle | AnalysisStatus::Success => {}
            AnalysisStatus::Loading => return Err(ClassifierError::ModelNotLoaded),
            AnalysisStatus::Analyzing => {
                return Err(ClassifierError::ValidationError(
                    "an analysis is already in flight".to_string(),
                ));
            }
            AnalysisStatus::Error => {
                return Err(ClassifierError::ValidationError(
                    "session is in the error state; re-initialize to recover".to_string(),
                ));
            }
        }

        self.status = AnalysisStatus::Analyzing;
        let started = Instant::now();
        match self.context.predict_image(image) {
            Ok(predictions) => {
                if let Some(min) = self.config.min_analysis_latency {
                    let elapsed = started.elapsed();
                    if elapsed < min {
                        tokio::time::sleep(min - elapsed).await;
                    }
                }
                let resolution = resolve(&predictions, self.kb);
                info!(
                    "analysis resolved to '{}' (high confidence: {})",
                    resolution.name(),
                    resolution.is_high_confidence()
                );
                self.status = AnalysisStatus::Success;
                Ok(self.last_resolution.insert(resolution))
            }
            Err(e) => {
                warn!("analysis failed: {}", e);
                self.status = AnalysisStatus::Error;
                self.last_resolution = None;
                Err(e)
            }
        }
    }
}
