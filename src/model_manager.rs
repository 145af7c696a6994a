use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::BuiltinModel;

/// Bounded wait for each remote artifact fetch. The hosting service imposes
/// no limit of its own, so the client enforces one.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download timed out after {0:?}")]
    TimedOut(Duration),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Downloads and caches model artifacts (the model blob and its class
/// metadata), verifying SHA-256 digests on both sides of the disk.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("BITEGUARD_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("biteguard").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("biteguard").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("biteguard").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        let info = model.get_model_info();
        self.models_dir.join(info.name).join("model.onnx")
    }

    pub fn get_metadata_path(&self, model: BuiltinModel) -> PathBuf {
        let info = model.get_model_info();
        self.models_dir.join(info.name).join("metadata.json")
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        let model_path = self.get_model_path(model);
        let metadata_path = self.get_metadata_path(model);
        log::debug!(
            "artifact presence: model {:?} (exists: {}), metadata {:?} (exists: {})",
            model_path,
            model_path.exists(),
            metadata_path,
            metadata_path.exists()
        );
        model_path.exists() && metadata_path.exists()
    }

    /// Downloads both artifacts, verifying digests. Existing files that
    /// still verify are kept; anything stale is replaced. On any failure the
    /// partial download is removed so the cache never holds a half-model.
    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Preparing model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(model);
        let model_result = self
            .refresh_artifact(&info.model_url(), &model_path, &info.model_hash, "model")
            .await;

        let metadata_path = self.get_metadata_path(model);
        let metadata_result = self
            .refresh_artifact(
                &info.metadata_url(),
                &metadata_path,
                &info.metadata_hash,
                "metadata",
            )
            .await;

        match (model_result, metadata_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and metadata ready to use");
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                log::error!("Failed to set up model artifacts: {}", e);
                let _ = self.remove_download(model);
                Err(e)
            }
        }
    }

    async fn refresh_artifact(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ModelError> {
        if path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file_type, path);
            if self.verify_file(path, expected_hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file_type);
        }
        self.download_and_verify_file(url, path, expected_hash, file_type)
            .await
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());
        log::debug!("verify {:?}: calculated {}, expected {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let info = model.get_model_info();
        let model_path = self.get_model_path(model);
        let metadata_path = self.get_metadata_path(model);

        if !model_path.exists() || !metadata_path.exists() {
            log::info!("One or both artifacts do not exist");
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, &info.model_hash)?;
        let metadata_ok = self.verify_file(&metadata_path, &info.metadata_hash)?;
        log::info!(
            "Verification results: model {}, metadata {}",
            model_ok,
            metadata_ok
        );
        Ok(model_ok && metadata_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        let response = client.get(url).send().await.map_err(Self::classify_fetch_error)?;
        log::info!("Download response status: {}", response.status());
        let bytes = response
            .error_for_status()
            .map_err(ModelError::DownloadError)?
            .bytes()
            .await
            .map_err(Self::classify_fetch_error)?;
        log::info!("Downloaded {} bytes", bytes.len());

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());

        if hash != expected_hash {
            log::error!(
                "{} hash mismatch: expected {}, got {}",
                file_type,
                expected_hash,
                hash
            );
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;

        // Verify after writing
        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    fn classify_fetch_error(err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::TimedOut(DOWNLOAD_TIMEOUT)
        } else {
            ModelError::DownloadError(err)
        }
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let model_path = self.get_model_path(model);
        let metadata_path = self.get_metadata_path(model);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if metadata_path.exists() {
            fs::remove_file(&metadata_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        if !self.is_model_downloaded(model) {
            log::info!("Model not found, downloading...");
            self.download_model(model).await?;
        } else if !self.verify_model(model)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(model)?;
            self.download_model(model).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths_share_the_model_dir() {
        let manager = ModelManager::new("/tmp/biteguard-test-cache/models").unwrap();
        let model_path = manager.get_model_path(BuiltinModel::BiteNetV1);
        let metadata_path = manager.get_metadata_path(BuiltinModel::BiteNetV1);
        assert_eq!(model_path.parent(), metadata_path.parent());
        assert!(model_path.ends_with("bitenet-v1/model.onnx"));
        assert!(metadata_path.ends_with("bitenet-v1/metadata.json"));
    }

    #[test]
    fn test_fresh_cache_reports_not_downloaded() {
        let dir = env::temp_dir().join("biteguard-empty-cache-test");
        let _ = fs::remove_dir_all(&dir);
        let manager = ModelManager::new(&dir).unwrap();
        assert!(!manager.is_model_downloaded(BuiltinModel::BiteNetV1));
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    #[ignore = "requires network access to the model host"]
    async fn test_model_download() -> Result<(), ModelError> {
        let manager = ModelManager::new("/tmp/biteguard-download-test/models").unwrap();
        let model = BuiltinModel::BiteNetV1;
        manager.remove_download(model)?;
        assert!(!manager.is_model_downloaded(model));
        manager.download_model(model).await?;
        assert!(manager.is_model_downloaded(model));
        Ok(())
    }
}
