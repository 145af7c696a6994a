use serde::Deserialize;

/// Models bundled with the crate, hosted remotely and downloaded on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// Default insect-bite classifier. Eight bite classes plus background,
    /// 224x224 RGB input, probabilities out.
    BiteNetV1,
}

/// Remote artifact descriptor for a hosted model.
///
/// A model is published as two artifacts under a fixed base URL: the opaque
/// model blob (`model.onnx`) and the class-metadata descriptor
/// (`metadata.json`). The metadata schema is owned by the hosting service;
/// only `labels` is read here.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub base_url: String,
    pub model_hash: String,
    pub metadata_hash: String,
}

impl ModelInfo {
    /// URL of the model blob under `base_url`.
    pub fn model_url(&self) -> String {
        format!("{}model.onnx", normalized_base(&self.base_url))
    }

    /// URL of the class-metadata descriptor under `base_url`.
    pub fn metadata_url(&self) -> String {
        format!("{}metadata.json", normalized_base(&self.base_url))
    }
}

// Hosted bases are published with and without a trailing slash; normalize so
// artifact paths always resolve to the same files.
fn normalized_base(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

/// Static characteristics of a model's input surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Edge length of the square input image, in pixels.
    pub input_size: usize,
    /// Approximate size of the model blob on disk.
    pub model_size_mb: usize,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::BiteNetV1 => ModelInfo {
                name: "bitenet-v1".to_string(),
                base_url: "https://huggingface.co/biteguard/bitenet-v1/resolve/main/".to_string(),
                model_hash: "4c8a1f0d9b2e7a6153c4d8f0b7e2a9c1d5f3e8b06a7c2d914e5f8a0b3c6d7e21".to_string(),
                metadata_hash: "9e2d7c4b1a8f35060d9c2e7b4a1f8d3c6e0b5a92d7f41c8e3b6a0d5f2c9e7b18".to_string(),
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::BiteNetV1 => ModelCharacteristics {
                input_size: 224,
                model_size_mb: 9,
            },
        }
    }
}

/// Class-metadata descriptor published next to the model blob.
///
/// Parsed leniently: unknown fields are ignored so the hosting service can
/// evolve the schema without breaking deployed clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    /// Class vocabulary, in the model's output order.
    pub labels: Vec<String>,
    /// Display name chosen by the model author, if any.
    #[serde(default)]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_normalizes_trailing_slash() {
        let with_slash = ModelInfo {
            name: "m".into(),
            base_url: "https://example.com/models/m/".into(),
            model_hash: String::new(),
            metadata_hash: String::new(),
        };
        let without_slash = ModelInfo {
            base_url: "https://example.com/models/m".into(),
            ..with_slash.clone()
        };
        assert_eq!(with_slash.model_url(), without_slash.model_url());
        assert!(with_slash.metadata_url().ends_with("/m/metadata.json"));
    }

    #[test]
    fn test_metadata_ignores_unknown_fields() {
        let raw = r#"{
            "tmVersion": "2.4",
            "modelName": "bitenet",
            "labels": ["Mosquito Bite", "Tick"],
            "timeStamp": "2024-11-02T10:00:00Z"
        }"#;
        let meta: ModelMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(meta.labels.len(), 2);
        assert_eq!(meta.model_name.as_deref(), Some("bitenet"));
    }

    #[test]
    fn test_builtin_model_info() {
        let info = BuiltinModel::BiteNetV1.get_model_info();
        assert_eq!(info.name, "bitenet-v1");
        assert!(info.model_url().starts_with("https://"));
        assert_eq!(BuiltinModel::BiteNetV1.characteristics().input_size, 224);
    }
}
