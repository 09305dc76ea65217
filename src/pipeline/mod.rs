pub mod image;
pub mod text;

pub use image::ImageClassifier;
pub use text::TextClassifier;

use crate::error::{Error, Result};
use candle_core::{pickle, Device};
use std::collections::HashMap;
use std::path::Path;

/// Artifact names under the `ml-models/` storage prefix.
pub const SENTIMENT_ARTIFACT: &str = "tinybert-sentiment-analysis";
pub const DISASTER_ARTIFACT: &str = "tinybert-disaster-tweet";
pub const POSE_ARTIFACT: &str = "vit-human-pose-classification";

pub const ALL_ARTIFACTS: [&str; 3] = [SENTIMENT_ARTIFACT, DISASTER_ARTIFACT, POSE_ARTIFACT];

/// One classified element: the winning label and its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

/// Text classification over a batch of raw strings; one prediction per input
/// element, index-aligned.
pub trait TextPipeline: Send + Sync {
    fn predict(&self, texts: &[String]) -> Result<Vec<Prediction>>;
}

/// Image classification over one encoded image; returns the full confidence
/// ranking, best first. Callers decide how much of the ranking to surface.
pub trait ImagePipeline: Send + Sync {
    fn predict(&self, image: &[u8]) -> Result<Vec<Prediction>>;
}

pub fn parse_device(device_str: &str) -> Result<Device> {
    match device_str {
        "cpu" => Ok(Device::Cpu),
        s if s.starts_with("cuda") => {
            let parts: Vec<&str> = s.split(':').collect();
            let ordinal = if parts.len() > 1 {
                parts[1]
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidInput(format!("Invalid CUDA device: {}", s)))?
            } else {
                0
            };
            Device::new_cuda(ordinal).map_err(|e| {
                Error::ConfigError(format!("Failed to initialize CUDA device: {}", e))
            })
        }
        _ => Err(Error::InvalidInput(format!(
            "Unknown device: {}",
            device_str
        ))),
    }
}

/// Read the label map out of a checkpoint's config.json: `id2label` keyed by
/// stringified index, returned as an index-ordered vector.
pub(crate) fn labels_from_config(config_json: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct LabelConfig {
        id2label: HashMap<String, String>,
    }

    let parsed: LabelConfig = serde_json::from_str(config_json)
        .map_err(|e| Error::ModelLoadFailed(format!("Missing id2label in config: {}", e)))?;

    let mut labels = vec![String::new(); parsed.id2label.len()];
    for (index, label) in parsed.id2label {
        let index: usize = index
            .parse()
            .map_err(|_| Error::ModelLoadFailed(format!("Bad id2label index: {}", index)))?;
        if index >= labels.len() {
            return Err(Error::ModelLoadFailed(format!(
                "id2label index {} out of range",
                index
            )));
        }
        labels[index] = label;
    }

    Ok(labels)
}

/// Locate the weights file for a model directory, converting
/// pytorch_model.bin to model.safetensors once if needed.
pub(crate) fn weights_file(model_dir: &Path) -> Result<std::path::PathBuf> {
    let safetensors_file = model_dir.join("model.safetensors");
    if safetensors_file.exists() {
        return Ok(safetensors_file);
    }

    let pytorch_file = model_dir.join("pytorch_model.bin");
    if !pytorch_file.exists() {
        return Err(Error::ModelLoadFailed(format!(
            "No weights file in {:?}",
            model_dir
        )));
    }

    tracing::info!("Converting pytorch_model.bin to model.safetensors...");

    let tensors_vec = pickle::read_all(&pytorch_file)
        .map_err(|e| Error::ModelLoadFailed(format!("Failed to read PyTorch file: {}", e)))?;
    let tensors: HashMap<_, _> = tensors_vec.into_iter().collect();

    candle_core::safetensors::save(&tensors, &safetensors_file)
        .map_err(|e| Error::ModelLoadFailed(format!("Failed to save SafeTensors: {}", e)))?;

    if let Err(e) = std::fs::remove_file(&pytorch_file) {
        tracing::warn!("Could not remove pytorch_model.bin: {}", e);
    }

    Ok(safetensors_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_device_cpu() {
        assert!(matches!(parse_device("cpu").unwrap(), Device::Cpu));
    }

    #[test]
    fn parse_device_rejects_unknown() {
        assert!(parse_device("tpu").is_err());
        assert!(parse_device("cuda:x").is_err());
    }

    #[test]
    fn labels_ordered_by_index() {
        let config = r#"{"id2label": {"1": "POSITIVE", "0": "NEGATIVE"}, "hidden_size": 312}"#;
        let labels = labels_from_config(config).unwrap();
        assert_eq!(labels, vec!["NEGATIVE".to_string(), "POSITIVE".to_string()]);
    }

    #[test]
    fn labels_missing_map_is_an_error() {
        assert!(labels_from_config(r#"{"hidden_size": 312}"#).is_err());
    }

    #[test]
    fn labels_out_of_range_index_is_an_error() {
        assert!(labels_from_config(r#"{"id2label": {"5": "X"}}"#).is_err());
    }
}
