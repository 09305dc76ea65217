use crate::error::{Error, Result};
use crate::pipeline::{labels_from_config, weights_file, ImagePipeline, Prediction};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::vit;
use std::path::Path;

const IMAGE_SIZE: usize = 224;

/// ViT image classifier with the checkpoint's classification head.
pub struct ImageClassifier {
    model: vit::Model,
    labels: Vec<String>,
    device: Device,
}

impl ImageClassifier {
    pub fn load(model_dir: &Path, device: Device) -> Result<Self> {
        tracing::info!("Loading image classifier from: {:?}", model_dir);

        let config_content = std::fs::read_to_string(model_dir.join("config.json"))
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to read config: {}", e)))?;
        let labels = labels_from_config(&config_content)?;

        let weights = weights_file(model_dir)?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)
                .map_err(|e| Error::ModelLoadFailed(format!("Failed to load weights: {}", e)))?
        };

        let config = vit::Config::vit_base_patch16_224();
        let model = vit::Model::new(&config, labels.len(), vb)
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to build model: {}", e)))?;

        tracing::info!("Image classifier loaded ({} labels)", labels.len());

        Ok(Self {
            model,
            labels,
            device,
        })
    }
}

impl ImagePipeline for ImageClassifier {
    fn predict(&self, image: &[u8]) -> Result<Vec<Prediction>> {
        let input = preprocess(image)?.to_device(&self.device)?.unsqueeze(0)?;
        let logits = self.model.forward(&input)?;
        let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        let mut ranked: Vec<Prediction> = probabilities
            .into_iter()
            .enumerate()
            .map(|(index, score)| Prediction {
                label: self.labels[index].clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(ranked)
    }
}

/// Decode, resize to 224x224 and normalize with the ViT image-processor
/// convention (mean 0.5, std 0.5 per channel), CHW layout.
fn preprocess(bytes: &[u8]) -> Result<Tensor> {
    let img = image::load_from_memory(bytes)?
        .resize_to_fill(
            IMAGE_SIZE as u32,
            IMAGE_SIZE as u32,
            image::imageops::FilterType::Triangle,
        )
        .to_rgb8();
    let data = Tensor::from_vec(img.into_raw(), (IMAGE_SIZE, IMAGE_SIZE, 3), &Device::Cpu)?
        .permute((2, 0, 1))?;
    let mean = Tensor::new(&[0.5f32, 0.5, 0.5], &Device::Cpu)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&[0.5f32, 0.5, 0.5], &Device::Cpu)?.reshape((3, 1, 1))?;
    let normalized = (data.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)?;
    Ok(normalized)
}
