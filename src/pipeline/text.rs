use crate::error::{Error, Result};
use crate::pipeline::{labels_from_config, weights_file, Prediction, TextPipeline};
use candle_core::{Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use std::path::Path;

/// BERT-family sequence classifier: the base encoder plus the checkpoint's
/// pooler and classification head.
pub struct TextClassifier {
    model: BertModel,
    pooler: Linear,
    classifier: Linear,
    labels: Vec<String>,
    tokenizer: tokenizers::Tokenizer,
    device: Device,
}

impl TextClassifier {
    pub fn load(model_dir: &Path, device: Device) -> Result<Self> {
        tracing::info!("Loading text classifier from: {:?}", model_dir);

        let config_content = std::fs::read_to_string(model_dir.join("config.json"))
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to read config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to parse config: {}", e)))?;
        let labels = labels_from_config(&config_content)?;

        let tokenizer = tokenizers::Tokenizer::from_file(model_dir.join("tokenizer.json"))?;

        let weights = weights_file(model_dir)?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DTYPE, &device)
                .map_err(|e| Error::ModelLoadFailed(format!("Failed to load weights: {}", e)))?
        };

        let model = BertModel::load(vb.pp("bert"), &config)
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to build encoder: {}", e)))?;
        let pooler = candle_nn::linear(config.hidden_size, config.hidden_size, vb.pp("bert.pooler.dense"))
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to build pooler: {}", e)))?;
        let classifier = candle_nn::linear(config.hidden_size, labels.len(), vb.pp("classifier"))
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to build classifier: {}", e)))?;

        tracing::info!("Text classifier loaded ({} labels)", labels.len());

        Ok(Self {
            model,
            pooler,
            classifier,
            labels,
            tokenizer,
            device,
        })
    }

    fn classify_one(&self, text: &str) -> Result<Prediction> {
        let encoding = self.tokenizer.encode(text, true)?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;

        let hidden = self.model.forward(&input_ids, &token_type_ids, None)?;
        // Classification head operates on the pooled [CLS] token.
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;
        let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        let (best, score) = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .ok_or_else(|| Error::ModelLoadFailed("Classifier produced no logits".to_string()))?;

        Ok(Prediction {
            label: self.labels[best].clone(),
            score: *score,
        })
    }
}

impl TextPipeline for TextClassifier {
    fn predict(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(texts.len());
        for text in texts {
            predictions.push(self.classify_one(text)?);
        }
        Ok(predictions)
    }
}
