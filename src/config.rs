use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BUCKET: &str = "mlops-tutorial-models";
pub const DEFAULT_MODELS_DIR: &str = "ml-models";
pub const DEFAULT_IMAGE_PREFIX: &str = "ml-images";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub bucket: String,
	pub models_dir: PathBuf,
	pub image_prefix: String,
	pub api_url: String,
}

impl Config {
	pub fn from_env() -> crate::error::Result<Self> {
		let bucket =
			std::env::var("MLSERVE_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string());
		let models_dir = std::env::var("MLSERVE_MODELS_DIR")
			.map(PathBuf::from)
			.unwrap_or_else(|_| PathBuf::from(DEFAULT_MODELS_DIR));
		let api_url =
			std::env::var("MLSERVE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

		std::fs::create_dir_all(&models_dir)?;

		Ok(Self {
			bucket,
			models_dir,
			image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
			api_url,
		})
	}
}
