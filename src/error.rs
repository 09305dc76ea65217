use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Model not found: {0}")]
	ModelNotFound(String),

	#[error("Failed to load model: {0}")]
	ModelLoadFailed(String),

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Storage error: {0}")]
	StorageError(String),

	#[error("Configuration error: {0}")]
	ConfigError(String),

	#[error("Inference error: {0}")]
	InferenceError(#[from] candle_core::Error),

	#[error("Tokenizer error: {0}")]
	TokenizerError(String),

	#[error("Image decode error: {0}")]
	ImageError(#[from] image::ImageError),

	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("Prompt error: {0}")]
	PromptError(#[from] dialoguer::Error),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	SerializationError(String),
}

impl From<tokenizers::Error> for Error {
	fn from(err: tokenizers::Error) -> Self {
		Error::TokenizerError(err.to_string())
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::de::Error> for Error {
	fn from(err: toml::de::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::ser::Error> for Error {
	fn from(err: toml::ser::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<url::ParseError> for Error {
	fn from(err: url::ParseError) -> Self {
		Error::InvalidInput(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
