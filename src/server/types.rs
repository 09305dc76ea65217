use crate::pipeline::{ImagePipeline, TextPipeline};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Immutable service context, built once at startup and cloned into every
/// handler. Pipelines are read-only; no locking.
#[derive(Clone)]
pub struct AppState {
	pub sentiment: Arc<dyn TextPipeline>,
	pub disaster: Arc<dyn TextPipeline>,
	pub pose: Arc<dyn ImagePipeline>,
	pub http: reqwest::Client,
}

impl AppState {
	pub fn new(
		sentiment: Arc<dyn TextPipeline>,
		disaster: Arc<dyn TextPipeline>,
		pose: Arc<dyn ImagePipeline>,
	) -> Self {
		Self {
			sentiment,
			disaster,
			pose,
			http: reqwest::Client::new(),
		}
	}
}

// --- DTOs ---
//
// Field-type validation happens at deserialization: EmailAddress rejects
// malformed emails, Url rejects malformed or relative URLs. The Json extractor
// surfaces those as 422 responses with per-field serde detail.

#[derive(Debug, Clone, Deserialize)]
pub struct TextRequest {
	pub text: Vec<String>,
	pub user_id: EmailAddress,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
	pub url: Vec<Url>,
	pub user_id: EmailAddress,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
	pub model_name: String,
	pub text: Vec<String>,
	pub labels: Vec<String>,
	pub scores: Vec<f32>,
	pub prediction_time: u64,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
	pub model_name: String,
	pub url: Vec<Url>,
	pub labels: Vec<String>,
	pub scores: Vec<f32>,
	pub prediction_time: u64,
}
