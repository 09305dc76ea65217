use crate::error::{Error, Result};
use crate::pipeline::TextPipeline;
use crate::server::types::{AppState, ImageRequest, ImageResponse, TextRequest, TextResponse};
use axum::extract::State;
use axum::Json;
use std::time::Instant;

pub const GREETING: &str = "Hello world!";

pub const SENTIMENT_MODEL_NAME: &str = "sentiment_analysis";
pub const DISASTER_MODEL_NAME: &str = "tinybert_disaster_tweet";
pub const POSE_MODEL_NAME: &str = "vit-human-pose-classification";

/// Reachability probe; no side effects, independent of model state.
pub async fn root() -> &'static str {
	GREETING
}

pub async fn sentiment_analysis(
	State(state): State<AppState>,
	Json(payload): Json<TextRequest>,
) -> Result<Json<TextResponse>> {
	classify_text(state.sentiment.as_ref(), SENTIMENT_MODEL_NAME, payload)
}

pub async fn disaster_classifier(
	State(state): State<AppState>,
	Json(payload): Json<TextRequest>,
) -> Result<Json<TextResponse>> {
	classify_text(state.disaster.as_ref(), DISASTER_MODEL_NAME, payload)
}

fn classify_text(
	pipeline: &dyn TextPipeline,
	model_name: &str,
	payload: TextRequest,
) -> Result<Json<TextResponse>> {
	if payload.text.is_empty() {
		return Err(Error::InvalidInput(
			"text must contain at least one element".to_string(),
		));
	}

	let start = Instant::now();
	let predictions = pipeline.predict(&payload.text)?;
	let prediction_time = start.elapsed().as_millis() as u64;

	let (labels, scores) = predictions
		.into_iter()
		.map(|p| (p.label, p.score))
		.unzip();

	Ok(Json(TextResponse {
		model_name: model_name.to_string(),
		text: payload.text,
		labels,
		scores,
		prediction_time,
	}))
}

/// Fetches each image over HTTP and surfaces only the top-ranked label/score
/// pair per input element.
pub async fn pose_classifier(
	State(state): State<AppState>,
	Json(payload): Json<ImageRequest>,
) -> Result<Json<ImageResponse>> {
	if payload.url.is_empty() {
		return Err(Error::InvalidInput(
			"url must contain at least one element".to_string(),
		));
	}

	let start = Instant::now();
	let mut labels = Vec::with_capacity(payload.url.len());
	let mut scores = Vec::with_capacity(payload.url.len());

	for url in &payload.url {
		let bytes = state
			.http
			.get(url.clone())
			.send()
			.await?
			.error_for_status()?
			.bytes()
			.await?;
		let ranked = state.pose.predict(&bytes)?;
		let top = ranked.into_iter().next().ok_or_else(|| {
			Error::ModelLoadFailed("image pipeline produced no classes".to_string())
		})?;
		labels.push(top.label);
		scores.push(top.score);
	}

	let prediction_time = start.elapsed().as_millis() as u64;

	Ok(Json(ImageResponse {
		model_name: POSE_MODEL_NAME.to_string(),
		url: payload.url,
		labels,
		scores,
		prediction_time,
	}))
}
