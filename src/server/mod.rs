pub mod handlers;
pub mod types;

#[cfg(test)]
mod tests;

pub use types::AppState;

use crate::error::{Error, Result};
use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let (status, message) = match self {
			Error::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
			Error::ModelNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
			_ => {
				// Everything past the validation boundary is surfaced
				// undifferentiated; the detail goes to the log.
				tracing::error!("Request failed: {}", self);
				(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
			}
		};

		let body = Json(serde_json::json!({
			"error": message,
		}));

		(status, body).into_response()
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/", get(handlers::root))
		.route("/api/v1/sentiment_analysis", post(handlers::sentiment_analysis))
		.route("/api/v1/disaster_classifier", post(handlers::disaster_classifier))
		.route("/api/v1/pose_classifier", post(handlers::pose_classifier))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> Result<()> {
	let app = create_router(state);
	let addr = format!("{}:{}", host, port);

	tracing::info!("Starting server on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.map_err(|e| Error::ConfigError(format!("Failed to bind to {}: {}", addr, e)))?;

	axum::serve(listener, app)
		.await
		.map_err(|e| Error::ConfigError(format!("Server error: {}", e)))?;

	Ok(())
}
