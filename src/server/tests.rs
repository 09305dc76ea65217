use crate::error::{Error, Result};
use crate::pipeline::{ImagePipeline, Prediction, TextPipeline};
use crate::server::types::AppState;
use crate::server::{create_router, handlers};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `app.oneshot()`

struct StubText {
    label: &'static str,
}

impl TextPipeline for StubText {
    fn predict(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        Ok(texts
            .iter()
            .map(|_| Prediction {
                label: self.label.to_string(),
                score: 0.98,
            })
            .collect())
    }
}

struct FailingText;

impl TextPipeline for FailingText {
    fn predict(&self, _texts: &[String]) -> Result<Vec<Prediction>> {
        Err(Error::ModelLoadFailed("weights corrupted".to_string()))
    }
}

/// Ranked list per image; only rank 0 should ever reach a response.
struct StubImage;

impl ImagePipeline for StubImage {
    fn predict(&self, _image: &[u8]) -> Result<Vec<Prediction>> {
        Ok(vec![
            Prediction {
                label: "standing".to_string(),
                score: 0.7,
            },
            Prediction {
                label: "sitting".to_string(),
                score: 0.2,
            },
            Prediction {
                label: "lying".to_string(),
                score: 0.1,
            },
        ])
    }
}

fn stub_state() -> AppState {
    AppState::new(
        Arc::new(StubText { label: "POSITIVE" }),
        Arc::new(StubText { label: "disaster" }),
        Arc::new(StubImage),
    )
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve fixed bytes on an ephemeral port so pose tests never leave localhost.
async fn spawn_image_host() -> String {
    let app = Router::new().route(
        "/img.jpg",
        get(|| async { axum::body::Bytes::from_static(b"stub image bytes") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/img.jpg", addr)
}

#[tokio::test]
async fn greeting_is_fixed_and_model_independent() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], handlers::GREETING.as_bytes());
}

#[tokio::test]
async fn sentiment_output_is_index_aligned_with_input() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/sentiment_analysis",
            json!({"text": ["I love this movie", "terrible"], "user_id": "a@b.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["model_name"], "sentiment_analysis");
    assert_eq!(body["text"].as_array().unwrap().len(), 2);
    assert_eq!(body["labels"].as_array().unwrap().len(), 2);
    assert_eq!(body["scores"].as_array().unwrap().len(), 2);
    assert_eq!(body["labels"][0], "POSITIVE");
    let score = body["scores"][0].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert!(body["prediction_time"].is_u64());
}

#[tokio::test]
async fn disaster_endpoint_reports_its_own_model_name() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/disaster_classifier",
            json!({"text": ["the river is flooding"], "user_id": "a@b.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["model_name"], "tinybert_disaster_tweet");
    assert_eq!(body["labels"][0], "disaster");
}

#[tokio::test]
async fn malformed_email_is_rejected_before_the_pipeline() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/sentiment_analysis",
            json!({"text": ["hi"], "user_id": "not-an-email"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn empty_text_sequence_is_rejected() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/sentiment_analysis",
            json!({"text": [], "user_id": "a@b.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn empty_url_sequence_is_rejected() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/pose_classifier",
            json!({"url": [], "user_id": "a@b.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_field_is_rejected() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/sentiment_analysis",
            json!({"text": ["hi"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn relative_image_url_is_rejected() {
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/pose_classifier",
            json!({"url": ["images/cat.jpg"], "user_id": "a@b.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pose_surfaces_only_the_top_ranked_prediction() {
    let image_url = spawn_image_host().await;
    let app = create_router(stub_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/pose_classifier",
            json!({"url": [image_url.clone(), image_url], "user_id": "a@b.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["model_name"], "vit-human-pose-classification");
    assert_eq!(body["url"].as_array().unwrap().len(), 2);
    // One flat label per URL, never the nested ranking.
    assert_eq!(body["labels"].as_array().unwrap().len(), 2);
    assert_eq!(body["labels"][0], "standing");
    assert!(body["labels"][0].is_string());
    assert!((body["scores"][0].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn pipeline_failure_is_an_opaque_server_error() {
    let state = AppState::new(
        Arc::new(FailingText),
        Arc::new(StubText { label: "x" }),
        Arc::new(StubImage),
    );
    let app = create_router(state);

    let response = app
        .oneshot(post_json(
            "/api/v1/sentiment_analysis",
            json!({"text": ["hi"], "user_id": "a@b.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal server error");
}
