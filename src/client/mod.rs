//! Form-driven client for a running mlserve API.

use crate::config::Config;
use crate::error::Result;
use crate::storage::ObjectStore;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use serde_json::{json, Value};
use std::path::PathBuf;

pub const SENTIMENT_ENDPOINT: &str = "sentiment_analysis";
pub const DISASTER_ENDPOINT: &str = "disaster_classifier";
pub const POSE_ENDPOINT: &str = "pose_classifier";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST a request body to an endpoint and hand back the status and raw
    /// response body, uninterpreted.
    pub async fn predict(&self, endpoint: &str, body: &Value) -> Result<(u16, String)> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }
}

pub fn text_payload(text: &str, user_id: &str) -> Value {
    json!({"text": [text], "user_id": user_id})
}

pub fn image_payload(url: &str, user_id: &str) -> Value {
    json!({"url": [url], "user_id": user_id})
}

/// One interaction: pick a model, collect its fields, post, print the raw
/// response. Local images are pushed to object storage first and the signed
/// URL becomes the request payload.
pub async fn run_form(config: &Config) -> Result<()> {
    let theme = ColorfulTheme::default();
    let models = ["Sentiment Classifier", "Disaster Classifier", "Pose Classifier"];
    let choice = Select::with_theme(&theme)
        .with_prompt("Select Model")
        .items(&models)
        .default(0)
        .interact()?;

    let (endpoint, payload) = match choice {
        0 | 1 => {
            let prompt = if choice == 0 {
                "Enter your movie review"
            } else {
                "Enter your tweet"
            };
            let text: String = Input::with_theme(&theme).with_prompt(prompt).interact_text()?;
            let user_id = prompt_user_id(&theme)?;
            let endpoint = if choice == 0 {
                SENTIMENT_ENDPOINT
            } else {
                DISASTER_ENDPOINT
            };
            (endpoint, text_payload(&text, &user_id))
        }
        _ => {
            let sources = ["Local", "URL"];
            let source = Select::with_theme(&theme)
                .with_prompt("Select the image source")
                .items(&sources)
                .default(0)
                .interact()?;

            let url = if source == 1 {
                let raw: String = Input::with_theme(&theme)
                    .with_prompt("Enter your image URL")
                    .interact_text()?;
                url::Url::parse(&raw)?.to_string()
            } else {
                let path: String = Input::with_theme(&theme)
                    .with_prompt("Path of the image to upload")
                    .interact_text()?;
                let store = ObjectStore::connect(config.bucket.clone()).await;
                store
                    .upload_image(&PathBuf::from(path), &config.image_prefix, None)
                    .await?
            };
            let user_id = prompt_user_id(&theme)?;
            (POSE_ENDPOINT, image_payload(&url, &user_id))
        }
    };

    let client = ApiClient::new(&config.api_url);
    println!("Predicting... please wait");
    let (status, body) = client.predict(endpoint, &payload).await?;
    println!("HTTP {}", status);
    println!("{}", body);

    Ok(())
}

fn prompt_user_id(theme: &ColorfulTheme) -> Result<String> {
    Ok(Input::with_theme(theme)
        .with_prompt("Enter user id")
        .default("email@email.com".to_string())
        .interact_text()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_matches_the_api_shape() {
        let payload = text_payload("I love this movie", "a@b.com");
        assert_eq!(payload["text"][0], "I love this movie");
        assert_eq!(payload["user_id"], "a@b.com");
        assert!(payload["text"].is_array());
    }

    #[test]
    fn image_payload_matches_the_api_shape() {
        let payload = image_payload("https://example.com/a.jpg", "a@b.com");
        assert_eq!(payload["url"][0], "https://example.com/a.jpg");
        assert_eq!(payload["user_id"], "a@b.com");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://127.0.0.1:8000/api/v1/");
        assert_eq!(client.base_url, "http://127.0.0.1:8000/api/v1");
    }
}
