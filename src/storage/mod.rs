pub mod manifest;

pub use manifest::FetchManifest;

use crate::error::{Error, Result};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MODEL_PREFIX: &str = "ml-models";
pub const SIGNED_URL_EXPIRY: Duration = Duration::from_secs(3600);

/// S3-backed artifact store: model downloads in, user images out.
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    pub async fn connect(bucket: String) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&aws_config),
            bucket,
        }
    }

    /// Ensure the artifact directory for `model_name` exists under `models_dir`
    /// and is complete, downloading every object under `ml-models/<model_name>`
    /// if it is not. Returns the local model directory.
    ///
    /// Storage errors propagate; nothing is retried.
    pub async fn sync_model(&self, models_dir: &Path, model_name: &str) -> Result<PathBuf> {
        let model_dir = models_dir.join(model_name);

        if FetchManifest::is_complete(&model_dir) {
            tracing::debug!("Artifacts for '{}' already present", model_name);
            return Ok(model_dir);
        }

        // Trailing slash keeps sibling artifacts whose names merely extend
        // this one (e.g. "<name>-v2") out of the listing.
        let prefix = format!("{}/{}/", MODEL_PREFIX, model_name);
        tracing::info!("Fetching '{}' from s3://{}/{}", model_name, self.bucket, prefix);

        std::fs::create_dir_all(&model_dir)?;

        let mut fetched = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| Error::StorageError(e.to_string()))?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let Some(rel) = relative_key(key, &prefix) else { continue };

                let local_file = model_dir.join(rel);
                if let Some(parent) = local_file.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                tracing::debug!("Downloading {}", key);
                let response = self
                    .client
                    .get_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| Error::StorageError(e.to_string()))?;
                let bytes = response
                    .body
                    .collect()
                    .await
                    .map_err(|e| Error::StorageError(e.to_string()))?
                    .into_bytes();
                std::fs::write(&local_file, &bytes)?;

                fetched.push(rel.to_string());
            }
        }

        if fetched.is_empty() {
            return Err(Error::ModelNotFound(format!(
                "no objects under s3://{}/{}/{}",
                self.bucket, MODEL_PREFIX, model_name
            )));
        }

        FetchManifest::new(model_name, fetched).save(&model_dir)?;
        tracing::info!("Fetched '{}' into {:?}", model_name, model_dir);

        Ok(model_dir)
    }

    /// Upload a local image under `<prefix>/<object_name>` and return a signed
    /// GET URL valid for one hour. The object name defaults to the file's base
    /// name.
    pub async fn upload_image(
        &self,
        file: &Path,
        prefix: &str,
        object_name: Option<&str>,
    ) -> Result<String> {
        let object_name = match object_name {
            Some(name) => name.to_string(),
            None => file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::InvalidInput(format!("Invalid file path: {:?}", file)))?
                .to_string(),
        };
        let key = format!("{}/{}", prefix, object_name);

        let body = ByteStream::from_path(file)
            .await
            .map_err(|e| Error::StorageError(e.to_string()))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::StorageError(e.to_string()))?;

        tracing::info!("Uploaded {:?} to s3://{}/{}", file, self.bucket, key);

        let presigning = PresigningConfig::expires_in(SIGNED_URL_EXPIRY)
            .map_err(|e| Error::StorageError(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::StorageError(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// Strip the remote prefix off a key, yielding the path relative to the model
/// directory. Keys outside the prefix (or the prefix itself) yield `None`.
fn relative_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let rel = key.strip_prefix(prefix)?.trim_start_matches('/');
    if rel.is_empty() {
        None
    } else {
        Some(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_key_flattens_prefix() {
        assert_eq!(
            relative_key("ml-models/tinybert-disaster-tweet/config.json", "ml-models/tinybert-disaster-tweet"),
            Some("config.json")
        );
    }

    #[test]
    fn relative_key_keeps_nested_structure() {
        assert_eq!(
            relative_key("ml-models/m/onnx/encoder.onnx", "ml-models/m"),
            Some("onnx/encoder.onnx")
        );
    }

    #[test]
    fn relative_key_rejects_foreign_and_bare_keys() {
        assert_eq!(relative_key("ml-images/photo.jpg", "ml-models/m"), None);
        assert_eq!(relative_key("ml-models/m", "ml-models/m"), None);
        assert_eq!(relative_key("ml-models/m/", "ml-models/m"), None);
    }

    #[test]
    fn slash_terminated_prefix_excludes_sibling_artifacts() {
        // The listing prefix ends in '/', so "<name>-v2" keys never match.
        assert_eq!(
            relative_key("ml-models/m-v2/config.json", "ml-models/m/"),
            None
        );
        assert_eq!(
            relative_key("ml-models/m/config.json", "ml-models/m/"),
            Some("config.json")
        );
    }

    #[tokio::test]
    async fn sync_model_returns_without_the_network_when_complete() {
        let models_dir =
            std::env::temp_dir().join(format!("mlserve-sync-{}", std::process::id()));
        let model_dir = models_dir.join("tinybert-sentiment-analysis");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("config.json"), b"{}").unwrap();
        FetchManifest::new("tinybert-sentiment-analysis", vec!["config.json".into()])
            .save(&model_dir)
            .unwrap();

        // A bucket that does not exist: any listing attempt would fail, so an
        // Ok here proves the early return was taken.
        let store = ObjectStore::connect("mlserve-no-such-bucket".to_string()).await;
        let synced = store
            .sync_model(&models_dir, "tinybert-sentiment-analysis")
            .await
            .unwrap();
        assert_eq!(synced, model_dir);

        std::fs::remove_dir_all(&models_dir).unwrap();
    }
}
