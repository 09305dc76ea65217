use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = ".fetch-manifest.toml";

/// Written only after every object under a model prefix has been downloaded.
/// A model directory without a readable manifest is treated as absent, so an
/// interrupted fetch is re-fetched instead of silently served incomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchManifest {
    pub model_name: String,
    pub fetched_at: String,
    pub files: Vec<String>,
}

impl FetchManifest {
    pub fn new(model_name: &str, files: Vec<String>) -> Self {
        Self {
            model_name: model_name.to_string(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            files,
        }
    }

    pub fn path(model_dir: &Path) -> PathBuf {
        model_dir.join(MANIFEST_FILE)
    }

    pub fn load(model_dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(Self::path(model_dir))?;
        let manifest: FetchManifest = toml::from_str(&content)?;
        Ok(manifest)
    }

    pub fn save(&self, model_dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(Self::path(model_dir), content)?;
        Ok(())
    }

    /// True when the directory holds a manifest naming at least one file and
    /// every listed file is still on disk.
    pub fn is_complete(model_dir: &Path) -> bool {
        match Self::load(model_dir) {
            Ok(manifest) => {
                !manifest.files.is_empty()
                    && manifest
                        .files
                        .iter()
                        .all(|file| model_dir.join(file).exists())
            }
            Err(_) => false,
        }
    }
}
