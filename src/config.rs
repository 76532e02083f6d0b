use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Application configuration. Everything lives under one data directory;
/// the two stores get separate database files so frequent progress writes
/// never queue behind payload transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_dir: base.join("podcast-progress"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Io(format!("failed to parse config: {}", e)))
    }

    pub fn content_db_path(&self) -> PathBuf {
        self.data_dir.join("podcasts.db")
    }

    pub fn progress_db_path(&self) -> PathBuf {
        self.data_dir.join("progress.db")
    }
}
