use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Proxmox API returned HTTP {status} for {url}")]
    Api { status: u16, url: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FleetError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        FleetError::Io { path: path.to_path_buf(), source }
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
