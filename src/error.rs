use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Class index error: {0}")]
    ClassIndex(String),

    #[error("Artifact not found at {0} and no download URL configured")]
    MissingArtifact(PathBuf),

    #[error("Failed to download {url}: HTTP {status}")]
    Download { url: String, status: u16 },

    #[error("Crop data error: {0}")]
    CropData(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
