//! Error types shared across memecore

use std::path::PathBuf;
use thiserror::Error;

/// Why a background or gallery image could not be turned into pixels.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server answered {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported image reference: {0}")]
    UnsupportedScheme(String),
    #[error("malformed data URI")]
    InvalidDataUri,
    #[error("image did not load within {0:?}")]
    TimedOut(std::time::Duration),
    #[error("image loader stopped before finishing")]
    WorkerLost,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("background failed to load: {0}")]
    Load(#[from] LoadError),
    #[error("could not encode PNG: {0}")]
    Encode(image::ImageError),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable font for meme text")]
    NoFont,
    #[error("background is {0}x{1}, too large to draw on")]
    Surface(u32, u32),
    #[error("export worker stopped before finishing")]
    WorkerLost,
}

/// Failures talking to the hosted identity / storage service.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no backend configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
