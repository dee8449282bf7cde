//! Turning an `ImageSource` into pixels
//!
//! Loads run on a worker thread and report through a channel, so the UI can
//! poll without blocking and a load that never finishes turns into
//! `LoadError::TimedOut` instead of hanging the caller.

use image::DynamicImage;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::LoadError;
use crate::source::ImageSource;

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Fallback when a requested timeout cannot be represented as a deadline.
const MAX_DEADLINE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Fetches the bytes behind a network URL.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(request_timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .user_agent(concat!("slowmeme/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default HTTP client: {}", e);
                reqwest::blocking::Client::new()
            });
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_TIMEOUT)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| LoadError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Http(status.as_u16()));
        }
        let bytes = resp.bytes().map_err(|e| LoadError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Load and decode synchronously.
pub fn load_image(source: &ImageSource, fetcher: &dyn Fetcher) -> Result<DynamicImage, LoadError> {
    let bytes = match source {
        ImageSource::EmbeddedData { bytes, .. } => return Ok(image::load_from_memory(bytes)?),
        ImageSource::Url(url) => {
            if let Some(path) = file_url_path(url) {
                std::fs::read(path)?
            } else if url.starts_with("http://") || url.starts_with("https://") {
                fetcher.fetch(url)?
            } else if url.starts_with("data:") {
                return load_image(&ImageSource::parse(url)?, fetcher);
            } else {
                return Err(LoadError::UnsupportedScheme(url.clone()));
            }
        }
    };
    let img = image::load_from_memory(&bytes)?;
    log::debug!("loaded {}x{} image from {:?}", img.width(), img.height(), source);
    Ok(img)
}

fn file_url_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("file://")?;
    // file://localhost/path and file:///path both name /path
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    Some(PathBuf::from(rest))
}

/// A load in flight.
pub struct PendingLoad {
    rx: Receiver<Result<DynamicImage, LoadError>>,
    deadline: Instant,
    timeout: Duration,
}

impl PendingLoad {
    /// `None` while the load is still running.
    pub fn poll(&self) -> Option<Result<DynamicImage, LoadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) if Instant::now() >= self.deadline => {
                Some(Err(LoadError::TimedOut(self.timeout)))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::WorkerLost)),
        }
    }

    /// Block until the load finishes or the deadline passes.
    pub fn wait(self) -> Result<DynamicImage, LoadError> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match self.rx.recv_timeout(remaining) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(LoadError::TimedOut(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(LoadError::WorkerLost),
        }
    }
}

/// Load on a worker thread.
pub fn spawn_load(source: ImageSource, fetcher: Arc<dyn Fetcher>, timeout: Duration) -> PendingLoad {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = load_image(&source, fetcher.as_ref());
        if let Err(ref e) = result {
            log::warn!("image load failed for {:?}: {}", source, e);
        }
        // Receiver may have given up already
        let _ = tx.send(result);
    });
    PendingLoad {
        rx,
        deadline: deadline_after(timeout),
        timeout,
    }
}

/// `now + timeout`, saturating instead of overflowing `Instant`.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(MAX_DEADLINE))
        .unwrap_or(now)
}
