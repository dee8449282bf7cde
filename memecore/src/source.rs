//! Image references: remote/local URLs or bytes the user uploaded

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::LoadError;

/// Where a background image comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `http://`, `https://` or `file://` reference.
    Url(String),
    /// Raw bytes of an uploaded file. Build with [`ImageSource::embedded`]
    /// so `digest` matches the bytes.
    EmbeddedData { mime: String, bytes: Arc<[u8]>, digest: u64 },
}

impl ImageSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Hashes the bytes once, here; `cache_key` reuses the digest.
    pub fn embedded(mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let digest = fnv1a(&bytes);
        Self::EmbeddedData { mime: mime.into(), bytes, digest }
    }

    /// Parse a textual reference. `data:` URIs become `EmbeddedData`,
    /// everything else is kept as a URL.
    pub fn parse(reference: &str) -> Result<Self, LoadError> {
        if reference.starts_with("data:") {
            decode_data_uri(reference)
        } else {
            Ok(Self::Url(reference.to_string()))
        }
    }

    /// Textual form usable wherever a URL is expected.
    pub fn to_reference(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::EmbeddedData { mime, bytes, .. } => {
                format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
            }
        }
    }

    /// Stable key for texture caches. Constant time: embedded data is keyed
    /// by its stored digest, never by rescanning the bytes.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::EmbeddedData { mime, bytes, digest } => {
                format!("embedded:{}:{}:{:016x}", mime, bytes.len(), digest)
            }
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::EmbeddedData { .. })
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::EmbeddedData { mime, bytes, .. } => f
                .debug_struct("EmbeddedData")
                .field("mime", mime)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
        (h ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn decode_data_uri(uri: &str) -> Result<ImageSource, LoadError> {
    let rest = uri.strip_prefix("data:").ok_or(LoadError::InvalidDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(LoadError::InvalidDataUri)?;
    let (mime, encoding) = match header.split_once(';') {
        Some((mime, encoding)) => (mime, Some(encoding)),
        None => (header, None),
    };
    let bytes = match encoding {
        Some("base64") => STANDARD
            .decode(payload.trim())
            .map_err(|_| LoadError::InvalidDataUri)?,
        Some(_) => return Err(LoadError::InvalidDataUri),
        None => payload.as_bytes().to_vec(),
    };
    let mime = if mime.is_empty() { "text/plain" } else { mime };
    Ok(ImageSource::embedded(mime, bytes))
}

/// A file picked by the user for upload.
#[derive(Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    /// Mime type sniffed from the content. Unknown formats are passed
    /// through untouched and fail later, at decode time.
    pub fn mime(&self) -> &'static str {
        match image::guess_format(&self.bytes) {
            Ok(format) => format.to_mime_type(),
            Err(_) => "application/octet-stream",
        }
    }

    pub fn into_source(self) -> ImageSource {
        let mime = self.mime();
        ImageSource::embedded(mime, self.bytes)
    }
}
