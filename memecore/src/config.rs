//! slowMeme settings
//!
//! Read from `config.json` in the platform config dir, then overridden by
//! `SLOWMEME_*` environment variables. Everything has a default; with no
//! backend URL the app runs offline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::BackendClient;
use crate::drag::DEFAULT_DRAG_OFFSET;
use crate::error::ConfigError;
use crate::export::Exporter;
use crate::gallery::{MemeListing, SupabaseListing};
use crate::loader::{Fetcher, HttpFetcher};
use crate::session::{SessionContext, SupabaseAuth};

const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;
/// One hour; anything longer is treated as this.
pub const MAX_LOAD_TIMEOUT_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemeConfig {
    pub backend_url: Option<String>,
    pub backend_anon_key: Option<String>,
    pub font_path: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub drag_offset: f32,
    pub load_timeout_secs: u64,
    pub publish_on_export: bool,
}

impl Default for MemeConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_anon_key: None,
            font_path: None,
            export_dir: None,
            drag_offset: DEFAULT_DRAG_OFFSET,
            load_timeout_secs: DEFAULT_LOAD_TIMEOUT_SECS,
            publish_on_export: false,
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "slowmeme")
}

/// `<config dir>/slowmeme`
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

impl MemeConfig {
    /// Config file plus environment. A missing file is fine; a broken one
    /// is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let file = config_dir().map(|d| d.join("config.json"));
        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Unparseable numbers are ignored, keeping the earlier value.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SLOWMEME_BACKEND_URL") {
            self.backend_url = Some(url);
        }
        if let Some(key) = var("SLOWMEME_BACKEND_KEY") {
            self.backend_anon_key = Some(key);
        }
        if let Some(font) = var("SLOWMEME_FONT") {
            self.font_path = Some(PathBuf::from(font));
        }
        if let Some(dir) = var("SLOWMEME_EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(dir));
        }
        if let Some(offset) = var("SLOWMEME_DRAG_OFFSET").and_then(|v| v.parse::<f32>().ok()) {
            if offset.is_finite() {
                self.drag_offset = offset;
            }
        }
        if let Some(secs) = var("SLOWMEME_LOAD_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            self.load_timeout_secs = secs.clamp(1, MAX_LOAD_TIMEOUT_SECS);
        }
        if let Some(publish) = var("SLOWMEME_PUBLISH") {
            self.publish_on_export = matches!(publish.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs.clamp(1, MAX_LOAD_TIMEOUT_SECS))
    }

    /// Configured dir, else Downloads, else home, else the working dir.
    pub fn resolved_export_dir(&self) -> PathBuf {
        if let Some(dir) = &self.export_dir {
            return dir.clone();
        }
        directories::UserDirs::new()
            .map(|u| {
                u.download_dir()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| u.home_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Backend client when both URL and key are set.
    pub fn backend(&self) -> Option<BackendClient> {
        let url = self.backend_url.as_deref()?;
        let key = self.backend_anon_key.as_deref()?;
        match BackendClient::new(url, key) {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("backend disabled: {}", e);
                None
            }
        }
    }

    pub fn session(&self) -> SessionContext {
        match self.backend() {
            Some(client) => {
                let store = config_dir().map(|d| d.join("session.json"));
                SessionContext::new(Arc::new(SupabaseAuth::new(client)), store)
            }
            None => SessionContext::offline(),
        }
    }

    pub fn listing(&self) -> Option<Arc<dyn MemeListing>> {
        self.backend()
            .map(|client| Arc::new(SupabaseListing::new(client)) as Arc<dyn MemeListing>)
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        Arc::new(HttpFetcher::new(self.load_timeout()))
    }

    pub fn exporter(&self, fetcher: Arc<dyn Fetcher>) -> Exporter {
        Exporter::new(
            self.resolved_export_dir(),
            fetcher,
            crate::font::meme_font(self.font_path.as_deref()),
            self.load_timeout(),
        )
    }
}
