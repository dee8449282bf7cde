//! Export - flatten a composition snapshot into `meme.png`
//!
//! Signed-out users get `AuthenticationRequired` and nothing else happens.
//! Otherwise the work (load, draw, encode, write) runs on a worker thread
//! and the caller polls the returned job.

use ab_glyph::FontArc;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::composition::Composition;
use crate::error::ExportError;
use crate::loader::{spawn_load, Fetcher};
use crate::render::render_composition;

pub const EXPORT_FILE_NAME: &str = "meme.png";

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedMeme {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

pub enum ExportOutcome {
    /// No session; the caller should send the user to sign in.
    AuthenticationRequired,
    Started(ExportJob),
}

impl ExportOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// An export running in the background.
pub struct ExportJob {
    rx: Receiver<Result<ExportedMeme, ExportError>>,
}

impl ExportJob {
    /// `None` while still working.
    pub fn poll(&self) -> Option<Result<ExportedMeme, ExportError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ExportError::WorkerLost)),
        }
    }

    pub fn wait(self) -> Result<ExportedMeme, ExportError> {
        self.rx.recv().unwrap_or(Err(ExportError::WorkerLost))
    }
}

pub struct Exporter {
    fetcher: Arc<dyn Fetcher>,
    font: Option<FontArc>,
    export_dir: PathBuf,
    load_timeout: Duration,
}

impl Exporter {
    pub fn new(
        export_dir: PathBuf,
        fetcher: Arc<dyn Fetcher>,
        font: Option<FontArc>,
        load_timeout: Duration,
    ) -> Self {
        Self { fetcher, font, export_dir, load_timeout }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn output_path(&self) -> PathBuf {
        self.export_dir.join(EXPORT_FILE_NAME)
    }

    pub fn export(&self, comp: &Composition, signed_in: bool) -> ExportOutcome {
        if !signed_in {
            log::info!("export requested without a session");
            return ExportOutcome::AuthenticationRequired;
        }

        let comp = comp.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let font = self.font.clone();
        let path = self.output_path();
        let timeout = self.load_timeout;
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let result = run_export(&comp, fetcher, font, &path, timeout);
            match &result {
                Ok(meme) => log::info!("exported {}x{} meme to {}", meme.width, meme.height, meme.path.display()),
                Err(e) => log::warn!("export failed: {}", e),
            }
            let _ = tx.send(result);
        });

        ExportOutcome::Started(ExportJob { rx })
    }
}

fn run_export(
    comp: &Composition,
    fetcher: Arc<dyn Fetcher>,
    font: Option<FontArc>,
    path: &Path,
    timeout: Duration,
) -> Result<ExportedMeme, ExportError> {
    let background = spawn_load(comp.background.clone(), fetcher, timeout).wait()?;
    let font = font.ok_or(ExportError::NoFont)?;
    let img = render_composition(comp, &background, &font)?;
    let png = encode_png(&img)?;
    write_file(path, &png)?;
    Ok(ExportedMeme {
        path: path.to_path_buf(),
        width: img.width(),
        height: img.height(),
        png,
    })
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).map_err(ExportError::Encode)?;
    Ok(out.into_inner())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let wrap = |source| ExportError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    std::fs::write(path, bytes).map_err(wrap)
}
