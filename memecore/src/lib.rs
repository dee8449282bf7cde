//! memecore - composition, rendering and export for slowMeme
//!
//! The editable state lives in [`Surface`]; [`Exporter`] flattens a
//! snapshot of it into `meme.png`. Identity and the shared meme listing
//! come from the hosted backend through [`SessionContext`] and
//! [`gallery::MemeListing`].

pub mod backend;
pub mod catalog;
pub mod composition;
pub mod config;
pub mod drag;
pub mod error;
pub mod export;
pub mod font;
pub mod gallery;
pub mod loader;
pub mod render;
pub mod session;
pub mod source;
pub mod surface;
pub mod task;

pub use composition::{Composition, LayerId, TextLayer};
pub use config::MemeConfig;
pub use export::{ExportJob, ExportOutcome, ExportedMeme, Exporter};
pub use session::{Identity, SessionContext};
pub use source::{ImageSource, UploadedFile};
pub use surface::Surface;
