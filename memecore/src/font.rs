//! Meme typeface lookup
//!
//! Impact is the classic meme face but can't be shipped, so we search the
//! usual system locations for it (and a couple of look-alikes) and fall back
//! to the proportional font bundled with egui, which is always present.

use ab_glyph::FontArc;
use std::path::{Path, PathBuf};

const CANDIDATE_FILES: &[&str] = &[
    "Impact.ttf",
    "impact.ttf",
    "Anton-Regular.ttf",
    "DejaVuSans-Bold.ttf",
    "LiberationSans-Bold.ttf",
];

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/msttcorefonts",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "C:\\Windows\\Fonts",
];

/// Resolve the font used for export. `configured` wins when it parses.
pub fn meme_font(configured: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = configured {
        match read_font(path) {
            Some(font) => return Some(font),
            None => log::warn!("configured font {} unusable, searching system fonts", path.display()),
        }
    }
    for path in system_candidates() {
        if let Some(font) = read_font(&path) {
            log::debug!("using meme font {}", path.display());
            return Some(font);
        }
    }
    log::debug!("no system meme font found, using bundled font");
    bundled_font()
}

fn system_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dirs) = directories::BaseDirs::new() {
        let local = dirs.data_local_dir().join("fonts");
        for file in CANDIDATE_FILES {
            paths.push(local.join(file));
        }
    }
    for dir in SYSTEM_FONT_DIRS {
        for file in CANDIDATE_FILES {
            paths.push(Path::new(dir).join(file));
        }
    }
    paths
}

fn read_font(path: &Path) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    match FontArc::try_from_vec(data) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("{}: {}", path.display(), e);
            None
        }
    }
}

/// The first proportional font egui ships with.
pub fn bundled_font() -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let names = defs
        .families
        .get(&egui::FontFamily::Proportional)
        .cloned()
        .unwrap_or_default();
    names
        .iter()
        .filter_map(|name| defs.font_data.get(name))
        .find_map(|data| FontArc::try_from_vec(data.font.to_vec()).ok())
        .or_else(|| {
            defs.font_data
                .values()
                .find_map(|data| FontArc::try_from_vec(data.font.to_vec()).ok())
        })
}
