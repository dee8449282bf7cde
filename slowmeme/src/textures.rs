//! Textures for images fetched in the background
//!
//! Keyed by `ImageSource::cache_key`. A slot is requested once; the load
//! runs on a worker and is turned into a texture on the frame it lands.
//! Slots nobody has requested for `IDLE_FRAMES` frames are dropped, which
//! frees old uploads and gallery images.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use egui::{Context, TextureHandle, TextureOptions};
use memecore::loader::{spawn_load, Fetcher, PendingLoad};
use memecore::ImageSource;

const IDLE_FRAMES: u64 = 300;

pub enum Slot {
    Loading(PendingLoad),
    Ready(TextureHandle),
    Failed(String),
}

struct Entry {
    slot: Slot,
    last_used: u64,
}

pub struct TextureCache {
    entries: HashMap<String, Entry>,
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    frame: u64,
}

impl TextureCache {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self { entries: HashMap::new(), fetcher, timeout, frame: 0 }
    }

    /// Start loading `source` unless it is already known. Keeps the slot
    /// alive for this frame either way.
    pub fn request(&mut self, source: &ImageSource) -> String {
        let key = source.cache_key();
        let frame = self.frame;
        let entry = self.entries.entry(key.clone()).or_insert_with(|| {
            log::debug!("loading texture {:?}", source);
            let pending = spawn_load(source.clone(), self.fetcher.clone(), self.timeout);
            Entry { slot: Slot::Loading(pending), last_used: frame }
        });
        entry.last_used = frame;
        key
    }

    pub fn get(&self, key: &str) -> Option<&Slot> {
        self.entries.get(key).map(|e| &e.slot)
    }

    pub fn texture(&self, key: &str) -> Option<&TextureHandle> {
        match self.get(key) {
            Some(Slot::Ready(tex)) => Some(tex),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.entries.values().any(|e| matches!(e.slot, Slot::Loading(_)))
    }

    /// Forget a failed slot so the next `request` tries again.
    pub fn retry(&mut self, key: &str) {
        if matches!(self.get(key), Some(Slot::Failed(_))) {
            self.entries.remove(key);
        }
    }

    /// Turn finished loads into textures. True if anything changed.
    pub fn poll(&mut self, ctx: &Context) -> bool {
        let mut changed = false;
        for (key, entry) in self.entries.iter_mut() {
            let Slot::Loading(pending) = &entry.slot else {
                continue;
            };
            let Some(result) = pending.poll() else {
                continue;
            };
            entry.slot = match result {
                Ok(img) => {
                    let color = memecore::render::color_image(&img.to_rgba8());
                    Slot::Ready(ctx.load_texture(format!("meme_{key}"), color, TextureOptions::LINEAR))
                }
                Err(e) => {
                    log::warn!("image load failed: {}", e);
                    Slot::Failed(e.to_string())
                }
            };
            changed = true;
        }
        changed
    }

    /// Advance the frame clock and drop slots that went unrequested.
    pub fn end_frame(&mut self) {
        let frame = self.frame;
        let before = self.entries.len();
        self.entries.retain(|_, e| frame - e.last_used < IDLE_FRAMES);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("evicted {} idle textures", evicted);
        }
        self.frame += 1;
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
