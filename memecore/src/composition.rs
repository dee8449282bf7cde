//! Composition - the editable meme: background, text layers, font size

use std::fmt;

use crate::catalog;
use crate::source::ImageSource;

pub const DEFAULT_TEXT: &str = "Edit Me";
pub const DEFAULT_POSITION: (f32, f32) = (50.0, 50.0);
pub const DEFAULT_FONT_SIZE: f32 = 32.0;
pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 128.0;

/// Opaque text layer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out layer ids from the wall clock (milliseconds), bumped past the
/// last id so two calls within the same millisecond still differ.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> LayerId {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        self.last = now.max(self.last + 1);
        LayerId(self.last)
    }
}

/// One piece of overlay text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub id: LayerId,
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub background: ImageSource,
    /// Draw order: later layers on top.
    pub layers: Vec<TextLayer>,
    /// Shared by every layer.
    pub font_size: f32,
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            background: catalog::default_template().source(),
            layers: Vec::new(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl Composition {
    pub fn with_background(background: ImageSource) -> Self {
        Self {
            background,
            ..Self::default()
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut TextLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn push_default_layer(&mut self, id: LayerId) {
        let (x, y) = DEFAULT_POSITION;
        self.layers.push(TextLayer {
            id,
            text: DEFAULT_TEXT.to_string(),
            x,
            y,
        });
    }
}
