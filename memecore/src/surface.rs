//! Composition surface - owns the editable state and the drag session
//!
//! Every operation is synchronous and runs to completion; the UI calls
//! these from its event handling and renders `composition()` each frame.

use crate::catalog;
use crate::composition::{
    Composition, IdGenerator, LayerId, DEFAULT_FONT_SIZE, MAX_FONT_SIZE, MIN_FONT_SIZE,
};
use crate::drag::{DragSession, DEFAULT_DRAG_OFFSET};
use crate::source::{ImageSource, UploadedFile};

#[derive(Debug)]
pub struct Surface {
    composition: Composition,
    drag: DragSession,
    ids: IdGenerator,
    drag_offset: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self::with_drag_offset(DEFAULT_DRAG_OFFSET)
    }

    pub fn with_drag_offset(drag_offset: f32) -> Self {
        Self {
            composition: Composition::default(),
            drag: DragSession::default(),
            ids: IdGenerator::new(),
            drag_offset,
        }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Copy for the export routine; later edits don't affect it.
    pub fn snapshot(&self) -> Composition {
        self.composition.clone()
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn drag_offset(&self) -> f32 {
        self.drag_offset
    }

    pub fn select_template(&mut self, source: ImageSource) {
        log::debug!("background -> {:?}", source);
        self.composition.background = source;
    }

    /// No file chosen is not an error.
    pub fn upload_image(&mut self, file: Option<UploadedFile>) {
        let Some(file) = file else {
            return;
        };
        log::info!("using uploaded image {} ({} bytes)", file.name, file.bytes.len());
        self.composition.background = file.into_source();
    }

    pub fn add_text_layer(&mut self) -> LayerId {
        let id = self.ids.next_id();
        self.composition.push_default_layer(id);
        log::debug!("added text layer {}", id);
        id
    }

    /// Replace a layer's text. Unknown ids are ignored.
    pub fn edit_text_layer(&mut self, id: LayerId, text: impl Into<String>) -> bool {
        match self.composition.layer_mut(id) {
            Some(layer) => {
                layer.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn begin_drag(&mut self, id: LayerId) {
        self.drag.begin(id);
    }

    pub fn update_drag_position(&mut self, pointer_x: f32, pointer_y: f32) -> bool {
        self.drag
            .apply(&mut self.composition, pointer_x, pointer_y, self.drag_offset)
    }

    pub fn end_drag(&mut self) {
        self.drag.end();
    }

    pub fn set_font_size(&mut self, size: f32) {
        if size.is_finite() {
            self.composition.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
    }

    /// Start over on the first template with no text.
    pub fn reset(&mut self) {
        self.drag.end();
        self.composition = Composition {
            background: catalog::default_template().source(),
            layers: Vec::new(),
            font_size: DEFAULT_FONT_SIZE,
        };
    }
}
