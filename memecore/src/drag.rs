//! Pointer drag of a single text layer
//!
//! A drag starts on pointer-down over a layer and ends on the next
//! pointer-up anywhere on the surface. While active, pointer moves
//! reposition the layer so the pointer sits `offset` pixels right of and
//! below its anchor.

use crate::composition::{Composition, LayerId};

/// Offset applied between pointer and layer anchor.
pub const DEFAULT_DRAG_OFFSET: f32 = 50.0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSession {
    active: Option<LayerId>,
}

impl DragSession {
    pub fn begin(&mut self, id: LayerId) {
        log::debug!("drag start on layer {}", id);
        self.active = Some(id);
    }

    /// Clears the session; ending with nothing active is fine.
    pub fn end(&mut self) {
        if let Some(id) = self.active.take() {
            log::debug!("drag end on layer {}", id);
        }
    }

    pub fn active(&self) -> Option<LayerId> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Move the active layer under the pointer. Returns `true` if a layer moved.
    pub fn apply(&self, comp: &mut Composition, pointer_x: f32, pointer_y: f32, offset: f32) -> bool {
        let Some(id) = self.active else {
            return false;
        };
        match comp.layer_mut(id) {
            Some(layer) => {
                layer.x = pointer_x - offset;
                layer.y = pointer_y - offset;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::IdGenerator;

    #[test]
    fn test_idle_apply_is_noop() {
        let mut ids = IdGenerator::new();
        let mut comp = Composition::default();
        comp.push_default_layer(ids.next_id());
        let before = comp.clone();
        let drag = DragSession::default();
        assert!(!drag.apply(&mut comp, 300.0, 300.0, DEFAULT_DRAG_OFFSET));
        assert_eq!(comp, before);
    }

    #[test]
    fn test_apply_subtracts_offset() {
        let mut ids = IdGenerator::new();
        let mut comp = Composition::default();
        let id = ids.next_id();
        comp.push_default_layer(id);
        let mut drag = DragSession::default();
        drag.begin(id);
        assert!(drag.apply(&mut comp, 200.0, 120.0, 50.0));
        let layer = comp.layer(id).unwrap();
        assert_eq!((layer.x, layer.y), (150.0, 70.0));
    }

    #[test]
    fn test_end_twice() {
        let mut ids = IdGenerator::new();
        let mut drag = DragSession::default();
        drag.begin(ids.next_id());
        drag.end();
        drag.end();
        assert!(!drag.is_active());
    }
}
