//! Repaint controller
//!
//! egui redraws on input by default. Background loads, exports and
//! backend calls finish off the UI thread, so while any of them is pending
//! the app asks for timed repaints and polls them; once idle it sleeps
//! until the next input event.

use std::time::Duration;

const DEFAULT_REPAINT_INTERVAL: Duration = Duration::from_millis(250);

/// What `end_frame` asks egui for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Now,
    After(Duration),
    Idle,
}

pub struct RepaintController {
    continuous: bool,
    needs_repaint: bool,
    interval: Duration,
}

impl Default for RepaintController {
    fn default() -> Self {
        Self::new()
    }
}

impl RepaintController {
    pub fn new() -> Self {
        Self {
            continuous: false,
            needs_repaint: false,
            interval: DEFAULT_REPAINT_INTERVAL,
        }
    }

    /// Keep polling on a timer while background work is in flight.
    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    pub fn mark_needs_repaint(&mut self) {
        self.needs_repaint = true;
    }

    pub fn begin_frame(&mut self) {
        self.needs_repaint = false;
    }

    fn request(&self) -> Request {
        if self.needs_repaint {
            Request::Now
        } else if self.continuous {
            Request::After(self.interval)
        } else {
            Request::Idle
        }
    }

    pub fn end_frame(&mut self, ctx: &egui::Context) {
        match self.request() {
            Request::Now => ctx.request_repaint(),
            Request::After(interval) => ctx.request_repaint_after(interval),
            Request::Idle => {}
        }
    }
}
