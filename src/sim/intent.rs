//! Forward navigation intent
//!
//! A short-lived, best-effort signal that the user is moving forward through
//! the page. Only animation polish depends on it.

use std::cell::Cell;
use std::rc::Rc;

/// Intent window after an explicit chapter advance (ms)
pub const ADVANCE_INTENT_MS: f64 = 900.0;
/// Intent window after a forward scroll (ms)
pub const SCROLL_INTENT_MS: f64 = 700.0;
/// Scroll movement below this is ignored (px)
pub const SCROLL_HYSTERESIS_PX: f64 = 2.0;

/// Millisecond time source
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Hand-driven clock for headless runs and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Shared forward-intent deadline
pub struct ForwardIntent {
    clock: Rc<dyn Clock>,
    forward_until: Cell<f64>,
}

impl ForwardIntent {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            forward_until: Cell::new(f64::NEG_INFINITY),
        }
    }

    /// Treat the user as moving forward for the next `duration_ms`
    pub fn mark_forward_intent(&self, duration_ms: f64) {
        self.forward_until.set(self.clock.now_ms() + duration_ms);
    }

    pub fn has_forward_intent(&self) -> bool {
        self.clock.now_ms() <= self.forward_until.get()
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }
}

/// Detects downward scrolling beyond the hysteresis band
#[derive(Debug, Clone, Copy)]
pub struct ScrollDirection {
    last_top: f64,
}

impl ScrollDirection {
    pub fn new(scroll_top: f64) -> Self {
        Self { last_top: scroll_top }
    }

    /// Record a new scroll position; true if it moved forward
    pub fn observe(&mut self, scroll_top: f64) -> bool {
        let forward = scroll_top > self.last_top + SCROLL_HYSTERESIS_PX;
        self.last_top = scroll_top;
        forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_window() {
        let clock = Rc::new(ManualClock::new(0.0));
        let intent = ForwardIntent::new(clock.clone());
        assert!(!intent.has_forward_intent());

        intent.mark_forward_intent(ADVANCE_INTENT_MS);
        clock.advance(900.0);
        // Inclusive at the deadline
        assert!(intent.has_forward_intent());
        clock.advance(1.0);
        assert!(!intent.has_forward_intent());
    }

    #[test]
    fn test_remark_extends() {
        let clock = Rc::new(ManualClock::new(1000.0));
        let intent = ForwardIntent::new(clock.clone());
        intent.mark_forward_intent(SCROLL_INTENT_MS);
        clock.advance(600.0);
        intent.mark_forward_intent(SCROLL_INTENT_MS);
        clock.advance(600.0);
        assert!(intent.has_forward_intent());
    }

    #[test]
    fn test_scroll_direction_hysteresis() {
        let mut direction = ScrollDirection::new(100.0);
        assert!(!direction.observe(102.0));
        assert!(direction.observe(104.5));
        assert!(!direction.observe(50.0));
        assert!(direction.observe(60.0));
    }
}
