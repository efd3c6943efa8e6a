//! Pigeon manifesto - scroll-driven narrative page engine
//!
//! Core modules:
//! - `sim`: Pure page logic (chapter state, typewriter, coin physics, snake, paint)
//! - `platform`: Browser abstraction (timers, animation frames, visibility sensors)
//! - `renderer`: Canvas 2D drawing for the interactive chapters
//! - `page`: Orchestrator that wires one feature per page section
//! - `settings`: Persisted preferences
//! - `chat`: Client side of the chat relay contract

pub mod chat;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod page;
#[cfg(target_arch = "wasm32")]
pub mod platform;
#[cfg(target_arch = "wasm32")]
pub mod renderer;

pub use settings::{MotionPreference, Settings};

/// Page configuration constants
pub mod consts {
    /// Id of the vertically scrolling container that hosts every chapter
    pub const SCROLLER_ID: &str = "manifestoScroll";
    /// Selector matching every chapter section
    pub const CHAPTER_SELECTOR: &str = "[data-chapter]";
    /// Selector matching typed lines inside a chapter
    pub const TYPE_LINE_SELECTOR: &str = ".type-line[data-text]";

    /// Visibility thresholds (fraction of the chapter inside the scroller)
    pub const REVEAL_THRESHOLD: f64 = 0.45;
    pub const SNAKE_THRESHOLD: f64 = 0.45;
    pub const CTA_THRESHOLD: f64 = 0.5;
    pub const DECORATION_THRESHOLD: f64 = 0.52;
    pub const COIN_RAIN_THRESHOLD: f64 = 0.52;
    pub const TYPING_THRESHOLD: f64 = 0.55;
    pub const STORM_THRESHOLD: f64 = 0.55;
    pub const JOIN_THRESHOLD: f64 = 0.55;
    pub const SCREEN_TIME_THRESHOLD: f64 = 0.55;

    /// Delay before deferred visuals and the logon word appear (ms)
    pub const VISUAL_REVEAL_DELAY_MS: u32 = 120;
    /// Perched pigeons wait this long after the visual is ready (ms)
    pub const PERCHED_ARRIVAL_DELAY_MS: u32 = 3000;
    /// Pigeon wiggle duration (ms)
    pub const WIGGLE_MS: u32 = 360;
    /// Shift pigeon "fanned" intro duration (ms)
    pub const FAN_INTRO_MS: u32 = 1250;
    /// Lockscreen note removal animation (ms)
    pub const NOTE_RECYCLE_MS: u32 = 220;
    /// Interest ticker rotation period (ms)
    pub const TICKER_INTERVAL_MS: u32 = 1800;
}

/// Clamp `value` into `[min, max]` without panicking when the bounds cross
#[inline]
pub fn clamp_f32(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Clamp `value` into `[min, max]` without panicking when the bounds cross
#[inline]
pub fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Scroll target that centers a chapter inside the scroller
///
/// Clamped to the scrollable range so short pages never overscroll.
pub fn centered_scroll_top(
    chapter_top: f64,
    chapter_height: f64,
    client_height: f64,
    scroll_height: f64,
) -> f64 {
    let centered = chapter_top - (client_height - chapter_height) / 2.0;
    let max_top = (scroll_height - client_height).max(0.0);
    clamp_f64(centered, 0.0, max_top)
}

/// Reading progress in `[0, 1]`; zero when the page cannot scroll
pub fn scroll_progress(scroll_top: f64, scroll_height: f64, client_height: f64) -> f64 {
    let max = scroll_height - client_height;
    if max > 0.0 {
        clamp_f64(scroll_top / max, 0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_scroll_top() {
        // Chapter at 1000px, 600 tall, viewport 800: center means top at 900
        assert_eq!(centered_scroll_top(1000.0, 600.0, 800.0, 5000.0), 900.0);
        // Never above the page
        assert_eq!(centered_scroll_top(0.0, 400.0, 800.0, 5000.0), 0.0);
        // Never past the end
        assert_eq!(centered_scroll_top(4800.0, 200.0, 800.0, 5000.0), 4200.0);
        // Page shorter than viewport
        assert_eq!(centered_scroll_top(100.0, 100.0, 800.0, 600.0), 0.0);
    }

    #[test]
    fn test_scroll_progress() {
        assert_eq!(scroll_progress(0.0, 2000.0, 1000.0), 0.0);
        assert_eq!(scroll_progress(500.0, 2000.0, 1000.0), 0.5);
        assert_eq!(scroll_progress(1500.0, 2000.0, 1000.0), 1.0);
        assert_eq!(scroll_progress(10.0, 800.0, 1000.0), 0.0);
    }
}
