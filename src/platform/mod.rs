//! Platform abstraction layer
//!
//! Thin wrappers over browser facilities used by the page features:
//! - Timers and animation frames that cancel when dropped
//! - Intersection-based visibility sensors
//! - A `performance.now()` clock
//! - DOM query, class and listener helpers

pub mod clock;
pub mod dom;
pub mod timer;
pub mod visibility;

pub use clock::PerformanceClock;
pub use timer::{AnimationFrame, FrameLoop, Interval, Timeout};
pub use visibility::VisibilitySensor;
