//! Pure page logic
//!
//! Everything that decides *what* happens on the page lives here. This module
//! must stay free of platform dependencies:
//! - Time comes in as arguments (milliseconds or seconds) or an injected `Clock`
//! - Randomness comes from seeded `Pcg32` streams
//! - Stable iteration order (by index / creation order)
//! - No rendering or DOM access

pub mod chapter;
pub mod coins;
pub mod collision;
pub mod cta;
pub mod events;
pub mod focus;
pub mod intent;
pub mod odometer;
pub mod paint;
pub mod screen_time;
pub mod snake;
pub mod surge;
pub mod typewriter;

pub use chapter::{Chapter, ChapterCounts, ChapterFlag, ChapterKind, ChapterStore};
pub use coins::{Coin, CoinRain, CoinWorld};
pub use collision::{SpatialHash, penetration, resolve_pair, resolve_world_bounds};
pub use cta::{CtaPhase, CtaPoll, CtaReadiness};
pub use events::{ChapterEvent, EventBus};
pub use focus::{ChapterRect, FocusSample, FocusTracker, FocusUpdate};
pub use intent::{Clock, ForwardIntent, ManualClock, ScrollDirection};
pub use odometer::{CounterRun, CounterStep, Odometer, ReelMotion};
pub use paint::{PaintOp, PaintSession, PaintTool, Raster, Rgba, ShapeOutline, flood_fill};
pub use snake::{Direction, GridPos, SnakeGame, TickOutcome};
pub use screen_time::ScreenTimeFrame;
pub use surge::{NoteRecycler, NotificationSurge};
pub use typewriter::{Cadence, PassOptions, TypedLine, TypingPass, TypingStep};
