//! Digit-reel counter
//!
//! Each reel's track holds the digits 0-9 twice. Showing digit `d` means
//! translating the track to `-d * 5%`. Rolling 9 -> 0 runs into the second
//! copy (`-(10 + d) * 5%`) and snaps back once the transition ends.

use rand::Rng;

/// Digits per reel track (0-9 twice)
pub const TRACK_DIGITS: u32 = 20;
/// Percent of the track height per digit
pub const DIGIT_STEP_PERCENT: f64 = 100.0 / TRACK_DIGITS as f64;
pub const DEFAULT_DIGITS: usize = 6;

pub const COUNTER_START: u32 = 312;
pub const COUNTER_TARGET: u32 = 487;
pub const COUNTER_DURATION_MS: f64 = 4200.0;
/// Floor on the per-step delay (ms)
pub const MIN_STEP_MS: f64 = 14.0;
/// Upper bound of the per-step jitter (ms)
pub const STEP_JITTER_MS: f64 = 12.0;

/// Zero-padded to `digits`; longer values are left intact
pub fn format_counter(value: u32, digits: usize) -> String {
    format!("{value:0digits$}")
}

/// Accessible label for the counter
pub fn aria_label(text: &str) -> String {
    format!("{text} people waiting")
}

/// Transition length of reel `index` out of `digits` (ms)
///
/// Lower-order reels move faster.
pub fn reel_transition_ms(digits: usize, index: usize) -> u32 {
    170 + digits.saturating_sub(index) as u32 * 20
}

/// Track offset for a position on the track, in percent (positive = up)
pub fn track_offset_percent(position: u32) -> f64 {
    position as f64 * DIGIT_STEP_PERCENT
}

/// What a reel does in response to a new value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelMotion {
    /// Jump without transition
    Instant { position: u32 },
    /// Transition forward to `position`
    Roll { position: u32 },
    /// Transition into the second copy, then snap to `settle` on transitionend
    Wrap { via: u32, settle: u32 },
    Unchanged,
    /// A wrap is still settling; this update is dropped
    Blocked,
}

#[derive(Debug, Clone, Copy, Default)]
struct Reel {
    value: u8,
    reset_pending: bool,
}

/// Reel bookkeeping for a multi-digit counter
#[derive(Debug, Clone)]
pub struct Odometer {
    reels: Vec<Reel>,
}

impl Odometer {
    pub fn new(digits: usize) -> Self {
        Self {
            reels: vec![Reel::default(); digits],
        }
    }

    pub fn digits(&self) -> usize {
        self.reels.len()
    }

    pub fn reel_value(&self, index: usize) -> Option<u8> {
        self.reels.get(index).map(|r| r.value)
    }

    pub fn is_settling(&self, index: usize) -> bool {
        self.reels.get(index).is_some_and(|r| r.reset_pending)
    }

    /// Show `value`; returns the padded text and one motion per reel
    pub fn set_value(&mut self, value: u32, instant: bool) -> (String, Vec<ReelMotion>) {
        let text = format_counter(value, self.digits());
        let motions = self
            .reels
            .iter_mut()
            .zip(text.bytes())
            .map(|(reel, byte)| Self::set_reel(reel, byte - b'0', instant))
            .collect();
        (text, motions)
    }

    fn set_reel(reel: &mut Reel, next: u8, instant: bool) -> ReelMotion {
        if reel.reset_pending {
            return ReelMotion::Blocked;
        }
        if instant {
            reel.value = next;
            return ReelMotion::Instant {
                position: next as u32,
            };
        }
        if next == reel.value {
            return ReelMotion::Unchanged;
        }
        if next > reel.value {
            reel.value = next;
            return ReelMotion::Roll {
                position: next as u32,
            };
        }
        reel.reset_pending = true;
        ReelMotion::Wrap {
            via: 10 + next as u32,
            settle: next as u32,
        }
    }

    /// A reel's wrap transition ended; returns the position to snap to
    pub fn settle(&mut self, index: usize, digit: u8) -> Option<u32> {
        let reel = self.reels.get_mut(index)?;
        if !reel.reset_pending {
            return None;
        }
        reel.reset_pending = false;
        reel.value = digit;
        Some(digit as u32)
    }
}

/// One step of a counter run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterStep {
    pub value: u32,
    /// Wait before the next step, `None` when the run is over
    pub next_delay_ms: Option<f64>,
}

/// Counts up one at a time with a lightly jittered cadence
#[derive(Debug, Clone)]
pub struct CounterRun {
    current: u32,
    target: u32,
    base_delay_ms: f64,
}

impl CounterRun {
    pub fn new(from: u32, to: u32, duration_ms: f64) -> Self {
        let steps = to.saturating_sub(from).max(1) as f64;
        Self {
            current: from,
            target: to,
            base_delay_ms: (duration_ms / steps).max(MIN_STEP_MS),
        }
    }

    /// Delay before the first step; zero when there is nothing to count
    pub fn first_delay_ms(&self) -> f64 {
        if self.target <= self.current {
            0.0
        } else {
            self.base_delay_ms
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.target
    }

    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> CounterStep {
        if self.target <= self.current {
            self.current = self.target;
            return CounterStep {
                value: self.target,
                next_delay_ms: None,
            };
        }
        self.current += 1;
        let next_delay_ms = (self.current < self.target)
            .then(|| self.base_delay_ms + rng.random::<f64>() * STEP_JITTER_MS);
        CounterStep {
            value: self.current,
            next_delay_ms,
        }
    }
}
