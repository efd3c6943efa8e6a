//! Chapter advance readiness
//!
//! `Pending -> AwaitingTyping -> Holding -> Beat -> Ready`. Readiness unlocks
//! the "enter to continue" affordance once typing and any chapter-specific
//! animation have finished.

/// Fixed beat after every hold (ms)
pub const GLOBAL_BEAT_MS: f64 = 460.0;
/// Typing completion is forced after this long (ms)
pub const TYPING_FAILSAFE_MS: f64 = 12_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CtaPhase {
    Pending,
    AwaitingTyping { failsafe_at: f64 },
    Holding { until: f64 },
    Beat { until: f64 },
    Ready,
}

/// Result of polling the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtaPoll {
    Idle,
    /// Failsafe expired: complete the chapter's lines, then poll again
    ForceTyping,
    BecameReady,
}

/// Readiness for one chapter with a successor
#[derive(Debug, Clone)]
pub struct CtaReadiness {
    phase: CtaPhase,
    hold_ms: f64,
}

impl CtaReadiness {
    pub fn new(hold_ms: u32) -> Self {
        Self {
            phase: CtaPhase::Pending,
            hold_ms: hold_ms as f64,
        }
    }

    pub fn phase(&self) -> CtaPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == CtaPhase::Ready
    }

    /// Chapter came into view; only the first call starts the sequence
    pub fn start(&mut self, now: f64) -> bool {
        if self.phase != CtaPhase::Pending {
            return false;
        }
        self.phase = CtaPhase::AwaitingTyping {
            failsafe_at: now + TYPING_FAILSAFE_MS,
        };
        true
    }

    /// Advance as far as `now` allows
    pub fn poll(&mut self, now: f64, typing_done: bool) -> CtaPoll {
        loop {
            match self.phase {
                CtaPhase::Pending | CtaPhase::Ready => return CtaPoll::Idle,
                CtaPhase::AwaitingTyping { failsafe_at } => {
                    if typing_done {
                        self.phase = if self.hold_ms > 0.0 {
                            CtaPhase::Holding {
                                until: now + self.hold_ms,
                            }
                        } else {
                            CtaPhase::Beat {
                                until: now + GLOBAL_BEAT_MS,
                            }
                        };
                    } else if now >= failsafe_at {
                        return CtaPoll::ForceTyping;
                    } else {
                        return CtaPoll::Idle;
                    }
                }
                CtaPhase::Holding { until } => {
                    if now < until {
                        return CtaPoll::Idle;
                    }
                    self.phase = CtaPhase::Beat {
                        until: until + GLOBAL_BEAT_MS,
                    };
                }
                CtaPhase::Beat { until } => {
                    if now < until {
                        return CtaPoll::Idle;
                    }
                    self.phase = CtaPhase::Ready;
                    return CtaPoll::BecameReady;
                }
            }
        }
    }

    /// When the next poll could make progress
    pub fn next_deadline(&self) -> Option<f64> {
        match self.phase {
            CtaPhase::AwaitingTyping { failsafe_at } => Some(failsafe_at),
            CtaPhase::Holding { until } | CtaPhase::Beat { until } => Some(until),
            CtaPhase::Pending | CtaPhase::Ready => None,
        }
    }
}

/// Enter or the numpad Enter key
pub fn is_advance_key(key: &str) -> bool {
    matches!(key, "Enter" | "NumpadEnter")
}

/// Keyboard focus is in a text-editing control
pub fn is_editing_field(tag_name: &str, content_editable: bool) -> bool {
    content_editable || matches!(tag_name.to_ascii_uppercase().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
}

/// Chapter to scroll to when advancing from `active`, if it is ready
pub fn advance_target(active: Option<usize>, active_ready: bool, chapter_count: usize) -> Option<usize> {
    let active = active?;
    if !active_ready {
        return None;
    }
    let next = active + 1;
    (next < chapter_count).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waits_for_typing_then_hold_then_beat() {
        let mut cta = CtaReadiness::new(220);
        assert_eq!(cta.poll(0.0, true), CtaPoll::Idle);
        assert!(cta.start(0.0));
        assert!(!cta.start(50.0));

        assert_eq!(cta.poll(1000.0, false), CtaPoll::Idle);
        assert_eq!(cta.poll(2000.0, true), CtaPoll::Idle);
        assert_eq!(cta.phase(), CtaPhase::Holding { until: 2220.0 });
        assert_eq!(cta.next_deadline(), Some(2220.0));

        assert_eq!(cta.poll(2220.0, true), CtaPoll::Idle);
        assert_eq!(cta.phase(), CtaPhase::Beat { until: 2680.0 });
        assert_eq!(cta.poll(2679.0, true), CtaPoll::Idle);
        assert_eq!(cta.poll(2680.0, true), CtaPoll::BecameReady);
        assert!(cta.is_ready());
        assert_eq!(cta.poll(9999.0, true), CtaPoll::Idle);
        assert_eq!(cta.next_deadline(), None);
    }

    #[test]
    fn test_late_poll_runs_through() {
        let mut cta = CtaReadiness::new(8200);
        cta.start(0.0);
        cta.poll(100.0, true);
        // One late poll covers both the hold and the beat
        assert_eq!(cta.poll(20_000.0, true), CtaPoll::BecameReady);
    }

    #[test]
    fn test_zero_hold_goes_straight_to_beat() {
        let mut cta = CtaReadiness::new(0);
        cta.start(0.0);
        cta.poll(10.0, true);
        assert_eq!(cta.phase(), CtaPhase::Beat { until: 470.0 });
    }

    #[test]
    fn test_failsafe_requests_forced_typing() {
        let mut cta = CtaReadiness::new(220);
        cta.start(0.0);
        assert_eq!(cta.poll(11_999.0, false), CtaPoll::Idle);
        assert_eq!(cta.poll(12_000.0, false), CtaPoll::ForceTyping);
        // Still not ready until the lines are actually done
        assert!(!cta.is_ready());
        assert_eq!(cta.poll(12_000.0, true), CtaPoll::Idle);
        assert_eq!(cta.poll(12_680.0, true), CtaPoll::BecameReady);
    }

    #[test]
    fn test_advance_helpers() {
        assert!(is_advance_key("Enter"));
        assert!(is_advance_key("NumpadEnter"));
        assert!(!is_advance_key(" "));

        assert!(is_editing_field("INPUT", false));
        assert!(is_editing_field("textarea", false));
        assert!(is_editing_field("DIV", true));
        assert!(!is_editing_field("BUTTON", false));

        assert_eq!(advance_target(Some(1), true, 3), Some(2));
        assert_eq!(advance_target(Some(2), true, 3), None);
        assert_eq!(advance_target(Some(1), false, 3), None);
        assert_eq!(advance_target(None, true, 3), None);
    }
}
