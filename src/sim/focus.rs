//! Chapter focus tracking
//!
//! Scores every chapter by how close its center sits to the scroller's center
//! and picks exactly one active chapter.

/// Chapter box relative to the scroller's visible top (px)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChapterRect {
    pub top: f64,
    pub height: f64,
}

impl ChapterRect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn center(&self) -> f64 {
        self.top + self.height * 0.5
    }
}

/// Continuous animation inputs published for every chapter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusSample {
    /// 1 at the viewport center, falling to 0 half a viewport away
    pub focus: f64,
    /// Signed distance from center in half-viewports, clamped to [-1, 1]
    pub offset: f64,
}

impl FocusSample {
    pub fn of(rect: ChapterRect, viewport_height: f64) -> Self {
        let center = viewport_height * 0.5;
        if center <= 0.0 {
            return Self {
                focus: 0.0,
                offset: 0.0,
            };
        }
        let delta = rect.center() - center;
        Self {
            focus: (1.0 - delta.abs() / center).max(0.0),
            offset: crate::clamp_f64(delta / center, -1.0, 1.0),
        }
    }
}

/// Result of one evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct FocusUpdate {
    pub samples: Vec<FocusSample>,
    pub active: Option<usize>,
    /// Previously active chapter, when the active one changed
    pub previous: Option<usize>,
    /// Chapter whose perched pigeon should fly off
    pub fly_off: Option<usize>,
    /// Chapter whose fly-off latch should be cleared
    pub clear_fly_off: Option<usize>,
}

/// Remembers the active chapter between passes
#[derive(Debug, Default, Clone, Copy)]
pub struct FocusTracker {
    last_active: Option<usize>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.last_active
    }

    /// Score `rects` and pick the active chapter; first maximum wins
    pub fn evaluate(
        &mut self,
        viewport_height: f64,
        rects: &[ChapterRect],
        forward_intent: bool,
    ) -> FocusUpdate {
        let samples: Vec<FocusSample> = rects
            .iter()
            .map(|&rect| FocusSample::of(rect, viewport_height))
            .collect();

        let mut strongest = -1.0;
        let mut active = None;
        for (i, sample) in samples.iter().enumerate() {
            if sample.focus > strongest {
                strongest = sample.focus;
                active = Some(i);
            }
        }

        let mut update = FocusUpdate {
            samples,
            active,
            previous: None,
            fly_off: None,
            clear_fly_off: None,
        };

        let Some(next) = active else {
            return update;
        };
        if active == self.last_active {
            return update;
        }

        if let Some(prev) = self.last_active {
            if next > prev && forward_intent {
                update.fly_off = Some(prev);
            }
        }
        update.previous = self.last_active;
        update.clear_fly_off = Some(next);
        self.last_active = Some(next);
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacked(count: usize, height: f64, scroll: f64) -> Vec<ChapterRect> {
        (0..count)
            .map(|i| ChapterRect::new(i as f64 * height - scroll, height))
            .collect()
    }

    #[test]
    fn test_focus_sample() {
        // Centered chapter
        let s = FocusSample::of(ChapterRect::new(0.0, 800.0), 800.0);
        assert_eq!(s.focus, 1.0);
        assert_eq!(s.offset, 0.0);

        // One full viewport below: focus floors at 0, offset clamps to 1
        let s = FocusSample::of(ChapterRect::new(800.0, 800.0), 800.0);
        assert_eq!(s.focus, 0.0);
        assert_eq!(s.offset, 1.0);

        // Quarter viewport above
        let s = FocusSample::of(ChapterRect::new(-200.0, 800.0), 800.0);
        assert!((s.focus - 0.5).abs() < 1e-9);
        assert!((s.offset + 0.5).abs() < 1e-9);

        let s = FocusSample::of(ChapterRect::new(0.0, 100.0), 0.0);
        assert_eq!(s.focus, 0.0);
    }

    #[test]
    fn test_ties_go_to_first() {
        let mut tracker = FocusTracker::new();
        // Two chapters equidistant from center, both half in view
        let rects = vec![ChapterRect::new(-400.0, 800.0), ChapterRect::new(400.0, 800.0)];
        let update = tracker.evaluate(800.0, &rects, false);
        assert_eq!(update.active, Some(0));
    }

    #[test]
    fn test_everything_far_away_still_picks_one() {
        let mut tracker = FocusTracker::new();
        let rects = vec![ChapterRect::new(5000.0, 100.0), ChapterRect::new(9000.0, 100.0)];
        let update = tracker.evaluate(800.0, &rects, false);
        assert_eq!(update.active, Some(0));
        assert!(tracker.evaluate(800.0, &[], false).active.is_none());
    }

    #[test]
    fn test_forward_change_triggers_fly_off() {
        let mut tracker = FocusTracker::new();
        let first = tracker.evaluate(800.0, &stacked(3, 800.0, 0.0), false);
        assert_eq!(first.active, Some(0));
        // First pick has no predecessor but still clears its own latch
        assert_eq!(first.previous, None);
        assert_eq!(first.clear_fly_off, Some(0));
        assert_eq!(first.fly_off, None);

        let update = tracker.evaluate(800.0, &stacked(3, 800.0, 800.0), true);
        assert_eq!(update.active, Some(1));
        assert_eq!(update.previous, Some(0));
        assert_eq!(update.fly_off, Some(0));
        assert_eq!(update.clear_fly_off, Some(1));

        // Same chapter again: nothing changes
        let update = tracker.evaluate(800.0, &stacked(3, 800.0, 810.0), true);
        assert_eq!(update.active, Some(1));
        assert_eq!(update.previous, None);
        assert_eq!(update.clear_fly_off, None);
        assert_eq!(update.fly_off, None);
    }

    #[test]
    fn test_no_fly_off_without_intent_or_going_back() {
        let mut tracker = FocusTracker::new();
        tracker.evaluate(800.0, &stacked(3, 800.0, 800.0), false);

        let update = tracker.evaluate(800.0, &stacked(3, 800.0, 1600.0), false);
        assert_eq!(update.active, Some(2));
        assert_eq!(update.fly_off, None);

        let update = tracker.evaluate(800.0, &stacked(3, 800.0, 800.0), true);
        assert_eq!(update.active, Some(1));
        assert_eq!(update.fly_off, None);
        assert_eq!(update.clear_fly_off, Some(1));
    }
}
