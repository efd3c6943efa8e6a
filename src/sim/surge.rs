//! Notification storm and lockscreen feed timing

/// Pop-in settle time of the last card (ms)
pub const SURGE_SETTLE_MS: u32 = 280;
/// Lockscreen note drop: first stagger, per-note stagger, drop, tail (ms)
pub const NOTE_INITIAL_DELAY_MS: u32 = 120;
pub const NOTE_STEP_DELAY_MS: u32 = 340;
pub const NOTE_DROP_MS: u32 = 720;
pub const NOTE_TAIL_MS: u32 = 120;

/// Delay after card `shown` (1-based) of `count` goes live
///
/// Starts near 320ms and ramps down hard as the storm grows, never below 35ms.
pub fn surge_delay_ms(shown: usize, count: usize) -> u32 {
    if count == 0 {
        return 35;
    }
    let progress = shown as f64 / count as f64;
    let ramp = progress.powf(0.58);
    (320.0 - ramp * 285.0).round().max(35.0) as u32
}

/// Total storm duration for `count` cards, including the final settle
pub fn estimate_surge_ms(count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    let total: u32 = (1..=count).map(|i| surge_delay_ms(i, count)).sum();
    total + SURGE_SETTLE_MS
}

/// How long the lockscreen notes take to finish dropping in
pub fn consumption_hold_ms(notes: usize) -> u32 {
    let stagger = if notes > 0 {
        NOTE_INITIAL_DELAY_MS + (notes as u32 - 1) * NOTE_STEP_DELAY_MS
    } else {
        0
    };
    stagger + NOTE_DROP_MS + NOTE_TAIL_MS
}

/// Relative timestamp shown on the lockscreen note at `position`
pub fn note_time_label(position: usize) -> String {
    if position == 0 {
        "now".to_string()
    } else {
        format!("{position}m")
    }
}

/// Cards going live one at a time
#[derive(Debug, Clone)]
pub struct NotificationSurge {
    count: usize,
    shown: usize,
    running: bool,
}

impl NotificationSurge {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            shown: 0,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Begin from an empty board; ignored while already running
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.reset();
        self.running = true;
        true
    }

    /// Stop and hide every card
    pub fn reset(&mut self) {
        self.running = false;
        self.shown = 0;
    }

    /// Next card to show and the wait before the following one
    pub fn next_card(&mut self) -> Option<(usize, u32)> {
        if !self.running || self.shown >= self.count {
            return None;
        }
        let index = self.shown;
        self.shown += 1;
        Some((index, surge_delay_ms(self.shown, self.count)))
    }
}

/// One-at-a-time guard for recycling lockscreen notes
#[derive(Debug, Default, Clone, Copy)]
pub struct NoteRecycler {
    busy: bool,
}

impl NoteRecycler {
    pub fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surge_delays_ramp_down() {
        // 1 of 10: 320 - 0.1^0.58 * 285 = 320 - 0.263 * 285 = 245
        assert_eq!(surge_delay_ms(1, 10), 245);
        assert_eq!(surge_delay_ms(10, 10), 35);
        let delays: Vec<u32> = (1..=10).map(|i| surge_delay_ms(i, 10)).collect();
        assert!(delays.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_estimate() {
        assert_eq!(estimate_surge_ms(0), 0);
        assert_eq!(estimate_surge_ms(1), 35 + 280);
        let sum: u32 = (1..=12).map(|i| surge_delay_ms(i, 12)).sum();
        assert_eq!(estimate_surge_ms(12), sum + 280);
    }

    #[test]
    fn test_consumption_hold() {
        assert_eq!(consumption_hold_ms(0), 840);
        assert_eq!(consumption_hold_ms(1), 960);
        assert_eq!(consumption_hold_ms(5), 120 + 4 * 340 + 840);
    }

    #[test]
    fn test_surge_sequence_and_reset() {
        let mut surge = NotificationSurge::new(3);
        assert_eq!(surge.next_card(), None);
        assert!(surge.start());
        assert!(!surge.start());

        let order: Vec<usize> = std::iter::from_fn(|| surge.next_card().map(|(i, _)| i)).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(surge.shown(), 3);

        surge.reset();
        assert_eq!(surge.shown(), 0);
        assert!(!surge.is_running());
        assert!(surge.start());
        assert_eq!(surge.next_card().map(|(i, _)| i), Some(0));
    }

    #[test]
    fn test_note_labels_and_recycler() {
        assert_eq!(note_time_label(0), "now");
        assert_eq!(note_time_label(3), "3m");

        let mut recycler = NoteRecycler::default();
        assert!(recycler.try_begin());
        assert!(!recycler.try_begin());
        recycler.finish();
        assert!(recycler.try_begin());
    }
}
