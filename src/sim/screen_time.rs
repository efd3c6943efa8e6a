//! Screen-time card build-up

pub const TARGET_MINUTES: f64 = (9 * 60 + 42) as f64;
pub const BUILDUP_MS: f64 = 3600.0;
/// Bar height at rest (percent)
pub const LOW_BAR_PERCENT: f64 = 16.0;
pub const TARGET_BAR_PERCENTS: [f64; 7] = [72.0, 82.0, 78.0, 88.0, 86.0, 96.0, 90.0];
/// Used for bars past the table
pub const FALLBACK_BAR_PERCENT: f64 = 78.0;

/// Cubic ease-out
pub fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// "9h 42m" style label, minutes rounded and zero-padded
pub fn format_time(total_minutes: f64) -> String {
    let minutes = total_minutes.round().max(0.0) as u32;
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Build-up progress after `elapsed_ms`
pub fn buildup_progress(elapsed_ms: f64) -> f64 {
    crate::clamp_f64(elapsed_ms / BUILDUP_MS, 0.0, 1.0)
}

/// Label and bar heights for a given progress
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenTimeFrame {
    pub label: String,
    pub bar_percents: Vec<f64>,
}

impl ScreenTimeFrame {
    /// Bar `i` starts growing at progress `i / bar_count`
    pub fn at(progress: f64, bar_count: usize) -> Self {
        let progress = crate::clamp_f64(progress, 0.0, 1.0);
        let bar_percents = (0..bar_count)
            .map(|i| {
                let local = crate::clamp_f64(progress * bar_count as f64 - i as f64, 0.0, 1.0);
                let target = TARGET_BAR_PERCENTS.get(i).copied().unwrap_or(FALLBACK_BAR_PERCENT);
                LOW_BAR_PERCENT + (target - LOW_BAR_PERCENT) * ease_out(local)
            })
            .collect();
        Self {
            label: format_time(TARGET_MINUTES * progress),
            bar_percents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(582.0), "9h 42m");
        assert_eq!(format_time(0.0), "0h 00m");
        assert_eq!(format_time(65.4), "1h 05m");
        assert_eq!(format_time(-3.0), "0h 00m");
    }

    #[test]
    fn test_ease_out() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert!((ease_out(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_frames() {
        let start = ScreenTimeFrame::at(0.0, 7);
        assert_eq!(start.label, "0h 00m");
        assert!(start.bar_percents.iter().all(|&h| h == LOW_BAR_PERCENT));

        let end = ScreenTimeFrame::at(1.0, 7);
        assert_eq!(end.label, "9h 42m");
        assert_eq!(end.bar_percents, TARGET_BAR_PERCENTS.to_vec());

        // Halfway: first three bars done, fourth half grown, rest at rest
        let mid = ScreenTimeFrame::at(0.5, 7);
        assert_eq!(mid.bar_percents[0], 72.0);
        assert!(mid.bar_percents[3] > LOW_BAR_PERCENT && mid.bar_percents[3] < 88.0);
        assert_eq!(mid.bar_percents[4], LOW_BAR_PERCENT);

        let extra = ScreenTimeFrame::at(1.0, 8);
        assert_eq!(extra.bar_percents[7], FALLBACK_BAR_PERCENT);
    }

    #[test]
    fn test_buildup_progress() {
        assert_eq!(buildup_progress(-10.0), 0.0);
        assert_eq!(buildup_progress(1800.0), 0.5);
        assert_eq!(buildup_progress(10_000.0), 1.0);
    }
}
