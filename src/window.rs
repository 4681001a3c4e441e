use std::fmt;

use chrono::DateTime;

use crate::error::{AppError, Result};

/// Half-open `[from, to)` range of epoch seconds requested in one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: i64,
    pub to: i64,
}

impl Window {
    pub fn span_seconds(&self) -> i64 {
        self.to - self.from
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            DateTime::from_timestamp(self.from, 0),
            DateTime::from_timestamp(self.to, 0),
        ) {
            (Some(from), Some(to)) => write!(
                f,
                "[{}, {})",
                from.format("%Y-%m-%d %H:%M:%S"),
                to.format("%Y-%m-%d %H:%M:%S")
            ),
            _ => write!(f, "[{}, {})", self.from, self.to),
        }
    }
}

/// Lazy sequence of contiguous windows produced by [`plan`].
#[derive(Debug, Clone)]
pub struct WindowPlan {
    cursor: i64,
    end: i64,
    span: i64,
}

impl Iterator for WindowPlan {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.cursor >= self.end {
            return None;
        }

        let to = self.cursor.saturating_add(self.span).min(self.end);
        let window = Window {
            from: self.cursor,
            to,
        };
        self.cursor = to;
        Some(window)
    }
}

/// Tile `[start_epoch, end_epoch)` with windows holding at most `max_batch_size` candles each.
pub fn plan(
    start_epoch: i64,
    end_epoch: i64,
    step_seconds: i64,
    max_batch_size: u32,
) -> Result<WindowPlan> {
    if step_seconds <= 0 {
        return Err(AppError::InvalidGranularity(step_seconds));
    }
    if max_batch_size == 0 {
        return Err(AppError::InvalidBatchSize);
    }

    Ok(WindowPlan {
        cursor: start_epoch,
        end: end_epoch,
        span: step_seconds.saturating_mul(i64::from(max_batch_size)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(windows: &[Window], start: i64, end: i64, max_span: i64) {
        assert_eq!(windows.first().map(|w| w.from), Some(start));
        assert_eq!(windows.last().map(|w| w.to), Some(end));
        for pair in windows.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        for window in windows {
            assert!(window.from < window.to);
            assert!(window.span_seconds() <= max_span);
        }
    }

    #[test]
    fn tiles_range_without_gaps_or_overlap() {
        let cases = [
            (0, 10_000, 60, 7),
            (1_672_531_200, 1_704_067_200, 3_600, 999),
            (100, 101, 5, 1),
            (0, 9_990, 10, 999),
            (-500, 500, 1, 3),
        ];

        for (start, end, step, batch) in cases {
            let windows: Vec<_> = plan(start, end, step, batch).unwrap().collect();
            assert_tiles(&windows, start, end, step * i64::from(batch));
        }
    }

    #[test]
    fn exact_multiple_produces_no_trailing_window() {
        let windows: Vec<_> = plan(0, 3_000, 10, 100).unwrap().collect();
        assert_eq!(
            windows,
            vec![
                Window { from: 0, to: 1_000 },
                Window { from: 1_000, to: 2_000 },
                Window { from: 2_000, to: 3_000 },
            ]
        );
    }

    #[test]
    fn replanning_is_idempotent() {
        let first: Vec<_> = plan(0, 123_457, 300, 999).unwrap().collect();
        let second: Vec<_> = plan(0, 123_457, 300, 999).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_or_inverted_range_yields_nothing() {
        assert_eq!(plan(50, 50, 60, 999).unwrap().count(), 0);
        assert_eq!(plan(100, 50, 60, 999).unwrap().count(), 0);
    }

    #[test]
    fn rejects_non_positive_step_and_zero_batch() {
        assert!(matches!(
            plan(0, 100, 0, 999),
            Err(AppError::InvalidGranularity(0))
        ));
        assert!(matches!(
            plan(0, 100, -60, 999),
            Err(AppError::InvalidGranularity(-60))
        ));
        assert!(matches!(plan(0, 100, 60, 0), Err(AppError::InvalidBatchSize)));
    }

    #[test]
    fn one_day_of_hours_fits_one_window() {
        let windows: Vec<_> = plan(1_672_531_200, 1_672_617_600, 3_600, 999)
            .unwrap()
            .collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].span_seconds(), 24 * 3_600);
    }

    #[test]
    fn display_uses_utc_timestamps() {
        let window = Window {
            from: 1_672_531_200,
            to: 1_672_534_800,
        };
        assert_eq!(
            window.to_string(),
            "[2023-01-01 00:00:00, 2023-01-01 01:00:00)"
        );
    }
}
