// Retention thinning - full density near the head, strided history behind it
use super::table::{Row, TimeSeriesTable};
use chrono::TimeDelta;

pub const DEFAULT_HORIZON_MINUTES: i64 = 120;
pub const DEFAULT_STRIDE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    horizon: TimeDelta,
    stride: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(DEFAULT_HORIZON_MINUTES), DEFAULT_STRIDE)
    }
}

impl RetentionPolicy {
    pub fn new(horizon: TimeDelta, stride: usize) -> Self {
        Self {
            horizon,
            stride: stride.max(1),
        }
    }

    pub fn horizon(&self) -> TimeDelta {
        self.horizon
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Keep every row newer than `last - horizon`; of the rows at or before
    /// that cutoff keep the 1st, (stride+1)th, ... in chronological order.
    pub fn apply(&self, table: &TimeSeriesTable) -> TimeSeriesTable {
        let Some(last) = table.last_time() else {
            return table.clone();
        };
        let Some(cutoff) = last.checked_sub_signed(self.horizon) else {
            return table.clone();
        };

        let rows = table.rows();
        let split = rows.partition_point(|row| row.time <= cutoff);
        let (older, recent) = rows.split_at(split);

        let retained: Vec<Row> = older
            .iter()
            .step_by(self.stride)
            .chain(recent.iter())
            .cloned()
            .collect();

        tracing::debug!(
            "Retention kept {} of {} rows ({} recent, cutoff {})",
            retained.len(),
            rows.len(),
            recent.len(),
            cutoff
        );

        table.with_rows(retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{at, table_from_fn};

    // 3000 samples 36s apart: 30 hours of data
    fn long_run() -> TimeSeriesTable {
        table_from_fn(2, 3000, 36, |r, c| Some((r * 10 + c) as f64))
    }

    #[test]
    fn test_recent_rows_kept_at_full_density() {
        let table = long_run();
        let retained = RetentionPolicy::default().apply(&table);
        let cutoff = table.last_time().unwrap() - TimeDelta::hours(2);

        let original_recent: Vec<_> = table.rows().iter().filter(|r| r.time > cutoff).collect();
        let retained_recent: Vec<_> = retained.rows().iter().filter(|r| r.time > cutoff).collect();
        assert_eq!(original_recent, retained_recent);
        assert_eq!(retained_recent.len(), 200);
    }

    #[test]
    fn test_older_rows_thinned_by_stride() {
        let table = long_run();
        let retained = RetentionPolicy::default().apply(&table);
        let cutoff = table.last_time().unwrap() - TimeDelta::hours(2);

        let older: Vec<_> = table.rows().iter().filter(|r| r.time <= cutoff).collect();
        let expected: Vec<_> = older.iter().step_by(10).map(|r| (*r).clone()).collect();
        let kept: Vec<_> = retained
            .rows()
            .iter()
            .filter(|r| r.time <= cutoff)
            .cloned()
            .collect();

        assert_eq!(older.len(), 2800);
        assert_eq!(kept, expected);
        assert_eq!(retained.len(), 280 + 200);
    }

    #[test]
    fn test_order_preserved_without_duplicates() {
        let table = long_run();
        let retained = RetentionPolicy::default().apply(&table);

        assert!(retained.len() <= table.len());
        assert!(retained.rows().windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(retained.columns(), table.columns());
    }

    #[test]
    fn test_short_table_unchanged() {
        // 90 minutes of data
        let table = table_from_fn(1, 91, 60, |r, _| Some(r as f64));
        let retained = RetentionPolicy::default().apply(&table);
        assert_eq!(retained, table);
    }

    #[test]
    fn test_empty_table_unchanged() {
        let table = table_from_fn(3, 0, 60, |_, _| None);
        assert!(RetentionPolicy::default().apply(&table).is_empty());
    }

    #[test]
    fn test_configurable_horizon_and_stride() {
        // 10 hours of samples every 6 minutes
        let table = table_from_fn(1, 101, 360, |r, _| Some(r as f64));
        let policy = RetentionPolicy::new(TimeDelta::hours(1), 5);
        let retained = policy.apply(&table);

        // rows 0..=90 are at or before the cutoff, rows 91..=100 are recent
        assert_eq!(retained.len(), 19 + 10);
        assert_eq!(retained.first_time(), Some(at(0.0)));
        assert_eq!(retained.last_time(), table.last_time());
    }

    #[test]
    fn test_zero_stride_treated_as_one() {
        let policy = RetentionPolicy::new(TimeDelta::hours(2), 0);
        assert_eq!(policy.stride(), 1);
    }
}
