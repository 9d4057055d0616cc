// Shared fixtures for pipeline tests
use super::table::{Row, TimeSeriesTable};
use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};

pub fn zone() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

/// `2024-01-01T00:00:00` in the test zone plus `hours`
pub fn at(hours: f64) -> DateTime<FixedOffset> {
    let origin = zone().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    origin + TimeDelta::milliseconds((hours * 3_600_000.0).round() as i64)
}

pub fn field_names(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("field{}", n)).collect()
}

/// `rows` samples spaced `spacing_secs` apart starting at `at(0.0)`;
/// `value(row, column)` supplies each cell.
pub fn table_from_fn<F>(columns: usize, rows: usize, spacing_secs: i64, value: F) -> TimeSeriesTable
where
    F: Fn(usize, usize) -> Option<f64>,
{
    let origin = at(0.0);
    let rows = (0..rows)
        .map(|r| {
            let time = origin + TimeDelta::seconds(spacing_secs * r as i64);
            Row::new(time, (0..columns).map(|c| value(r, c)).collect())
        })
        .collect();
    TimeSeriesTable::new(zone(), field_names(columns), rows).unwrap()
}
