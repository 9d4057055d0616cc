// Time-indexed telemetry table
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("row at {time} has {found} values, expected {expected}")]
    RowWidth {
        time: String,
        found: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub time: DateTime<FixedOffset>,
    pub values: Vec<Option<f64>>,
}

impl Row {
    pub fn new(time: DateTime<FixedOffset>, values: Vec<Option<f64>>) -> Self {
        Self { time, values }
    }
}

/// Rows sorted ascending by timestamp with unique timestamps, all expressed in
/// the table's zone. Every transformation returns a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    zone: FixedOffset,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TimeSeriesTable {
    /// Build a table, normalizing timestamps into `zone`, sorting, and keeping
    /// the later entry when two rows share a timestamp.
    pub fn new(zone: FixedOffset, columns: Vec<String>, rows: Vec<Row>) -> Result<Self, TableError> {
        let width = columns.len();
        let mut rows = rows
            .into_iter()
            .map(|row| {
                if row.values.len() != width {
                    return Err(TableError::RowWidth {
                        time: row.time.to_rfc3339(),
                        found: row.values.len(),
                        expected: width,
                    });
                }
                Ok(Row::new(row.time.with_timezone(&zone), row.values))
            })
            .collect::<Result<Vec<_>, _>>()?;

        rows.sort_by_key(|row| row.time);

        let mut unique: Vec<Row> = Vec::with_capacity(rows.len());
        for row in rows {
            match unique.last_mut() {
                Some(last) if last.time == row.time => *last = row,
                _ => unique.push(row),
            }
        }

        Ok(Self {
            zone,
            columns,
            rows: unique,
        })
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_time(&self) -> Option<DateTime<FixedOffset>> {
        self.rows.first().map(|row| row.time)
    }

    pub fn last_time(&self) -> Option<DateTime<FixedOffset>> {
        self.rows.last().map(|row| row.time)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column paired with their timestamps
    pub fn column(
        &self,
        index: usize,
    ) -> Option<impl Iterator<Item = (DateTime<FixedOffset>, Option<f64>)> + '_> {
        if index >= self.columns.len() {
            return None;
        }
        Some(self.rows.iter().map(move |row| (row.time, row.values[index])))
    }

    /// Same rows, new labels. Callers guarantee `columns` has the table's width.
    pub(crate) fn with_columns(&self, columns: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), self.columns.len());
        Self {
            zone: self.zone,
            columns,
            rows: self.rows.clone(),
        }
    }

    /// Same columns, a subset of rows. Callers keep the rows in order.
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            zone: self.zone,
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Project onto the given column indices (all in range).
    pub(crate) fn select(&self, indices: &[usize], labels: Vec<String>) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| Row::new(row.time, indices.iter().map(|&i| row.values[i]).collect()))
            .collect();
        Self {
            zone: self.zone,
            columns: labels,
            rows,
        }
    }
}
