// Channel feed CSV decoding
use crate::domain::table::{Row, TableError, TimeSeriesTable};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use thiserror::Error;

pub const TIMESTAMP_COLUMN: &str = "created_at";

#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("feed is empty, expected a header row")]
    MissingHeader,
    #[error("feed header has no 'created_at' column")]
    MissingTimestampColumn,
    #[error("line {line}: {found} cells, header has {expected}")]
    RowWidth {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("line {line}: unparseable timestamp '{value}'")]
    Timestamp { line: usize, value: String },
    #[error("line {line}: unparseable value '{value}' in column '{column}'")]
    Value {
        line: usize,
        column: String,
        value: String,
    },
    #[error("unterminated quoted cell on line {0}")]
    UnterminatedQuote(usize),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Decode a `feeds.csv` body into a table with one column per entry of
/// `fields`. Columns outside `fields` (entry id, status, location) are
/// dropped; declared fields absent from the feed come back as missing values.
/// Any malformed row rejects the whole body.
pub fn parse_feed_csv(
    body: &str,
    zone: FixedOffset,
    fields: &[String],
) -> Result<TimeSeriesTable, FeedError> {
    let mut lines = body
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines.next().ok_or(FeedError::MissingHeader)?;
    let header = split_cells(header, header_line)?;
    let time_idx = header
        .iter()
        .position(|c| c == TIMESTAMP_COLUMN)
        .ok_or(FeedError::MissingTimestampColumn)?;

    let field_idx: Vec<Option<usize>> = fields
        .iter()
        .map(|field| header.iter().position(|c| c == field))
        .collect();
    for (field, idx) in fields.iter().zip(&field_idx) {
        if idx.is_none() {
            tracing::warn!("Feed has no '{}' column, treating it as empty", field);
        }
    }

    let mut rows = Vec::new();
    for (line, text) in lines {
        let cells = split_cells(text, line)?;
        if cells.len() != header.len() {
            return Err(FeedError::RowWidth {
                line,
                found: cells.len(),
                expected: header.len(),
            });
        }

        let time = parse_timestamp(&cells[time_idx]).ok_or_else(|| FeedError::Timestamp {
            line,
            value: cells[time_idx].clone(),
        })?;

        let values = field_idx
            .iter()
            .zip(fields)
            .map(|(idx, field)| match idx {
                Some(i) => parse_value(&cells[*i]).map_err(|_| FeedError::Value {
                    line,
                    column: field.clone(),
                    value: cells[*i].clone(),
                }),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(Row::new(time, values));
    }

    Ok(TimeSeriesTable::new(zone, fields.to_vec(), rows)?)
}

/// Accepts the provider's `2021-10-27 14:03:05 UTC` form as well as RFC 3339
fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Some(naive) = value.strip_suffix(" UTC") {
        return NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|t| t.and_utc().fixed_offset());
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
}

/// Empty cells and non-finite numbers are missing values
fn parse_value(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell.parse()?;
    Ok(value.is_finite().then_some(value))
}

/// Split one CSV record, honouring double-quoted cells with `""` escapes
fn split_cells(line: &str, line_no: usize) -> Result<Vec<String>, FeedError> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            ('"', true) => quoted = false,
            ('"', false) if cell.is_empty() => quoted = true,
            (',', false) => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    if quoted {
        return Err(FeedError::UnterminatedQuote(line_no));
    }
    cells.push(cell);
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::Channel;
    use chrono::TimeZone;

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn fields(n: usize) -> Vec<String> {
        Channel::new(1, None, n).fields
    }

    const FEED: &str = "created_at,entry_id,field1,field2,field3\n\
        2021-10-27 14:00:00 UTC,101,0.101,0.202,\n\
        2021-10-27 14:01:00 UTC,102,0.111,0.212,0.5\n\
        2021-10-27 14:02:00 UTC,103,0.121,,0.6\n";

    #[test]
    fn test_parse_feed() {
        let table = parse_feed_csv(FEED, eastern(), &fields(3)).unwrap();

        assert_eq!(table.columns(), ["field1", "field2", "field3"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].values, vec![Some(0.101), Some(0.202), None]);
        assert_eq!(table.rows()[2].values, vec![Some(0.121), None, Some(0.6)]);

        let first = table.first_time().unwrap();
        assert_eq!(first, eastern().with_ymd_and_hms(2021, 10, 27, 9, 0, 0).unwrap());
        assert_eq!(first.offset(), &eastern());
    }

    #[test]
    fn test_declared_fields_select_columns() {
        let table = parse_feed_csv(FEED, eastern(), &fields(1)).unwrap();
        assert_eq!(table.columns(), ["field1"]);

        // field4 is declared but the channel never reported it
        let table = parse_feed_csv(FEED, eastern(), &fields(4)).unwrap();
        assert!(table.column(3).unwrap().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_rfc3339_timestamps_and_sorting() {
        let body = "created_at,entry_id,field1\n\
            2024-01-01T00:10:00Z,2,2.0\n\
            2024-01-01T00:00:00+00:00,1,1.0\n";
        let table = parse_feed_csv(body, eastern(), &fields(1)).unwrap();

        let values: Vec<_> = table.column(0).unwrap().map(|(_, v)| v).collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_metadata_columns_and_quotes() {
        let body = "created_at,entry_id,field1,status\r\n\
            2024-01-01 00:00:00 UTC,1,0.3,\"ok, \"\"warm\"\"\"\r\n";
        let table = parse_feed_csv(body, eastern(), &fields(1)).unwrap();
        assert_eq!(table.rows()[0].values, vec![Some(0.3)]);
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let body = "created_at,entry_id,field1\n2024-01-01 00:00:00 UTC,1,nan\n";
        let table = parse_feed_csv(body, eastern(), &fields(1)).unwrap();
        assert_eq!(table.rows()[0].values, vec![None]);
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = parse_feed_csv("created_at,entry_id,field1\n", eastern(), &fields(1)).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_malformed_feeds_rejected() {
        assert_eq!(
            parse_feed_csv("", eastern(), &fields(1)).unwrap_err(),
            FeedError::MissingHeader
        );
        assert_eq!(
            parse_feed_csv("time,field1\n", eastern(), &fields(1)).unwrap_err(),
            FeedError::MissingTimestampColumn
        );

        let short_row = "created_at,entry_id,field1\n2024-01-01 00:00:00 UTC,1\n";
        assert_eq!(
            parse_feed_csv(short_row, eastern(), &fields(1)).unwrap_err(),
            FeedError::RowWidth {
                line: 2,
                found: 2,
                expected: 3
            }
        );

        let bad_time = "created_at,entry_id,field1\nyesterday,1,0.1\n";
        assert!(matches!(
            parse_feed_csv(bad_time, eastern(), &fields(1)),
            Err(FeedError::Timestamp { line: 2, .. })
        ));

        let bad_value = "created_at,entry_id,field1\n\
            2024-01-01 00:00:00 UTC,1,0.1\n\
            2024-01-01 00:01:00 UTC,2,cloudy\n";
        assert!(matches!(
            parse_feed_csv(bad_value, eastern(), &fields(1)),
            Err(FeedError::Value { line: 3, .. })
        ));

        let open_quote = "created_at,entry_id,field1\n\"2024-01-01 00:00:00 UTC,1,0.1\n";
        assert_eq!(
            parse_feed_csv(open_quote, eastern(), &fields(1)).unwrap_err(),
            FeedError::UnterminatedQuote(2)
        );
    }
}
