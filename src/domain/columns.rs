// Column mapping - tube labels and per-device temperature subsets
use super::device::{field_name, DeviceIndex};
use super::table::TimeSeriesTable;
use std::collections::HashSet;
use thiserror::Error;

pub const TEMP_INTERIOR: &str = "Temp Int";
pub const TEMP_EXTERIOR: &str = "Temp Ext";

#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("expected {expected} column names, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("column name '{0}' is used more than once")]
    DuplicateName(String),
    #[error("column '{0}' is not present in the table")]
    MissingColumn(String),
    #[error("column index {index} is out of range for {count} columns")]
    ColumnOutOfRange { index: usize, count: usize },
}

/// Relabel columns positionally. The names list must match the table's width
/// and contain no repeats.
pub fn rename_columns<S: AsRef<str>>(
    table: &TimeSeriesTable,
    names: &[S],
) -> Result<TimeSeriesTable, MappingError> {
    if names.len() != table.columns().len() {
        return Err(MappingError::LengthMismatch {
            expected: table.columns().len(),
            found: names.len(),
        });
    }

    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_ref()) {
            return Err(MappingError::DuplicateName(name.as_ref().to_string()));
        }
    }

    Ok(table.with_columns(names.iter().map(|n| n.as_ref().to_string()).collect()))
}

/// Interior and exterior field names for a device on the shared temperature channel
pub fn temperature_fields(device: DeviceIndex) -> [String; 2] {
    let base = device.get() * 2;
    [field_name(base + 1), field_name(base + 2)]
}

/// Select the device's sensor pair from the combined temperature feed
pub fn temperature_for_device(
    table: &TimeSeriesTable,
    device: DeviceIndex,
) -> Result<TimeSeriesTable, MappingError> {
    let indices = temperature_fields(device)
        .into_iter()
        .map(|field| table.column_index(&field).ok_or(MappingError::MissingColumn(field)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(table.select(
        &indices,
        vec![TEMP_INTERIOR.to_string(), TEMP_EXTERIOR.to_string()],
    ))
}
