// Device snapshot - the tables produced by one refresh
use super::device::DeviceIndex;
use super::table::TimeSeriesTable;
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub device: DeviceIndex,
    pub fetched_at: DateTime<FixedOffset>,
    /// Every fetched OD row, for export
    pub od_full: TimeSeriesTable,
    pub od: TimeSeriesTable,
    pub temperature: TimeSeriesTable,
}

impl DeviceSnapshot {
    pub fn new(
        device: DeviceIndex,
        fetched_at: DateTime<FixedOffset>,
        od_full: TimeSeriesTable,
        od: TimeSeriesTable,
        temperature: TimeSeriesTable,
    ) -> Self {
        Self {
            device,
            fetched_at,
            od_full,
            od,
            temperature,
        }
    }
}
