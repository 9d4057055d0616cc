// Repository trait for channel feed access
use crate::domain::device::Channel;
use crate::domain::table::TimeSeriesTable;
use async_trait::async_trait;

#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Fetch the most recent `results` entries of a channel's feed, one column
    /// per declared field, timestamps in the configured zone
    async fn fetch_feed(&self, channel: &Channel, results: usize) -> anyhow::Result<TimeSeriesTable>;
}
