// ThingSpeak channel feed repository implementation
use crate::application::feed_repository::FeedRepository;
use crate::domain::device::Channel;
use crate::domain::table::TimeSeriesTable;
use crate::infrastructure::feed_csv::parse_feed_csv;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::FixedOffset;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ThingSpeakRepository {
    base_url: String,
    zone: FixedOffset,
    client: reqwest::Client,
}

impl ThingSpeakRepository {
    pub fn new(base_url: String, zone: FixedOffset, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            zone,
            client,
        })
    }

    fn build_feed_url(&self, channel: &Channel, results: usize) -> String {
        let mut url = format!(
            "{}/channels/{}/feeds.csv?results={}",
            self.base_url, channel.id, results
        );
        if let Some(key) = &channel.read_key {
            url.push_str("&api_key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

#[async_trait]
impl FeedRepository for ThingSpeakRepository {
    async fn fetch_feed(&self, channel: &Channel, results: usize) -> Result<TimeSeriesTable> {
        let url = self.build_feed_url(channel, results);
        tracing::debug!("Fetching {} results from channel {}", results, channel.id);

        let response = self
            .client
            .get(&url)
            .header("Accept", "text/csv")
            .send()
            .await
            .with_context(|| format!("Failed to send request for channel {}", channel.id))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Feed request for channel {} failed with status {}: {}",
                channel.id,
                status,
                body
            );
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read feed body for channel {}", channel.id))?;

        let table = parse_feed_csv(&body, self.zone, &channel.fields)
            .with_context(|| format!("Malformed feed for channel {}", channel.id))?;

        tracing::debug!(
            "Channel {} returned {} rows across {} fields",
            channel.id,
            table.len(),
            table.columns().len()
        );

        Ok(table)
    }
}
