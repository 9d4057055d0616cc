use crate::application::growth_service::PipelineSettings;
use crate::domain::device::{
    Channel, Device, DeviceCatalog, DeviceIndex, MAX_FIELDS, TEMPERATURE_FIELDS,
};
use crate::domain::growth::Window;
use crate::domain::retention::{RetentionPolicy, DEFAULT_HORIZON_MINUTES, DEFAULT_STRIDE};
use crate::domain::tube::{DEFAULT_OFFSET, DEFAULT_TARGET};
use anyhow::ensure;
use chrono::{FixedOffset, TimeDelta};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub prediction: PredictionSettings,
    pub channels: ChannelsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedSettings {
    pub base_url: String,
    pub utc_offset_minutes: i32,
    pub timeout_secs: u64,
    pub od_results: usize,
    pub temperature_results: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.thingspeak.com".to_string(),
            utc_offset_minutes: -300,
            timeout_secs: 30,
            od_results: 8000,
            temperature_results: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetentionSettings {
    pub horizon_minutes: i64,
    pub stride: usize,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            horizon_minutes: DEFAULT_HORIZON_MINUTES,
            stride: DEFAULT_STRIDE,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PredictionSettings {
    pub window: [f64; 2],
    pub default_target: f64,
    pub default_offset: f64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        let window = Window::default();
        Self {
            window: [window.start, window.end],
            default_target: DEFAULT_TARGET,
            default_offset: DEFAULT_OFFSET,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelsConfig {
    pub od: Vec<OdChannelConfig>,
    pub temperature: ChannelConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OdChannelConfig {
    pub id: u64,
    pub name: Option<String>,
    pub read_key: Option<String>,
    #[serde(default = "default_od_fields")]
    pub fields: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub id: u64,
    pub read_key: Option<String>,
}

fn default_od_fields() -> usize {
    MAX_FIELDS
}

impl DashboardConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.channels.od.is_empty(), "at least one OD channel is required");
        ensure!(
            self.channels.od.len() * 2 <= TEMPERATURE_FIELDS,
            "the temperature channel serves at most {} devices",
            TEMPERATURE_FIELDS / 2
        );
        for channel in &self.channels.od {
            ensure!(
                (1..=MAX_FIELDS).contains(&channel.fields),
                "channel {} declares {} fields, expected 1 to {}",
                channel.id,
                channel.fields,
                MAX_FIELDS
            );
        }
        ensure!(self.retention.stride >= 1, "retention stride must be at least 1");
        ensure!(self.retention.horizon_minutes > 0, "retention horizon must be positive");
        self.horizon()?;
        ensure!(
            self.prediction.window[0] < self.prediction.window[1],
            "prediction window start must be before its end"
        );
        ensure!(self.feed.od_results > 0, "od_results must be positive");
        ensure!(self.feed.temperature_results > 0, "temperature_results must be positive");
        self.zone()?;
        Ok(())
    }

    pub fn zone(&self) -> anyhow::Result<FixedOffset> {
        self.feed
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow::anyhow!("invalid UTC offset of {} minutes", self.feed.utc_offset_minutes)
            })
    }

    pub fn horizon(&self) -> anyhow::Result<TimeDelta> {
        TimeDelta::try_minutes(self.retention.horizon_minutes).ok_or_else(|| {
            anyhow::anyhow!(
                "retention horizon of {} minutes is out of range",
                self.retention.horizon_minutes
            )
        })
    }

    pub fn catalog(&self) -> DeviceCatalog {
        let devices = self
            .channels
            .od
            .iter()
            .enumerate()
            .map(|(index, c)| {
                Device::new(
                    DeviceIndex::new(index),
                    c.name.clone(),
                    Channel::new(c.id, c.read_key.clone(), c.fields),
                )
            })
            .collect();
        let temperature = &self.channels.temperature;
        DeviceCatalog::new(
            devices,
            Channel::new(temperature.id, temperature.read_key.clone(), TEMPERATURE_FIELDS),
        )
    }

    pub fn pipeline_settings(&self) -> anyhow::Result<PipelineSettings> {
        Ok(PipelineSettings {
            zone: self.zone()?,
            retention: RetentionPolicy::new(self.horizon()?, self.retention.stride),
            od_results: self.feed.od_results,
            temperature_results: self.feed.temperature_results,
            window: Window::new(self.prediction.window[0], self.prediction.window[1]),
            default_target: self.prediction.default_target,
            default_offset: self.prediction.default_offset,
        })
    }
}

/// Load `config/dashboard.*`, then apply `IODR__SECTION__KEY` environment overrides
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(config::Environment::with_prefix("IODR").separator("__"))
        .build()?;

    let dashboard: DashboardConfig = settings.try_deserialize()?;
    dashboard.validate()?;
    Ok(dashboard)
}
