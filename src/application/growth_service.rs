// Growth service - Use cases for refreshing device tables and predicting growth
use crate::application::feed_repository::FeedRepository;
use crate::domain::columns::{rename_columns, temperature_for_device, MappingError};
use crate::domain::device::{DeviceCatalog, DeviceIndex};
use crate::domain::estimate::{estimate, project, Estimate, ProjectionPoint};
use crate::domain::growth::{format_ln_data, predict_curve, GrowthFit, LogSeries, Window};
use crate::domain::retention::RetentionPolicy;
use crate::domain::snapshot::DeviceSnapshot;
use crate::domain::tube::{TubeReport, TubeSettings};
use anyhow::Context;
use chrono::{FixedOffset, Utc};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub zone: FixedOffset,
    pub retention: RetentionPolicy,
    pub od_results: usize,
    pub temperature_results: usize,
    pub window: Window,
    pub default_target: f64,
    pub default_offset: f64,
}

#[derive(Debug, Clone)]
pub struct GrowthCurve {
    pub label: String,
    pub series: LogSeries,
    pub fit: GrowthFit,
    pub estimate: Estimate,
    /// Fitted line from the window start out to the target crossing
    pub projection: Vec<ProjectionPoint>,
}

#[derive(Clone)]
pub struct GrowthService {
    repository: Arc<dyn FeedRepository>,
    catalog: Arc<DeviceCatalog>,
    settings: PipelineSettings,
}

impl GrowthService {
    pub fn new(
        repository: Arc<dyn FeedRepository>,
        catalog: Arc<DeviceCatalog>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            repository,
            catalog,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fetch the device's OD feed and the shared temperature feed, thin both and
    /// split out the device's temperature sensors.
    pub async fn refresh(
        &self,
        device: DeviceIndex,
        results: Option<usize>,
    ) -> anyhow::Result<DeviceSnapshot> {
        let od_channel = &self
            .catalog
            .get(device)
            .with_context(|| format!("Unknown device index {}", device.get()))?
            .channel;
        let temperature_channel = self.catalog.temperature();
        let od_results = results.unwrap_or(self.settings.od_results);

        let (od_full, temperature_feed) = futures::try_join!(
            self.repository.fetch_feed(od_channel, od_results),
            self.repository
                .fetch_feed(temperature_channel, self.settings.temperature_results),
        )
        .with_context(|| format!("Failed to fetch feeds for device {}", device.number()))?;

        let temperature = temperature_for_device(&temperature_feed, device)
            .context("Temperature feed is missing the device's sensor fields")?;

        let od = self.settings.retention.apply(&od_full);
        let temperature = self.settings.retention.apply(&temperature);

        tracing::info!(
            "Refreshed device {}: {} OD rows ({} retained, {:?} to {:?}), {} temperature rows retained",
            device.number(),
            od_full.len(),
            od.len(),
            od.first_time(),
            od.last_time(),
            temperature.len()
        );

        let fetched_at = Utc::now().with_timezone(&od_full.zone());
        Ok(DeviceSnapshot::new(device, fetched_at, od_full, od, temperature))
    }

    /// Label the snapshot's tubes and estimate when each reaches its target.
    /// An empty `tubes` slice uses default settings for every column.
    pub fn estimate_tubes(
        &self,
        snapshot: &DeviceSnapshot,
        tubes: &[TubeSettings],
        window: Option<Window>,
    ) -> Result<Vec<TubeReport>, MappingError> {
        let defaults = vec![TubeSettings::default(); snapshot.od.columns().len()];
        let tubes = if tubes.is_empty() { &defaults[..] } else { tubes };

        let labels: Vec<String> = tubes
            .iter()
            .enumerate()
            .map(|(index, tube)| tube.label(index))
            .collect();
        let labelled = rename_columns(&snapshot.od, &labels)?;
        let window = window.unwrap_or(self.settings.window);

        tubes
            .iter()
            .enumerate()
            .map(|(index, tube)| {
                let offset = tube.offset.unwrap_or(self.settings.default_offset);
                let target = tube.target.unwrap_or(self.settings.default_target);

                let series = format_ln_data(&labelled, index, offset)?;
                let fit = predict_curve(&series, window);
                let estimate = estimate(&fit, target);

                Ok(TubeReport {
                    index,
                    label: series.column,
                    offset,
                    fit,
                    estimate,
                })
            })
            .collect()
    }

    /// Log series, fit, estimate and target projection for a single tube
    pub fn growth_curve(
        &self,
        snapshot: &DeviceSnapshot,
        tube: usize,
        settings: &TubeSettings,
        window: Option<Window>,
    ) -> Result<GrowthCurve, MappingError> {
        let offset = settings.offset.unwrap_or(self.settings.default_offset);
        let target = settings.target.unwrap_or(self.settings.default_target);

        let series = format_ln_data(&snapshot.od, tube, offset)?;
        let fit = predict_curve(&series, window.unwrap_or(self.settings.window));
        let estimate = estimate(&fit, target);
        let projection = project(&fit, target);

        Ok(GrowthCurve {
            label: settings.label(tube),
            series,
            fit,
            estimate,
            projection,
        })
    }
}
