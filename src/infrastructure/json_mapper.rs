// Mapper to convert domain models to JSON response bodies
use crate::application::growth_service::GrowthCurve;
use crate::domain::device::Device;
use crate::domain::growth::{hours_between, GrowthFit, LinearFit};
use crate::domain::snapshot::DeviceSnapshot;
use crate::domain::table::TimeSeriesTable;
use crate::domain::tube::TubeReport;
use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeviceBody {
    pub index: usize,
    pub name: String,
    pub channel_id: u64,
    pub fields: usize,
}

#[derive(Debug, Serialize)]
pub struct TableBody {
    pub columns: Vec<String>,
    pub rows: Vec<RowBody>,
}

#[derive(Debug, Serialize)]
pub struct RowBody {
    pub time: String,
    pub time_ms: i64,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotBody {
    pub device: usize,
    pub fetched_at: String,
    pub full_rows: usize,
    pub od: TableBody,
    pub temperature: TableBody,
}

#[derive(Debug, Serialize)]
pub struct LineBody {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_err: f64,
    pub points: usize,
}

#[derive(Debug, Serialize)]
pub struct FitBody {
    pub origin: Option<String>,
    pub last_time_point: f64,
    pub window: [f64; 2],
    pub line: Option<LineBody>,
}

#[derive(Debug, Serialize)]
pub struct TubeReportBody {
    pub index: usize,
    pub name: String,
    pub target: f64,
    pub offset: f64,
    pub estimate: String,
    pub estimate_time: Option<String>,
    pub confidence: f64,
    pub reliable: bool,
    pub fit: FitBody,
}

#[derive(Debug, Serialize)]
pub struct LogPointBody {
    pub time: String,
    pub hours: f64,
    pub od: f64,
    pub ln_od: f64,
    /// Fitted lnOD at this point, when a line was fitted
    pub fitted: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectionBody {
    pub time: Option<String>,
    pub hours: f64,
    pub ln_od: f64,
    pub od: f64,
}

#[derive(Debug, Serialize)]
pub struct GrowthCurveBody {
    pub tube: String,
    pub column: String,
    pub offset: f64,
    pub target: f64,
    pub estimate: String,
    pub estimate_time: Option<String>,
    pub confidence: f64,
    pub points: Vec<LogPointBody>,
    pub projection: Vec<ProjectionBody>,
    pub fit: FitBody,
}

fn time_to_string(time: DateTime<FixedOffset>) -> String {
    time.to_rfc3339()
}

fn time_at_hours(origin: DateTime<FixedOffset>, hours: f64) -> Option<DateTime<FixedOffset>> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64).and_then(|delta| origin.checked_add_signed(delta))
}

pub fn device_to_json(device: &Device) -> DeviceBody {
    DeviceBody {
        index: device.index.get(),
        name: device.name.clone(),
        channel_id: device.channel.id,
        fields: device.channel.fields.len(),
    }
}

pub fn table_to_json(table: &TimeSeriesTable) -> TableBody {
    TableBody {
        columns: table.columns().to_vec(),
        rows: table
            .rows()
            .iter()
            .map(|row| RowBody {
                time: time_to_string(row.time),
                time_ms: row.time.timestamp_millis(),
                values: row.values.clone(),
            })
            .collect(),
    }
}

pub fn snapshot_to_json(snapshot: &DeviceSnapshot) -> SnapshotBody {
    SnapshotBody {
        device: snapshot.device.get(),
        fetched_at: time_to_string(snapshot.fetched_at),
        full_rows: snapshot.od_full.len(),
        od: table_to_json(&snapshot.od),
        temperature: table_to_json(&snapshot.temperature),
    }
}

fn line_to_json(line: &LinearFit) -> LineBody {
    LineBody {
        slope: line.slope,
        intercept: line.intercept,
        r: line.r,
        r_squared: line.r_squared(),
        p_value: line.p_value,
        std_err: line.std_err,
        points: line.points,
    }
}

pub fn fit_to_json(fit: &GrowthFit) -> FitBody {
    FitBody {
        origin: fit.origin.map(time_to_string),
        last_time_point: fit.last_time_point,
        window: [fit.window.start, fit.window.end],
        line: fit.line.as_ref().map(line_to_json),
    }
}

pub fn report_to_json(report: &TubeReport) -> TubeReportBody {
    TubeReportBody {
        index: report.index,
        name: report.label.clone(),
        target: report.estimate.target,
        offset: report.offset,
        estimate: report.estimate.display(),
        estimate_time: report.estimate.crossing.time().map(time_to_string),
        confidence: report.estimate.confidence,
        reliable: report.estimate.is_reliable(),
        fit: fit_to_json(&report.fit),
    }
}

pub fn curve_to_json(curve: &GrowthCurve) -> GrowthCurveBody {
    let origin = curve.series.origin();
    GrowthCurveBody {
        tube: curve.label.clone(),
        column: curve.series.column.clone(),
        offset: curve.series.offset,
        target: curve.estimate.target,
        estimate: curve.estimate.display(),
        estimate_time: curve.estimate.crossing.time().map(time_to_string),
        confidence: curve.estimate.confidence,
        points: curve
            .series
            .points
            .iter()
            .map(|p| {
                let hours = origin.map(|o| hours_between(o, p.time)).unwrap_or(0.0);
                LogPointBody {
                    time: time_to_string(p.time),
                    hours,
                    od: p.od,
                    ln_od: p.ln_od,
                    fitted: curve.fit.line.as_ref().map(|line| line.predict(hours)),
                }
            })
            .collect(),
        projection: curve
            .projection
            .iter()
            .map(|p| ProjectionBody {
                time: origin
                    .and_then(|o| time_at_hours(o, p.hours))
                    .map(time_to_string),
                hours: p.hours,
                ln_od: p.ln_od,
                od: p.od,
            })
            .collect(),
        fit: fit_to_json(&curve.fit),
    }
}
