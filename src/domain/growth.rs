// Growth-curve fitting on log-transformed OD readings
use super::columns::MappingError;
use super::table::TimeSeriesTable;
use chrono::{DateTime, FixedOffset};
use statrs::distribution::{ContinuousCDF, StudentsT};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Fewer points than this never produce a line
pub const MIN_FIT_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct LogPoint {
    pub time: DateTime<FixedOffset>,
    pub od: f64,
    pub ln_od: f64,
}

/// One tube's readings with the offset applied and their natural log.
/// Rows whose log is not finite are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSeries {
    pub column: String,
    pub offset: f64,
    pub points: Vec<LogPoint>,
}

impl LogSeries {
    pub fn origin(&self) -> Option<DateTime<FixedOffset>> {
        self.points.first().map(|p| p.time)
    }
}

pub fn format_ln_data(
    table: &TimeSeriesTable,
    column_index: usize,
    offset: f64,
) -> Result<LogSeries, MappingError> {
    let column = table
        .columns()
        .get(column_index)
        .cloned()
        .ok_or(MappingError::ColumnOutOfRange {
            index: column_index,
            count: table.columns().len(),
        })?;

    let points: Vec<LogPoint> = table
        .column(column_index)
        .into_iter()
        .flatten()
        .filter_map(|(time, value)| {
            let od = value? + offset;
            let ln_od = od.ln();
            ln_od.is_finite().then_some(LogPoint { time, od, ln_od })
        })
        .collect();

    tracing::debug!(
        "Log series for '{}' (offset {}): {} of {} rows usable",
        column,
        offset,
        points.len(),
        table.len()
    );

    Ok(LogSeries {
        column,
        offset,
        points,
    })
}

/// Fit window in hours relative to the last sample, usually `[-n, 0]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(-2.0, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub p_value: f64,
    pub std_err: f64,
    pub points: usize,
}

impl LinearFit {
    /// Fitted lnOD at `hours` since the series origin
    pub fn predict(&self, hours: f64) -> f64 {
        self.slope * hours + self.intercept
    }

    pub fn r_squared(&self) -> f64 {
        self.r * self.r
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthFit {
    /// First timestamp of the series; hour zero of the fit axis
    pub origin: Option<DateTime<FixedOffset>>,
    pub last_time_point: f64,
    pub window: Window,
    /// `None` when fewer than three points fall inside the window
    pub line: Option<LinearFit>,
}

pub fn hours_between(origin: DateTime<FixedOffset>, time: DateTime<FixedOffset>) -> f64 {
    (time - origin).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

pub fn predict_curve(series: &LogSeries, window: Window) -> GrowthFit {
    let Some(origin) = series.origin() else {
        return GrowthFit {
            origin: None,
            last_time_point: 0.0,
            window,
            line: None,
        };
    };

    let elapsed: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|p| (hours_between(origin, p.time), p.ln_od))
        .collect();
    let last_time_point = elapsed.last().map(|(h, _)| *h).unwrap_or(0.0);

    let lower = last_time_point + window.start;
    let upper = last_time_point + window.end;
    let (xs, ys): (Vec<f64>, Vec<f64>) = elapsed
        .into_iter()
        .filter(|(h, ln_od)| *h > lower && *h < upper && ln_od.is_finite())
        .unzip();

    tracing::debug!(
        "Fitting '{}' over ({:.3}, {:.3}) h: {} points",
        series.column,
        lower,
        upper,
        xs.len()
    );

    let line = if xs.len() >= MIN_FIT_POINTS {
        least_squares(&xs, &ys)
    } else {
        None
    };

    GrowthFit {
        origin: Some(origin),
        last_time_point,
        window,
        line,
    }
}

/// Ordinary least squares of `ys` on `xs` with Pearson r, the two-sided
/// p-value for a zero slope and the slope's standard error.
fn least_squares(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len();
    if n < MIN_FIT_POINTS || n != ys.len() {
        return None;
    }

    let count = n as f64;
    let mean_x = xs.iter().sum::<f64>() / count;
    let mean_y = ys.iter().sum::<f64>() / count;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_xx == 0.0 {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;

    let denominator = (ss_xx * ss_yy).sqrt();
    let r = if denominator == 0.0 {
        0.0
    } else {
        (ss_xy / denominator).clamp(-1.0, 1.0)
    };

    let df = (n - 2) as f64;
    let r_squared = r * r;
    let std_err = ((1.0 - r_squared) * ss_yy / ss_xx / df).sqrt();
    let p_value = if r_squared >= 1.0 {
        0.0
    } else {
        let t_stat = r * (df / (1.0 - r_squared)).sqrt();
        match StudentsT::new(0.0, 1.0, df) {
            Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_stat.abs())),
            Err(_) => 1.0,
        }
    };

    Some(LinearFit {
        slope,
        intercept,
        r,
        p_value,
        std_err,
        points: n,
    })
}
