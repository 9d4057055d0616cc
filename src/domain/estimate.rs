// Target-time estimation from a fitted growth line
use super::growth::{GrowthFit, LinearFit};
use chrono::{DateTime, FixedOffset, TimeDelta};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// r² above which an estimate is considered trustworthy
pub const RELIABLE_CONFIDENCE: f64 = 0.9;

/// Samples drawn along a projected growth line
pub const PROJECTION_SAMPLES: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum Crossing {
    At(DateTime<FixedOffset>),
    /// Fewer than three usable points in the fit window
    InsufficientData,
    /// Zero slope: the line never reaches the target
    Flat,
    /// Target is not a positive finite OD
    InvalidTarget,
    /// Crossing lies outside the representable time range
    OutOfRange,
}

impl Crossing {
    pub fn label(&self) -> String {
        match self {
            Crossing::At(time) => time.format(DISPLAY_FORMAT).to_string(),
            Crossing::InsufficientData => "none".to_string(),
            Crossing::Flat | Crossing::OutOfRange => "unobtainable".to_string(),
            Crossing::InvalidTarget => "invalid target".to_string(),
        }
    }

    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Crossing::At(time) => Some(*time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub target: f64,
    pub crossing: Crossing,
    /// r² of the fit, three decimals; zero without a fit
    pub confidence: f64,
}

impl Estimate {
    pub fn display(&self) -> String {
        self.crossing.label()
    }

    pub fn is_reliable(&self) -> bool {
        self.confidence > RELIABLE_CONFIDENCE
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Solve `slope * h + intercept = ln(target)` and place `h` on the series clock.
pub fn estimate(fit: &GrowthFit, target: f64) -> Estimate {
    let (Some(line), Some(origin)) = (fit.line.as_ref(), fit.origin) else {
        return Estimate {
            target,
            crossing: Crossing::InsufficientData,
            confidence: 0.0,
        };
    };

    let confidence = round3(line.r_squared());
    let crossing = if !valid_target(target) {
        Crossing::InvalidTarget
    } else {
        match crossing_hours(line, target) {
            Some(hours) => crossing_time(origin, hours),
            None => Crossing::Flat,
        }
    };

    tracing::debug!(
        "Estimate for target {}: {} (r² {})",
        target,
        crossing.label(),
        confidence
    );

    Estimate {
        target,
        crossing,
        confidence,
    }
}

fn valid_target(target: f64) -> bool {
    target.is_finite() && target > 0.0
}

/// Hours since the series origin at which the line reaches `ln(target)`;
/// `None` for a flat or non-finite slope.
fn crossing_hours(line: &LinearFit, target: f64) -> Option<f64> {
    if line.slope == 0.0 || !line.slope.is_finite() {
        return None;
    }
    Some((target.ln() - line.intercept) / line.slope)
}

/// A sample on the fitted line, in fit-axis hours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionPoint {
    pub hours: f64,
    pub ln_od: f64,
    pub od: f64,
}

/// Evenly spaced samples of the fitted line from the start of the fit window
/// to the hour it reaches `target`. Empty when there is no crossing to draw to.
pub fn project(fit: &GrowthFit, target: f64) -> Vec<ProjectionPoint> {
    let Some(line) = fit.line.as_ref() else {
        return Vec::new();
    };
    if !valid_target(target) {
        return Vec::new();
    }
    let Some(end) = crossing_hours(line, target).filter(|h| h.is_finite()) else {
        return Vec::new();
    };

    let start = fit.last_time_point + fit.window.start;
    let step = (end - start) / (PROJECTION_SAMPLES - 1) as f64;
    (0..PROJECTION_SAMPLES)
        .map(|i| {
            let hours = if i == PROJECTION_SAMPLES - 1 {
                end
            } else {
                start + step * i as f64
            };
            let ln_od = line.predict(hours);
            ProjectionPoint {
                hours,
                ln_od,
                od: ln_od.exp(),
            }
        })
        .collect()
}

fn crossing_time(origin: DateTime<FixedOffset>, hours: f64) -> Crossing {
    if !hours.is_finite() {
        return Crossing::OutOfRange;
    }
    let millis = (hours * 3_600_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return Crossing::OutOfRange;
    }
    TimeDelta::try_milliseconds(millis as i64)
        .and_then(|delta| origin.checked_add_signed(delta))
        .map(Crossing::At)
        .unwrap_or(Crossing::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::growth::{LinearFit, Window};
    use crate::domain::test_support::at;

    fn fit_with(slope: f64, intercept: f64, r: f64) -> GrowthFit {
        GrowthFit {
            origin: Some(at(0.0)),
            last_time_point: 0.5,
            window: Window::default(),
            line: Some(LinearFit {
                slope,
                intercept,
                r,
                p_value: 0.0,
                std_err: 0.0,
                points: 10,
            }),
        }
    }

    #[test]
    fn test_estimate_crossing_time() {
        let estimate = estimate(&fit_with(2.0, 1.0, 0.99), 3.0_f64.exp());

        assert_eq!(estimate.crossing, Crossing::At(at(1.0)));
        assert_eq!(estimate.display(), "2024-01-01 01:00:00");
        assert_eq!(estimate.confidence, 0.98);
        assert!(estimate.is_reliable());
    }

    #[test]
    fn test_confidence_rounded_to_three_decimals() {
        let estimate = estimate(&fit_with(0.5, -2.0, 0.87654), 0.8);
        assert_eq!(estimate.confidence, 0.768);
        assert!(!estimate.is_reliable());
    }

    #[test]
    fn test_zero_slope_is_unobtainable() {
        let estimate = estimate(&fit_with(0.0, 1.0, 0.0), 0.8);
        assert_eq!(estimate.crossing, Crossing::Flat);
        assert_eq!(estimate.display(), "unobtainable");
        assert!(estimate.crossing.time().is_none());
    }

    #[test]
    fn test_empty_fit_is_none() {
        let fit = GrowthFit {
            origin: Some(at(0.0)),
            last_time_point: 1.0,
            window: Window::default(),
            line: None,
        };
        let estimate = estimate(&fit, 0.5);
        assert_eq!(estimate.crossing, Crossing::InsufficientData);
        assert_eq!(estimate.display(), "none");
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_invalid_target() {
        let fit = fit_with(1.0, 0.0, 1.0);
        assert_eq!(estimate(&fit, 0.0).crossing, Crossing::InvalidTarget);
        assert_eq!(estimate(&fit, -1.0).crossing, Crossing::InvalidTarget);
        assert_eq!(estimate(&fit, f64::NAN).crossing, Crossing::InvalidTarget);
    }

    #[test]
    fn test_crossing_beyond_time_range() {
        let estimate = estimate(&fit_with(1e-300, 0.0, 0.5), 2.0);
        assert_eq!(estimate.crossing, Crossing::OutOfRange);
        assert_eq!(estimate.display(), "unobtainable");
    }

    #[test]
    fn test_projection_runs_from_window_start_to_target() {
        // last_time_point 0.5 with the default [-2, 0] window starts at -1.5 h
        let fit = fit_with(2.0, 1.0, 0.99);
        let points = project(&fit, 3.0_f64.exp());

        assert_eq!(points.len(), PROJECTION_SAMPLES);
        assert_eq!(points[0].hours, -1.5);
        assert!((points[0].ln_od - -2.0).abs() < 1e-9);

        let last = points.last().unwrap();
        assert_eq!(last.hours, (3.0_f64.exp().ln() - 1.0) / 2.0);
        assert!((last.ln_od - 3.0).abs() < 1e-9);
        assert!((last.od - 3.0_f64.exp()).abs() < 1e-6);
        assert!(points.windows(2).all(|w| w[0].hours < w[1].hours));
    }

    #[test]
    fn test_no_projection_without_crossing() {
        assert!(project(&fit_with(0.0, 1.0, 0.0), 0.8).is_empty());
        assert!(project(&fit_with(1.0, 0.0, 1.0), -1.0).is_empty());

        let empty = GrowthFit {
            origin: None,
            last_time_point: 0.0,
            window: Window::default(),
            line: None,
        };
        assert!(project(&empty, 0.5).is_empty());
    }

    #[test]
    fn test_decreasing_line_crosses_in_the_past() {
        // ln(1) = 0 reached 2 hours before the origin
        let estimate = estimate(&fit_with(-0.5, -1.0, -0.95), 1.0);
        assert_eq!(estimate.crossing, Crossing::At(at(-2.0)));
    }
}
