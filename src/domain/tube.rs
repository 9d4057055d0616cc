// Per-tube settings and prediction results
use super::estimate::Estimate;
use super::growth::GrowthFit;

pub const DEFAULT_TARGET: f64 = 0.5;
pub const DEFAULT_OFFSET: f64 = 0.0;

/// Settings the caller supplies for one tube; unset fields take defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeSettings {
    pub name: Option<String>,
    pub target: Option<f64>,
    pub offset: Option<f64>,
}

impl TubeSettings {
    /// Label for the tube at zero-based `index`; blank names fall back to `tube N`
    pub fn label(&self, index: usize) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_tube_name(index),
        }
    }
}

pub fn default_tube_name(index: usize) -> String {
    format!("tube {}", index + 1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TubeReport {
    pub index: usize,
    pub label: String,
    pub offset: f64,
    pub fit: GrowthFit,
    pub estimate: Estimate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_defaults() {
        assert_eq!(TubeSettings::default().label(0), "tube 1");

        let blank = TubeSettings {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.label(7), "tube 8");

        let named = TubeSettings {
            name: Some(" E. coli ".to_string()),
            ..Default::default()
        };
        assert_eq!(named.label(2), "E. coli");
    }
}
