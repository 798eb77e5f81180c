// Viewport & Scenario Config
// Sampled region plus the charges placed in it, loaded from JSON
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::engine::charges::{Charge, PointChargeFlatland};
use crate::engine::grid::SampleGrid;
use crate::error::Result;

/// Sampled region: `[min, max] / zoom + offset` on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub x_offset: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub y_offset: f64,
    pub zoom: f64,
    /// Samples per axis
    pub elements_between_limits: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            x_min: -10.0,
            x_max: 10.0,
            x_offset: 0.0,
            y_min: -10.0,
            y_max: 10.0,
            y_offset: 0.0,
            zoom: 1.0,
            elements_between_limits: 200,
        }
    }
}

impl ViewportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn fixed_x_min(&self) -> f64 {
        self.x_min / self.zoom + self.x_offset
    }

    pub fn fixed_x_max(&self) -> f64 {
        self.x_max / self.zoom + self.x_offset
    }

    pub fn fixed_y_min(&self) -> f64 {
        self.y_min / self.zoom + self.y_offset
    }

    pub fn fixed_y_max(&self) -> f64 {
        self.y_max / self.zoom + self.y_offset
    }

    pub fn x_axis(&self) -> Array1<f64> {
        Array1::linspace(
            self.fixed_x_min(),
            self.fixed_x_max(),
            self.elements_between_limits,
        )
    }

    pub fn y_axis(&self) -> Array1<f64> {
        Array1::linspace(
            self.fixed_y_min(),
            self.fixed_y_max(),
            self.elements_between_limits,
        )
    }

    pub fn sample_grid(&self) -> Result<SampleGrid> {
        SampleGrid::new(self.x_axis().to_vec(), self.y_axis().to_vec())
    }
}

impl fmt::Display for ViewportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "X: [{}, {}] + {}", self.x_min, self.x_max, self.x_offset)?;
        writeln!(f, "Y: [{}, {}] + {}", self.y_min, self.y_max, self.y_offset)?;
        writeln!(f, "Zoom: {}", self.zoom)?;
        write!(f, "Elements between units: {}", self.elements_between_limits)
    }
}

/// Viewport plus charge set, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub viewport: ViewportConfig,
    pub charges: Vec<Charge>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for Scenario {
    /// Three flatland charges on a zoomed, shifted 200x200 viewport.
    fn default() -> Self {
        Self {
            viewport: ViewportConfig {
                x_min: -40.0,
                x_max: 40.0,
                x_offset: 2.0,
                y_min: -30.0,
                y_max: 30.0,
                y_offset: 0.0,
                zoom: 6.0,
                elements_between_limits: 200,
            },
            charges: vec![
                PointChargeFlatland::new(2.0, [0.0, 0.0]).into(),
                PointChargeFlatland::new(-1.0, [2.0, 0.0]).into(),
                PointChargeFlatland::new(0.0, [4.0, 0.0]).into(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::charges::LineCharge;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ViewportConfig::from_json(r#"{"x_min": -40, "zoom": 4}"#).unwrap();
        assert_eq!(config.x_min, -40.0);
        assert_eq!(config.zoom, 4.0);
        assert_eq!(config.x_max, 10.0);
        assert_eq!(config.elements_between_limits, 200);
    }

    #[test]
    fn fixed_limits_apply_zoom_then_offset() {
        let config = ViewportConfig {
            x_min: -40.0,
            x_max: 40.0,
            x_offset: 2.0,
            zoom: 8.0,
            elements_between_limits: 5,
            ..Default::default()
        };
        assert_eq!(config.fixed_x_min(), -3.0);
        assert_eq!(config.fixed_x_max(), 7.0);
        assert_eq!(config.x_axis().to_vec(), vec![-3.0, -0.5, 2.0, 4.5, 7.0]);
    }

    #[test]
    fn sample_grid_is_square_with_configured_resolution() {
        let grid = Scenario::default().viewport.sample_grid().unwrap();
        assert_eq!(grid.shape(), (200, 200));
    }

    #[test]
    fn zero_resolution_is_an_invalid_grid() {
        let config = ViewportConfig {
            elements_between_limits: 0,
            ..Default::default()
        };
        assert!(config.sample_grid().is_err());
    }

    #[test]
    fn scenario_parses_tagged_charges() {
        let scenario = Scenario::from_json(
            r#"{
                "viewport": {"zoom": 2},
                "charges": [
                    {"kind": "point_flatland", "q": 1, "position": [0, 0]},
                    {"kind": "point", "q": -1, "position": [1, 1]},
                    {"kind": "line", "q": 1, "a": [-1, -2], "b": [-1, 2]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.viewport.zoom, 2.0);
        assert_eq!(scenario.charges.len(), 3);
        assert_eq!(
            scenario.charges[2],
            Charge::from(LineCharge::new(1.0, [-1.0, -2.0], [-1.0, 2.0]))
        );
    }

    #[test]
    fn unknown_charge_kind_fails_to_parse() {
        let err = Scenario::from_json(r#"{"charges": [{"kind": "dipole", "q": 1}]}"#);
        assert!(err.is_err());
    }
}
