use serde::{Deserialize, Serialize};

/// Default multiplier from physical lengths to display units.
pub const DEFAULT_DISPLAY_SCALE: f64 = 100.0;

/// Positions of one body over a trajectory, one entry per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianPointSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<f64>>,
}

impl CartesianPointSeries {
    pub fn planar(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: None,
        }
    }

    pub fn spatial(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Some(Vec::with_capacity(capacity)),
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    /// Appends a 3-D point; the `z` column is created if the series was planar.
    pub fn push_spatial(&mut self, x: f64, y: f64, z: f64) {
        self.push(x, y);
        self.z.get_or_insert_with(Vec::new).push(z);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn is_spatial(&self) -> bool {
        self.z.is_some()
    }

    /// True when every column has the same length.
    pub fn is_consistent(&self) -> bool {
        self.y.len() == self.x.len() && self.z.as_ref().map_or(true, |z| z.len() == self.x.len())
    }
}
