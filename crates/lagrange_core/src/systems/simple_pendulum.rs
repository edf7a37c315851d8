use super::STANDARD_GRAVITY;
use crate::cartesian::{CartesianPointSeries, DEFAULT_DISPLAY_SCALE};
use crate::error::SingularStateError;
use crate::traits::{Conservative, CoordinateTransform, DynamicalSystem};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

/// Point mass on a massless rod. State: `(phi, d/dt phi)`, phi measured from
/// the downward vertical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplePendulum {
    pub gravity: f64,
    pub length: f64,
    pub display_scale: f64,
}

impl Default for SimplePendulum {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            length: 1.0,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }
}

impl DynamicalSystem for SimplePendulum {
    fn dimension(&self) -> usize {
        2
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["phi", "d/dt phi"]
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        out[0] = x[1];
        out[1] = -self.gravity / self.length * x[0].sin();
        Ok(())
    }
}

impl CoordinateTransform for SimplePendulum {
    fn bodies(&self) -> usize {
        1
    }

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries> {
        let arm = self.length * self.display_scale;
        let mut bob = CartesianPointSeries::planar(trajectory.len());
        for (_, state) in trajectory.iter() {
            let phi = state[0];
            bob.push(arm * phi.sin(), arm * phi.cos());
        }
        vec![bob]
    }
}

impl Conservative for SimplePendulum {
    /// Energy per unit mass.
    fn energy(&self, state: &[f64]) -> f64 {
        let (phi, omega) = (state[0], state[1]);
        0.5 * self.length * self.length * omega * omega - self.gravity * self.length * phi.cos()
    }
}
