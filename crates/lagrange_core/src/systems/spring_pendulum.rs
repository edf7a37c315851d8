use super::{SINGULAR_EPS, STANDARD_GRAVITY};
use crate::cartesian::{CartesianPointSeries, DEFAULT_DISPLAY_SCALE};
use crate::error::SingularStateError;
use crate::traits::{Conservative, CoordinateTransform, DynamicalSystem};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

/// Pendulum whose arm is a linear spring. State: `(r, phi, d/dt r, d/dt phi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringPendulum {
    pub gravity: f64,
    pub mass: f64,
    pub stiffness: f64,
    pub rest_length: f64,
    pub display_scale: f64,
}

impl Default for SpringPendulum {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            mass: 1.0,
            stiffness: 20.0,
            rest_length: 1.0,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }
}

impl DynamicalSystem for SpringPendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["r", "phi", "d/dt r", "d/dt phi"]
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        let (r, phi, r_dot, phi_dot) = (x[0], x[1], x[2], x[3]);
        if !(r.abs() > SINGULAR_EPS) {
            return Err(SingularStateError::new("spring pendulum", "r", t, x));
        }
        let (sin_phi, cos_phi) = phi.sin_cos();
        out[0] = r_dot;
        out[1] = phi_dot;
        out[2] = r * phi_dot * phi_dot + self.gravity * cos_phi
            - self.stiffness / self.mass * (r - self.rest_length);
        out[3] = -(self.gravity * sin_phi + 2.0 * r_dot * phi_dot) / r;
        Ok(())
    }
}

impl CoordinateTransform for SpringPendulum {
    fn bodies(&self) -> usize {
        1
    }

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries> {
        let scale = self.display_scale;
        let mut bob = CartesianPointSeries::planar(trajectory.len());
        for (_, state) in trajectory.iter() {
            let (r, phi) = (state[0], state[1]);
            bob.push(scale * r * phi.sin(), scale * r * phi.cos());
        }
        vec![bob]
    }
}

impl Conservative for SpringPendulum {
    fn energy(&self, state: &[f64]) -> f64 {
        let (r, phi, r_dot, phi_dot) = (state[0], state[1], state[2], state[3]);
        let stretch = r - self.rest_length;
        0.5 * self.mass * (r_dot * r_dot + r * r * phi_dot * phi_dot)
            + 0.5 * self.stiffness * stretch * stretch
            - self.mass * self.gravity * r * phi.cos()
    }
}
