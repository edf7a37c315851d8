use super::{SINGULAR_EPS, STANDARD_GRAVITY};
use crate::cartesian::{CartesianPointSeries, DEFAULT_DISPLAY_SCALE};
use crate::error::SingularStateError;
use crate::traits::{Conservative, CoordinateTransform, DynamicalSystem};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

/// A ball sliding without friction on the inside of an upright cone with its
/// apex at the origin. State: `(z, phi, d/dt z, d/dt phi)` where `z` is the
/// height above the apex and `phi` the azimuth.
///
/// The azimuthal equation divides by `z`, so the apex is a singular state.
/// Heights at or below the apex lie outside the cone and are rejected too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallInCone {
    pub gravity: f64,
    /// Angle between the cone axis and its surface, in radians.
    pub half_angle: f64,
    pub display_scale: f64,
}

impl Default for BallInCone {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            half_angle: FRAC_PI_4,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }
}

impl BallInCone {
    fn tan_squared(&self) -> f64 {
        let tan = self.half_angle.tan();
        tan * tan
    }
}

impl DynamicalSystem for BallInCone {
    fn dimension(&self) -> usize {
        4
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["z", "phi", "d/dt z", "d/dt phi"]
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        let (z, _phi, z_dot, phi_dot) = (x[0], x[1], x[2], x[3]);
        if !(z > SINGULAR_EPS) {
            return Err(SingularStateError::new("ball in cone", "z", t, x));
        }
        let k = self.tan_squared();
        out[0] = z_dot;
        out[1] = phi_dot;
        out[2] = (k * z * phi_dot * phi_dot - self.gravity) / (1.0 + k);
        out[3] = -2.0 * z_dot * phi_dot / z;
        Ok(())
    }
}

impl CoordinateTransform for BallInCone {
    fn bodies(&self) -> usize {
        1
    }

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries> {
        let tan = self.half_angle.tan();
        let scale = self.display_scale;
        let mut ball = CartesianPointSeries::spatial(trajectory.len());
        for (_, state) in trajectory.iter() {
            let (z, phi) = (state[0], state[1]);
            let radius = z * tan;
            ball.push_spatial(
                scale * radius * phi.cos(),
                scale * radius * phi.sin(),
                scale * z,
            );
        }
        vec![ball]
    }
}

impl Conservative for BallInCone {
    /// Energy per unit mass.
    fn energy(&self, state: &[f64]) -> f64 {
        let (z, _phi, z_dot, phi_dot) = (state[0], state[1], state[2], state[3]);
        let k = self.tan_squared();
        0.5 * (1.0 + k) * z_dot * z_dot + 0.5 * k * z * z * phi_dot * phi_dot + self.gravity * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use crate::integrator::{solve, solve_on_grid, SolverSettings};
    use crate::trajectory::TimeGrid;

    #[test]
    fn apex_is_singular() {
        let result = solve(
            &BallInCone::default(),
            &[0.0, 0.0, 0.0, 0.0],
            &[0.0, 1.0],
            &SolverSettings::default(),
        );
        match result {
            Err(SimulationError::SingularState(err)) => {
                assert_eq!(err.system, "ball in cone");
                assert_eq!(err.quantity, "z");
                assert_eq!(err.state, vec![0.0; 4]);
            }
            other => panic!("expected singular state, got {other:?}"),
        }
    }

    #[test]
    fn falling_straight_into_the_apex_is_singular() {
        let grid = TimeGrid::linspace(0.0, 2.0, 21).expect("grid");
        let result = solve_on_grid(
            &BallInCone::default(),
            &[1.0, 0.0, 0.0, 0.0],
            &grid,
            &SolverSettings::default(),
        );
        match result {
            Err(SimulationError::SingularState(err)) => {
                assert_eq!(err.quantity, "z");
                assert!(err.state[0] <= SINGULAR_EPS);
                assert!(err.t > 0.0 && err.t < 2.0);
            }
            other => panic!("expected singular state, got {other:?}"),
        }
    }

    #[test]
    fn below_the_apex_is_singular() {
        let mut out = [0.0; 4];
        let err = BallInCone::default()
            .apply(0.0, &[-0.5, 0.0, 0.0, 1.0], &mut out)
            .expect_err("negative height is outside the cone");
        assert_eq!(err.quantity, "z");
    }

    #[test]
    fn circular_orbit_keeps_its_height() {
        let cone = BallInCone::default();
        // k z phi_dot^2 = g keeps z constant.
        let z = 1.0;
        let phi_dot = (cone.gravity / (cone.tan_squared() * z)).sqrt();
        let grid = TimeGrid::linspace(0.0, 5.0, 50).expect("grid");
        let trajectory = solve_on_grid(
            &cone,
            &[z, 0.0, 0.0, phi_dot],
            &grid,
            &SolverSettings::with_tolerance(1e-10),
        )
        .expect("solve should succeed");
        for (t, state) in trajectory.iter() {
            assert!((state[0] - z).abs() < 1e-8, "z({t}) = {}", state[0]);
            assert!((state[1] - phi_dot * t).abs() < 1e-6);
        }
    }

    #[test]
    fn angular_momentum_and_energy_are_conserved() {
        let cone = BallInCone::default();
        let y0 = [1.0, 0.0, 0.0, 3.0];
        let grid = TimeGrid::linspace(0.0, 10.0, 400).expect("grid");
        let trajectory = solve_on_grid(&cone, &y0, &grid, &SolverSettings::with_tolerance(1e-10))
            .expect("solve should succeed");
        let e0 = cone.energy(&y0);
        let l0 = y0[0] * y0[0] * y0[3];
        for state in trajectory.states() {
            assert!(state[0] > 0.0);
            assert!((cone.energy(state) - e0).abs() < 1e-6);
            assert!((state[0] * state[0] * state[3] - l0).abs() < 1e-6);
        }
    }

    #[test]
    fn cartesian_series_is_three_dimensional() {
        let cone = BallInCone::default();
        let trajectory = solve(&cone, &[2.0, 0.0, 0.0, 3.0], &[0.0], &SolverSettings::default())
            .expect("solve should succeed");
        let series = cone.to_cartesian(&trajectory);
        assert_eq!(series.len(), 1);
        let z = series[0].z.as_ref().expect("z column");
        assert!((series[0].x[0] - 200.0).abs() < 1e-9);
        assert!(series[0].y[0].abs() < 1e-12);
        assert!((z[0] - 200.0).abs() < 1e-12);
    }
}
