use super::{solve_mass_matrix, STANDARD_GRAVITY};
use crate::cartesian::{CartesianPointSeries, DEFAULT_DISPLAY_SCALE};
use crate::error::SingularStateError;
use crate::traits::{Conservative, CoordinateTransform, DynamicalSystem};
use crate::trajectory::Trajectory;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Pendulum hanging from a pivot that slides freely along a horizontal rail.
/// State: `(x, phi, d/dt x, d/dt phi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingPendulum {
    pub gravity: f64,
    pub pivot_mass: f64,
    pub bob_mass: f64,
    pub length: f64,
    pub display_scale: f64,
}

impl Default for SlidingPendulum {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            pivot_mass: 1.0,
            bob_mass: 1.0,
            length: 1.0,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }
}

impl DynamicalSystem for SlidingPendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["x", "phi", "d/dt x", "d/dt phi"]
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        let (phi, x_dot, phi_dot) = (x[1], x[2], x[3]);
        let (big_m, m, l, g) = (self.pivot_mass, self.bob_mass, self.length, self.gravity);
        let (sin_phi, cos_phi) = phi.sin_cos();

        // x and phi accelerations are coupled through the off-diagonal term.
        let mass = Matrix2::new(big_m + m, m * l * cos_phi, m * l * cos_phi, m * l * l);
        let forces = Vector2::new(m * l * sin_phi * phi_dot * phi_dot, -m * g * l * sin_phi);
        let accel = solve_mass_matrix("sliding pendulum", t, x, mass, forces)?;

        out[0] = x_dot;
        out[1] = phi_dot;
        out[2] = accel[0];
        out[3] = accel[1];
        Ok(())
    }
}

impl CoordinateTransform for SlidingPendulum {
    fn bodies(&self) -> usize {
        2
    }

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries> {
        let scale = self.display_scale;
        let mut pivot = CartesianPointSeries::planar(trajectory.len());
        let mut bob = CartesianPointSeries::planar(trajectory.len());
        for (_, state) in trajectory.iter() {
            let (x, phi) = (state[0], state[1]);
            pivot.push(scale * x, 0.0);
            bob.push(
                scale * (x + self.length * phi.sin()),
                scale * self.length * phi.cos(),
            );
        }
        vec![pivot, bob]
    }
}

impl Conservative for SlidingPendulum {
    fn energy(&self, state: &[f64]) -> f64 {
        let (phi, x_dot, phi_dot) = (state[1], state[2], state[3]);
        let (big_m, m, l, g) = (self.pivot_mass, self.bob_mass, self.length, self.gravity);
        let kinetic = 0.5 * (big_m + m) * x_dot * x_dot
            + m * l * phi.cos() * x_dot * phi_dot
            + 0.5 * m * l * l * phi_dot * phi_dot;
        kinetic - m * g * l * phi.cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::{solve_on_grid, SolverSettings};
    use crate::trajectory::TimeGrid;

    #[test]
    fn centre_of_mass_stays_put_and_energy_is_conserved() {
        let pendulum = SlidingPendulum::default();
        let y0 = [0.0, 1.0, 0.0, 0.0];
        let grid = TimeGrid::linspace(0.0, 10.0, 400).expect("grid");
        let trajectory = solve_on_grid(&pendulum, &y0, &grid, &SolverSettings::with_tolerance(1e-10))
            .expect("solve should succeed");

        let total = pendulum.pivot_mass + pendulum.bob_mass;
        let centre = |s: &[f64]| {
            (pendulum.pivot_mass * s[0] + pendulum.bob_mass * (s[0] + pendulum.length * s[1].sin()))
                / total
        };
        let c0 = centre(&y0);
        let e0 = pendulum.energy(&y0);
        for state in trajectory.states() {
            assert!((centre(state) - c0).abs() < 1e-7);
            assert!((pendulum.energy(state) - e0).abs() < 1e-6);
        }
    }

    #[test]
    fn heavy_pivot_behaves_like_fixed_pendulum() {
        let pendulum = SlidingPendulum {
            pivot_mass: 1e12,
            ..SlidingPendulum::default()
        };
        let mut out = [0.0; 4];
        pendulum
            .apply(0.0, &[0.0, 0.3, 0.0, 0.0], &mut out)
            .expect("derivative");
        assert!(out[2].abs() < 1e-9);
        assert!((out[3] + pendulum.gravity * 0.3f64.sin()).abs() < 1e-9);
    }

    #[test]
    fn massless_pivot_at_rest_angle_is_singular() {
        let pendulum = SlidingPendulum {
            pivot_mass: 0.0,
            ..SlidingPendulum::default()
        };
        let mut out = [0.0; 4];
        let err = pendulum
            .apply(0.0, &[0.0, 0.0, 0.0, 0.0], &mut out)
            .expect_err("det = m l^2 (M + m sin^2 phi) vanishes");
        assert_eq!(err.system, "sliding pendulum");
    }

    #[test]
    fn pivot_series_stays_on_the_rail() {
        let pendulum = SlidingPendulum::default();
        let grid = TimeGrid::linspace(0.0, 2.0, 20).expect("grid");
        let trajectory = solve_on_grid(&pendulum, &[0.0, 1.0, 0.0, 0.0], &grid, &SolverSettings::default())
            .expect("solve should succeed");
        let series = pendulum.to_cartesian(&trajectory);
        assert_eq!(series.len(), 2);
        assert!(series[0].y.iter().all(|&y| y == 0.0));
        assert!((series[1].x[0] - 100.0 * 1f64.sin()).abs() < 1e-12);
        assert!((series[1].y[0] - 100.0 * 1f64.cos()).abs() < 1e-12);
    }
}
