//! Two parameterizations of the planar double pendulum.
//!
//! [`DoublePendulum`] models two identical uniform rods in canonical
//! coordinates `(theta_1, theta_2, p_1, p_2)`. [`AngularDoublePendulum`] models
//! two point masses on massless arms in `(phi_1, phi_2, d/dt phi_1, d/dt phi_2)`
//! and solves its 2x2 mass matrix on every evaluation. Angles are measured from
//! the downward vertical; the two systems are physically different and do not
//! produce the same trajectories from the same numbers.

use super::{solve_mass_matrix, STANDARD_GRAVITY};
use crate::cartesian::{CartesianPointSeries, DEFAULT_DISPLAY_SCALE};
use crate::error::SingularStateError;
use crate::traits::{Conservative, CoordinateTransform, DynamicalSystem};
use crate::trajectory::Trajectory;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Smallest admissible value of `16 - 9 cos^2(theta_1 - theta_2)`.
const ROD_DENOMINATOR_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoublePendulum {
    pub gravity: f64,
    /// Mass of each rod.
    pub mass: f64,
    /// Length of each rod.
    pub length: f64,
    pub display_scale: f64,
}

impl Default for DoublePendulum {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            mass: 1.0,
            length: 1.0,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }
}

impl DoublePendulum {
    /// Angular velocities from canonical momenta.
    fn angular_velocities(&self, t: f64, x: &[f64]) -> Result<(f64, f64), SingularStateError> {
        let (theta1, theta2, p1, p2) = (x[0], x[1], x[2], x[3]);
        let cos_delta = (theta1 - theta2).cos();
        let denominator = 16.0 - 9.0 * cos_delta * cos_delta;
        if !(denominator > ROD_DENOMINATOR_EPS) {
            return Err(SingularStateError::new(
                "double pendulum",
                "16 - 9 cos^2(theta_1 - theta_2)",
                t,
                x,
            ));
        }
        let factor = 6.0 / (self.mass * self.length * self.length * denominator);
        let omega1 = factor * (2.0 * p1 - 3.0 * cos_delta * p2);
        let omega2 = factor * (8.0 * p2 - 3.0 * cos_delta * p1);
        Ok((omega1, omega2))
    }
}

impl DynamicalSystem for DoublePendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["theta_1", "theta_2", "p_1", "p_2"]
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        let (theta1, theta2) = (x[0], x[1]);
        let (omega1, omega2) = self.angular_velocities(t, x)?;
        let inertia = 0.5 * self.mass * self.length * self.length;
        let g_over_l = self.gravity / self.length;
        let coupling = omega1 * omega2 * (theta1 - theta2).sin();

        out[0] = omega1;
        out[1] = omega2;
        out[2] = -inertia * (coupling + 3.0 * g_over_l * theta1.sin());
        out[3] = -inertia * (-coupling + g_over_l * theta2.sin());
        Ok(())
    }
}

impl CoordinateTransform for DoublePendulum {
    fn bodies(&self) -> usize {
        2
    }

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries> {
        two_arm_positions(trajectory, self.length, self.length, self.display_scale)
    }
}

impl Conservative for DoublePendulum {
    fn energy(&self, state: &[f64]) -> f64 {
        let (theta1, theta2, p1, p2) = (state[0], state[1], state[2], state[3]);
        // The Legendre map is well defined for every state since the rod
        // denominator is at least 7.
        let cos_delta = (theta1 - theta2).cos();
        let factor = 6.0
            / (self.mass * self.length * self.length * (16.0 - 9.0 * cos_delta * cos_delta));
        let omega1 = factor * (2.0 * p1 - 3.0 * cos_delta * p2);
        let omega2 = factor * (8.0 * p2 - 3.0 * cos_delta * p1);
        let kinetic = 0.5 * (p1 * omega1 + p2 * omega2);
        let potential =
            -0.5 * self.mass * self.gravity * self.length * (3.0 * theta1.cos() + theta2.cos());
        kinetic + potential
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngularDoublePendulum {
    pub gravity: f64,
    pub mass_1: f64,
    pub mass_2: f64,
    pub length_1: f64,
    pub length_2: f64,
    pub display_scale: f64,
}

impl Default for AngularDoublePendulum {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            mass_1: 1.0,
            mass_2: 1.0,
            length_1: 1.0,
            length_2: 1.0,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }
}

impl DynamicalSystem for AngularDoublePendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["phi_1", "phi_2", "d/dt phi_1", "d/dt phi_2"]
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        let (phi1, phi2, omega1, omega2) = (x[0], x[1], x[2], x[3]);
        let (m1, m2, l1, l2, g) = (
            self.mass_1,
            self.mass_2,
            self.length_1,
            self.length_2,
            self.gravity,
        );
        let delta = phi1 - phi2;
        let (sin_delta, cos_delta) = delta.sin_cos();

        let mass = Matrix2::new(
            (m1 + m2) * l1,
            m2 * l2 * cos_delta,
            l1 * cos_delta,
            l2,
        );
        let forces = Vector2::new(
            -m2 * l2 * omega2 * omega2 * sin_delta - (m1 + m2) * g * phi1.sin(),
            l1 * omega1 * omega1 * sin_delta - g * phi2.sin(),
        );
        let accel = solve_mass_matrix("angular double pendulum", t, x, mass, forces)?;

        out[0] = omega1;
        out[1] = omega2;
        out[2] = accel[0];
        out[3] = accel[1];
        Ok(())
    }
}

impl CoordinateTransform for AngularDoublePendulum {
    fn bodies(&self) -> usize {
        2
    }

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries> {
        two_arm_positions(trajectory, self.length_1, self.length_2, self.display_scale)
    }
}

impl Conservative for AngularDoublePendulum {
    fn energy(&self, state: &[f64]) -> f64 {
        let (phi1, phi2, omega1, omega2) = (state[0], state[1], state[2], state[3]);
        let (m1, m2, l1, l2, g) = (
            self.mass_1,
            self.mass_2,
            self.length_1,
            self.length_2,
            self.gravity,
        );
        let kinetic = 0.5 * (m1 + m2) * l1 * l1 * omega1 * omega1
            + 0.5 * m2 * l2 * l2 * omega2 * omega2
            + m2 * l1 * l2 * omega1 * omega2 * (phi1 - phi2).cos();
        let potential = -(m1 + m2) * g * l1 * phi1.cos() - m2 * g * l2 * phi2.cos();
        kinetic + potential
    }
}

/// End points of two chained arms whose angles are the first two state
/// components.
fn two_arm_positions(
    trajectory: &Trajectory,
    length_1: f64,
    length_2: f64,
    scale: f64,
) -> Vec<CartesianPointSeries> {
    let mut first = CartesianPointSeries::planar(trajectory.len());
    let mut second = CartesianPointSeries::planar(trajectory.len());
    for (_, state) in trajectory.iter() {
        let (sin1, cos1) = state[0].sin_cos();
        let (sin2, cos2) = state[1].sin_cos();
        let x1 = length_1 * sin1;
        let y1 = length_1 * cos1;
        first.push(scale * x1, scale * y1);
        second.push(scale * (x1 + length_2 * sin2), scale * (y1 + length_2 * cos2));
    }
    vec![first, second]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::{solve_on_grid, SolverSettings};
    use crate::trajectory::TimeGrid;
    use std::f64::consts::PI;

    fn max_energy_drift<S: DynamicalSystem + Conservative>(system: &S, y0: &[f64]) -> f64 {
        let grid = TimeGrid::linspace(0.0, 10.0, 200).expect("grid");
        let trajectory = solve_on_grid(system, y0, &grid, &SolverSettings::with_tolerance(1e-10))
            .expect("solve should succeed");
        let e0 = system.energy(y0);
        trajectory
            .states()
            .iter()
            .map(|s| (system.energy(s) - e0).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn rod_pendulum_conserves_energy_in_chaotic_regime() {
        let drift = max_energy_drift(&DoublePendulum::default(), &[PI / 2.0, PI, 0.0, 0.0]);
        assert!(drift < 1e-5, "drift {drift}");
    }

    #[test]
    fn point_mass_pendulum_conserves_energy_in_chaotic_regime() {
        let drift = max_energy_drift(&AngularDoublePendulum::default(), &[PI / 2.0, PI, 0.0, 0.0]);
        assert!(drift < 1e-5, "drift {drift}");
    }

    #[test]
    fn hanging_rest_is_an_equilibrium() {
        let mut out = [1.0; 4];
        DoublePendulum::default()
            .apply(0.0, &[0.0, 0.0, 0.0, 0.0], &mut out)
            .expect("derivative");
        assert_eq!(out, [0.0; 4]);
        AngularDoublePendulum::default()
            .apply(0.0, &[0.0, 0.0, 0.0, 0.0], &mut out)
            .expect("derivative");
        assert!(out.iter().all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn momenta_map_to_velocities_through_rod_inertia() {
        // With theta_1 = theta_2 the mass matrix is (m l^2 / 6) [[8, 3], [3, 2]].
        let pendulum = DoublePendulum::default();
        let (omega1, omega2) = (0.4, -1.1);
        let p1 = (8.0 * omega1 + 3.0 * omega2) / 6.0;
        let p2 = (3.0 * omega1 + 2.0 * omega2) / 6.0;
        let mut out = [0.0; 4];
        pendulum
            .apply(0.0, &[0.3, 0.3, p1, p2], &mut out)
            .expect("derivative");
        assert!((out[0] - omega1).abs() < 1e-12);
        assert!((out[1] - omega2).abs() < 1e-12);
    }

    #[test]
    fn point_mass_accelerations_satisfy_lagrange_equations() {
        let pendulum = AngularDoublePendulum {
            mass_1: 2.0,
            length_2: 0.5,
            ..AngularDoublePendulum::default()
        };
        let state = [0.7, -0.4, 1.3, -0.6];
        let mut out = [0.0; 4];
        pendulum.apply(0.0, &state, &mut out).expect("derivative");
        let (m1, m2, l1, l2, g) = (2.0, 1.0, 1.0, 0.5, STANDARD_GRAVITY);
        let delta = state[0] - state[1];
        let (a1, a2) = (out[2], out[3]);
        let first = (m1 + m2) * l1 * a1
            + m2 * l2 * a2 * delta.cos()
            + m2 * l2 * state[3] * state[3] * delta.sin()
            + (m1 + m2) * g * state[0].sin();
        let second = l2 * a2 + l1 * a1 * delta.cos() - l1 * state[2] * state[2] * delta.sin()
            + g * state[1].sin();
        assert!(first.abs() < 1e-12, "first residual {first}");
        assert!(second.abs() < 1e-12, "second residual {second}");
    }

    #[test]
    fn massless_lower_bob_with_aligned_arms_is_singular() {
        let pendulum = AngularDoublePendulum {
            mass_1: 0.0,
            ..AngularDoublePendulum::default()
        };
        let mut out = [0.0; 4];
        let err = pendulum
            .apply(1.5, &[0.2, 0.2, 0.0, 0.0], &mut out)
            .expect_err("singular mass matrix");
        assert_eq!(err.t, 1.5);
        assert_eq!(err.state, vec![0.2, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn cartesian_chains_second_arm_onto_first() {
        let pendulum = DoublePendulum::default();
        let grid = TimeGrid::linspace(0.0, 1.0, 3).expect("grid");
        let trajectory =
            solve_on_grid(&pendulum, &[PI / 2.0, PI, 0.0, 0.0], &grid, &SolverSettings::default())
                .expect("solve should succeed");
        let series = pendulum.to_cartesian(&trajectory);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].len(), 3);
        assert!((series[0].x[0] - 100.0).abs() < 1e-12);
        assert!(series[0].y[0].abs() < 1e-12);
        assert!((series[1].x[0] - 100.0).abs() < 1e-12);
        assert!((series[1].y[0] + 100.0).abs() < 1e-12);
    }
}
