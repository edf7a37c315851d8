//! Mechanical systems: equations of motion, Cartesian transforms and energies.

mod ball_in_cone;
mod double_pendulum;
mod simple_pendulum;
mod sliding_pendulum;
mod spring_pendulum;

pub use ball_in_cone::BallInCone;
pub use double_pendulum::{AngularDoublePendulum, DoublePendulum};
pub use simple_pendulum::SimplePendulum;
pub use sliding_pendulum::SlidingPendulum;
pub use spring_pendulum::SpringPendulum;

use crate::cartesian::CartesianPointSeries;
use crate::error::{SimulationError, SingularStateError};
use crate::traits::{Conservative, CoordinateTransform, DynamicalSystem};
use crate::trajectory::Trajectory;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const STANDARD_GRAVITY: f64 = 9.81;

/// Radial coordinates below this magnitude are treated as the singular point.
pub(crate) const SINGULAR_EPS: f64 = 1e-12;

/// Relative determinant threshold for 2x2 mass matrices.
const MASS_MATRIX_EPS: f64 = 1e-12;

/// Solves `mass * accel = forces`, failing when the mass matrix is
/// (numerically) singular.
pub(crate) fn solve_mass_matrix(
    system: &'static str,
    t: f64,
    state: &[f64],
    mass: Matrix2<f64>,
    forces: Vector2<f64>,
) -> Result<Vector2<f64>, SingularStateError> {
    let singular = || SingularStateError::new(system, "mass matrix determinant", t, state);
    let det = mass.determinant();
    let diagonal = (mass[(0, 0)] * mass[(1, 1)]).abs();
    if !(det.abs() > MASS_MATRIX_EPS * diagonal) {
        return Err(singular());
    }
    mass.lu().solve(&forces).ok_or_else(singular)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemKind {
    SimplePendulum,
    DoublePendulum,
    DoublePendulumAngular,
    BallInCone,
    SpringPendulum,
    SlidingPendulum,
}

impl SystemKind {
    pub const ALL: [SystemKind; 6] = [
        SystemKind::SimplePendulum,
        SystemKind::DoublePendulum,
        SystemKind::DoublePendulumAngular,
        SystemKind::BallInCone,
        SystemKind::SpringPendulum,
        SystemKind::SlidingPendulum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SystemKind::SimplePendulum => "simple-pendulum",
            SystemKind::DoublePendulum => "double-pendulum",
            SystemKind::DoublePendulumAngular => "double-pendulum-angular",
            SystemKind::BallInCone => "ball-in-cone",
            SystemKind::SpringPendulum => "spring-pendulum",
            SystemKind::SlidingPendulum => "sliding-pendulum",
        }
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SystemKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| SimulationError::UnknownSystem {
                name: s.to_string(),
            })
    }
}

/// One of the supported systems with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "kebab-case")]
pub enum MechanicalSystem {
    SimplePendulum(SimplePendulum),
    DoublePendulum(DoublePendulum),
    DoublePendulumAngular(AngularDoublePendulum),
    BallInCone(BallInCone),
    SpringPendulum(SpringPendulum),
    SlidingPendulum(SlidingPendulum),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            MechanicalSystem::SimplePendulum($inner) => $body,
            MechanicalSystem::DoublePendulum($inner) => $body,
            MechanicalSystem::DoublePendulumAngular($inner) => $body,
            MechanicalSystem::BallInCone($inner) => $body,
            MechanicalSystem::SpringPendulum($inner) => $body,
            MechanicalSystem::SlidingPendulum($inner) => $body,
        }
    };
}

impl MechanicalSystem {
    /// The system with its default parameters.
    pub fn default_for(kind: SystemKind) -> Self {
        match kind {
            SystemKind::SimplePendulum => Self::SimplePendulum(SimplePendulum::default()),
            SystemKind::DoublePendulum => Self::DoublePendulum(DoublePendulum::default()),
            SystemKind::DoublePendulumAngular => {
                Self::DoublePendulumAngular(AngularDoublePendulum::default())
            }
            SystemKind::BallInCone => Self::BallInCone(BallInCone::default()),
            SystemKind::SpringPendulum => Self::SpringPendulum(SpringPendulum::default()),
            SystemKind::SlidingPendulum => Self::SlidingPendulum(SlidingPendulum::default()),
        }
    }

    pub fn kind(&self) -> SystemKind {
        match self {
            MechanicalSystem::SimplePendulum(_) => SystemKind::SimplePendulum,
            MechanicalSystem::DoublePendulum(_) => SystemKind::DoublePendulum,
            MechanicalSystem::DoublePendulumAngular(_) => SystemKind::DoublePendulumAngular,
            MechanicalSystem::BallInCone(_) => SystemKind::BallInCone,
            MechanicalSystem::SpringPendulum(_) => SystemKind::SpringPendulum,
            MechanicalSystem::SlidingPendulum(_) => SystemKind::SlidingPendulum,
        }
    }
}

impl From<SystemKind> for MechanicalSystem {
    fn from(kind: SystemKind) -> Self {
        Self::default_for(kind)
    }
}

impl DynamicalSystem for MechanicalSystem {
    fn dimension(&self) -> usize {
        dispatch!(self, s => s.dimension())
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        dispatch!(self, s => s.coordinate_names())
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        dispatch!(self, s => s.apply(t, x, out))
    }
}

impl CoordinateTransform for MechanicalSystem {
    fn bodies(&self) -> usize {
        dispatch!(self, s => s.bodies())
    }

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries> {
        dispatch!(self, s => s.to_cartesian(trajectory))
    }
}

impl Conservative for MechanicalSystem {
    fn energy(&self, state: &[f64]) -> f64 {
        dispatch!(self, s => s.energy(state))
    }
}
