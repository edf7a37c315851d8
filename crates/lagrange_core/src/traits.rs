use crate::cartesian::CartesianPointSeries;
use crate::error::SingularStateError;
use crate::trajectory::Trajectory;

/// A first-order ODE system `dx/dt = f(t, x)`.
pub trait DynamicalSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Human-readable name of each state component, in state order.
    fn coordinate_names(&self) -> &'static [&'static str];

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into
    ///
    /// Fails without touching the caller's state when the formula is
    /// undefined at `x`.
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError>;
}

impl<S: DynamicalSystem + ?Sized> DynamicalSystem for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        (**self).coordinate_names()
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), SingularStateError> {
        (**self).apply(t, x, out)
    }
}

/// Maps a generalized-coordinate trajectory onto Cartesian body positions.
pub trait CoordinateTransform {
    /// Number of point series produced, one per physical body.
    fn bodies(&self) -> usize;

    fn to_cartesian(&self, trajectory: &Trajectory) -> Vec<CartesianPointSeries>;
}

/// Systems with a conserved total mechanical energy.
pub trait Conservative {
    fn energy(&self, state: &[f64]) -> f64;
}
