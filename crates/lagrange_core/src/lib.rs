pub mod cartesian;
pub mod dopri5;
pub mod error;
pub mod export;
pub mod integrator;
pub mod scenario;
pub mod systems;
/// The `lagrange_core` crate simulates small Lagrangian mechanical systems and
/// exports their motion as Cartesian point series for animation.
///
/// Key components:
/// - **Traits**: `DynamicalSystem` (equations of motion), `CoordinateTransform`
///   (generalized to Cartesian coordinates), `Conservative` (energy).
/// - **Integrator**: adaptive Dormand-Prince 5(4) with dense output, sampled on a
///   caller-supplied time grid.
/// - **Systems**: simple, double, spring and sliding pendulums plus a ball in a cone.
/// - **Export**: sorted, pretty-printed JSON trajectory documents.
pub mod traits;
pub mod trajectory;

pub use error::{SimResult, SimulationError, SingularStateError};
pub use export::{TrajectoryDocument, TrajectoryExporter};
pub use integrator::{solve, solve_on_grid, SolverSettings};
pub use scenario::{builtin_scenarios, run_scenario, Scenario, ScenarioOutcome};
pub use systems::{MechanicalSystem, SystemKind};
pub use trajectory::{SolverStats, TimeGrid, Trajectory};
