//! Named simulation setups and the pipeline that turns one into a document.

use crate::error::{SimResult, SimulationError};
use crate::export::{TrajectoryDocument, TrajectoryExporter};
use crate::integrator::{solve_on_grid, SolverSettings};
use crate::systems::{MechanicalSystem, SystemKind};
use crate::traits::Conservative;
use crate::trajectory::{SolverStats, TimeGrid};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub system: MechanicalSystem,
    pub y0: Vec<f64>,
    pub t_start: f64,
    pub t_end: f64,
    pub samples: usize,
    /// Default output file, relative to the caller's output directory.
    pub output: PathBuf,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        system: MechanicalSystem,
        y0: Vec<f64>,
        span: (f64, f64),
        samples: usize,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            system,
            y0,
            t_start: span.0,
            t_end: span.1,
            samples,
            output: output.into(),
        }
    }

    /// Looks up a built-in scenario by name.
    pub fn find(name: &str) -> SimResult<Self> {
        builtin_scenarios()
            .into_iter()
            .find(|scenario| scenario.name == name)
            .ok_or_else(|| SimulationError::UnknownScenario {
                name: name.to_string(),
            })
    }

    pub fn kind(&self) -> SystemKind {
        self.system.kind()
    }

    pub fn grid(&self) -> SimResult<TimeGrid> {
        TimeGrid::linspace(self.t_start, self.t_end, self.samples)
    }
}

/// The stock scenarios, one per system.
pub fn builtin_scenarios() -> Vec<Scenario> {
    let system = MechanicalSystem::default_for;
    vec![
        Scenario::new(
            "simple-pendulum",
            system(SystemKind::SimplePendulum),
            vec![0.2, 0.0],
            (0.0, 5.0),
            100,
            "Simple_Pendulum.js",
        ),
        Scenario::new(
            "double-pendulum",
            system(SystemKind::DoublePendulum),
            vec![FRAC_PI_2, PI, 0.0, 0.0],
            (0.0, 20.0),
            400,
            "Double_Pendulum.js",
        ),
        Scenario::new(
            "double-pendulum-angular",
            system(SystemKind::DoublePendulumAngular),
            vec![FRAC_PI_2, PI, 0.0, 0.0],
            (0.0, 20.0),
            400,
            "Double_Pendulum_Angular.js",
        ),
        Scenario::new(
            "ball-in-cone",
            system(SystemKind::BallInCone),
            vec![1.0, 0.0, 0.0, 3.0],
            (0.0, 10.0),
            400,
            "Ball_In_Cone.js",
        ),
        Scenario::new(
            "spring-pendulum",
            system(SystemKind::SpringPendulum),
            vec![1.0, 1.0, 0.0, 0.0],
            (0.0, 10.0),
            400,
            "Spring_Pendulum.js",
        ),
        Scenario::new(
            "sliding-pendulum",
            system(SystemKind::SlidingPendulum),
            vec![0.0, 1.0, 0.0, 0.0],
            (0.0, 10.0),
            400,
            "Sliding_Pendulum.js",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub document: TrajectoryDocument,
    pub stats: SolverStats,
    /// Largest `|E(t) - E(t0)|` over the sampled states.
    pub energy_drift: f64,
}

/// Integrates `scenario` and builds its document. Writes nothing.
pub fn run_scenario(scenario: &Scenario, settings: &SolverSettings) -> SimResult<ScenarioOutcome> {
    let grid = scenario.grid()?;
    debug!(
        scenario = %scenario.name,
        system = %scenario.kind(),
        samples = grid.len(),
        "running scenario"
    );

    let trajectory = solve_on_grid(&scenario.system, &scenario.y0, &grid, settings)?;
    let document = TrajectoryExporter::default().build_for(&scenario.system, &trajectory)?;

    let e0 = scenario.system.energy(trajectory.initial_state());
    let energy_drift = trajectory
        .states()
        .iter()
        .map(|state| (scenario.system.energy(state) - e0).abs())
        .fold(0.0, f64::max);

    let stats = trajectory.stats();
    debug!(
        scenario = %scenario.name,
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        energy_drift,
        "scenario finished"
    );

    Ok(ScenarioOutcome {
        document,
        stats,
        energy_drift,
    })
}
