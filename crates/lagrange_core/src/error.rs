//! Error types for integration, transforms and export.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Raised by a dynamics function when the state makes its formula divide by
/// a vanishing quantity.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{system}: derivative undefined at t = {t} ({quantity} vanishes), state = {state:?}")]
pub struct SingularStateError {
    pub system: &'static str,
    pub quantity: &'static str,
    pub t: f64,
    pub state: Vec<f64>,
}

impl SingularStateError {
    pub fn new(system: &'static str, quantity: &'static str, t: f64, state: &[f64]) -> Self {
        Self {
            system,
            quantity,
            t,
            state: state.to_vec(),
        }
    }
}

/// Which budget stopped an integration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetLimit {
    MaxSteps(usize),
    WallClock(Duration),
    /// The step size fell below the resolution of t.
    StepSizeUnderflow(f64),
}

impl fmt::Display for BudgetLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetLimit::MaxSteps(n) => write!(f, "maximum of {n} steps"),
            BudgetLimit::WallClock(d) => write!(f, "wall-clock budget of {:.3}s", d.as_secs_f64()),
            BudgetLimit::StepSizeUnderflow(h) => write!(f, "step size underflow (h = {h:e})"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    SingularState(#[from] SingularStateError),

    #[error("Invalid time grid: {reason}")]
    InvalidTimeGrid { reason: String },

    #[error("Step budget exceeded after {steps} steps at t = {t_reached}: {limit}")]
    StepBudgetExceeded {
        t_reached: f64,
        steps: usize,
        limit: BudgetLimit,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid initial state: {reason}")]
    InvalidInitialState { reason: String },

    #[error("Invalid solver settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown system: {name}")]
    UnknownSystem { name: String },

    #[error("Unknown scenario: {name}")]
    UnknownScenario { name: String },
}

pub type SimResult<T> = Result<T, SimulationError>;
