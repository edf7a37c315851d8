use crate::error::{SimResult, SimulationError};
use serde::{Deserialize, Serialize};

/// Strictly increasing, finite output times.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    pub fn new(times: Vec<f64>) -> SimResult<Self> {
        if times.is_empty() {
            return Err(SimulationError::InvalidTimeGrid {
                reason: "grid is empty".to_string(),
            });
        }
        if let Some(idx) = times.iter().position(|t| !t.is_finite()) {
            return Err(SimulationError::InvalidTimeGrid {
                reason: format!("time at index {idx} is not finite"),
            });
        }
        for (idx, pair) in times.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SimulationError::InvalidTimeGrid {
                    reason: format!(
                        "times must be strictly increasing (t[{}] = {} >= t[{}] = {})",
                        idx,
                        pair[0],
                        idx + 1,
                        pair[1]
                    ),
                });
            }
        }
        Ok(Self { times })
    }

    /// `samples` evenly spaced times from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, samples: usize) -> SimResult<Self> {
        if samples == 0 {
            return Err(SimulationError::InvalidTimeGrid {
                reason: "sample count must be at least 1".to_string(),
            });
        }
        if samples == 1 {
            return Self::new(vec![start]);
        }
        let step = (end - start) / (samples - 1) as f64;
        let mut times: Vec<f64> = (0..samples).map(|i| start + step * i as f64).collect();
        // Pin the endpoint so t[last] == end exactly.
        times[samples - 1] = end;
        Self::new(times)
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }
}

/// Work counters for one integration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// States sampled at the requested grid times. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
    stats: SolverStats,
}

impl Trajectory {
    pub(crate) fn new(times: Vec<f64>, states: Vec<Vec<f64>>, stats: SolverStats) -> Self {
        debug_assert_eq!(times.len(), states.len());
        Self {
            times,
            states,
            stats,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// The state at the first grid time.
    pub fn initial_state(&self) -> &[f64] {
        &self.states[0]
    }

    pub fn final_state(&self) -> &[f64] {
        &self.states[self.states.len() - 1]
    }

    /// One state component across all samples.
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.states.iter().map(|s| s[index]).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.states.iter().map(|s| s.as_slice()))
    }
}
