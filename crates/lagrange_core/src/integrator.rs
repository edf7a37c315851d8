//! Adaptive Dormand-Prince integration sampled on a caller-supplied time grid.
//!
//! The solver steps freely between `t[0]` and `t[last]`; output times that
//! fall inside an accepted step are read off the step's continuous
//! interpolant instead of forcing a step boundary onto them. Only the final
//! step is clipped so that it lands on the last requested time.

use crate::dopri5::{DormandPrince, STAGES_PER_STEP};
use crate::error::{BudgetLimit, SimResult, SimulationError};
use crate::traits::DynamicalSystem;
use crate::trajectory::{SolverStats, TimeGrid, Trajectory};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub rtol: f64,
    pub atol: f64,
    pub safety: f64,
    /// Smallest factor a step may shrink by in one retry.
    pub min_factor: f64,
    /// Largest factor a step may grow by after an accepted step.
    pub max_factor: f64,
    pub initial_step: Option<f64>,
    pub max_step: Option<f64>,
    /// Budget on attempted (accepted + rejected) steps.
    pub max_steps: usize,
    #[serde(skip)]
    pub max_wall_time: Option<Duration>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rtol: 1.49012e-8,
            atol: 1.49012e-8,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 10.0,
            initial_step: None,
            max_step: None,
            max_steps: 100_000,
            max_wall_time: None,
        }
    }
}

impl SolverSettings {
    /// Same settings with `rtol = atol = tolerance`.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            rtol: tolerance,
            atol: tolerance,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let invalid = |reason: &str| {
            Err(SimulationError::InvalidSettings {
                reason: reason.to_string(),
            })
        };
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return invalid("rtol must be positive and finite");
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return invalid("atol must be positive and finite");
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return invalid("safety must be in (0, 1]");
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0) {
            return invalid("min_factor must be in (0, 1)");
        }
        if !(self.max_factor.is_finite() && self.max_factor > 1.0) {
            return invalid("max_factor must be finite and greater than 1");
        }
        if let Some(h) = self.initial_step {
            if !(h.is_finite() && h > 0.0) {
                return invalid("initial_step must be positive and finite");
            }
        }
        if let Some(h) = self.max_step {
            if !(h > 0.0) {
                return invalid("max_step must be positive");
            }
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be greater than zero");
        }
        Ok(())
    }

    fn step_cap(&self) -> f64 {
        self.max_step.unwrap_or(f64::INFINITY)
    }
}

/// Integrates `system` from `times[0]` with state `y0` and samples the
/// solution at every entry of `times`.
pub fn solve<S: DynamicalSystem>(
    system: &S,
    y0: &[f64],
    times: &[f64],
    settings: &SolverSettings,
) -> SimResult<Trajectory> {
    let grid = TimeGrid::new(times.to_vec())?;
    solve_on_grid(system, y0, &grid, settings)
}

pub fn solve_on_grid<S: DynamicalSystem>(
    system: &S,
    y0: &[f64],
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> SimResult<Trajectory> {
    settings.validate()?;
    let dim = system.dimension();
    if y0.len() != dim {
        return Err(SimulationError::DimensionMismatch {
            expected: dim,
            got: y0.len(),
        });
    }
    if let Some(idx) = y0.iter().position(|v| !v.is_finite()) {
        return Err(SimulationError::InvalidInitialState {
            reason: format!("component {idx} is not finite"),
        });
    }

    let t_out = grid.as_slice();
    let t0 = grid.start();
    let t_end = grid.end();
    let mut out_times = Vec::with_capacity(t_out.len());
    let mut out_states = Vec::with_capacity(t_out.len());
    out_times.push(t0);
    out_states.push(y0.to_vec());

    let mut stats = SolverStats::default();
    if t_out.len() == 1 {
        return Ok(Trajectory::new(out_times, out_states, stats));
    }

    debug!(
        dim,
        samples = t_out.len(),
        t0,
        t_end,
        rtol = settings.rtol,
        atol = settings.atol,
        "starting integration"
    );

    let mut stepper = DormandPrince::new(dim);
    let mut y = y0.to_vec();
    let mut t = t0;
    stepper.seed(system, t, &y)?;
    stats.evaluations += 1;

    let span = t_end - t0;
    let mut h = match settings.initial_step {
        Some(h) => h,
        None => initial_step(system, t, &y, stepper.first_stage(), settings, &mut stats)?,
    };
    h = h.min(settings.step_cap()).min(span);

    let started = settings.max_wall_time.map(|budget| (Instant::now(), budget));
    let mut next_out = 1usize;
    let mut steps = 0usize;
    let mut last_rejected = false;
    let mut buffer = vec![0.0; dim];

    loop {
        if steps >= settings.max_steps {
            return Err(budget_exceeded(t, steps, BudgetLimit::MaxSteps(settings.max_steps)));
        }
        if let Some((start, budget)) = started {
            if start.elapsed() >= budget {
                return Err(budget_exceeded(t, steps, BudgetLimit::WallClock(budget)));
            }
        }
        let h_min = 16.0 * f64::EPSILON * t.abs().max(t_end.abs()).max(f64::MIN_POSITIVE);
        if h < h_min {
            return Err(budget_exceeded(t, steps, BudgetLimit::StepSizeUnderflow(h)));
        }

        let mut last = false;
        if t + 1.01 * h >= t_end {
            h = t_end - t;
            last = true;
        }

        steps += 1;
        let err = stepper.attempt(system, t, &y, h, settings.rtol, settings.atol)?;
        stats.evaluations += STAGES_PER_STEP;

        if err.is_finite() && err <= 1.0 {
            stats.accepted_steps += 1;
            let t_new = if last { t_end } else { t + h };

            stepper.accept(&mut y, h);
            while next_out < t_out.len() && t_out[next_out] < t_new {
                let tk = t_out[next_out];
                stepper.interpolate((tk - t) / h, &mut buffer);
                out_times.push(tk);
                out_states.push(buffer.clone());
                next_out += 1;
            }
            // An output time on the step boundary takes the step's own state.
            if next_out < t_out.len() && t_out[next_out] == t_new {
                out_times.push(t_new);
                out_states.push(y.clone());
                next_out += 1;
            }

            t = t_new;
            if next_out >= t_out.len() {
                break;
            }

            let mut factor = step_factor(err, settings);
            if last_rejected {
                factor = factor.min(1.0);
            }
            last_rejected = false;
            h = (h * factor).min(settings.step_cap());
        } else {
            stats.rejected_steps += 1;
            let factor = if err.is_finite() {
                step_factor(err, settings).min(1.0)
            } else {
                settings.min_factor
            };
            trace!(t, h, err, factor, "step rejected");
            last_rejected = true;
            h *= factor;
        }
    }

    debug!(
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        evaluations = stats.evaluations,
        "integration finished"
    );

    Ok(Trajectory::new(out_times, out_states, stats))
}

fn step_factor(err: f64, settings: &SolverSettings) -> f64 {
    if err == 0.0 {
        return settings.max_factor;
    }
    (settings.safety * err.powf(-0.2)).clamp(settings.min_factor, settings.max_factor)
}

fn budget_exceeded(t: f64, steps: usize, limit: BudgetLimit) -> SimulationError {
    warn!(t_reached = t, steps, %limit, "integration budget exhausted");
    SimulationError::StepBudgetExceeded {
        t_reached: t,
        steps,
        limit,
    }
}

/// Starting step size from the size of `y0`, `f(t0, y0)` and one explicit
/// Euler probe (Hairer, Norsett & Wanner, II.4).
fn initial_step<S: DynamicalSystem>(
    system: &S,
    t: f64,
    y: &[f64],
    f0: &[f64],
    settings: &SolverSettings,
    stats: &mut SolverStats,
) -> SimResult<f64> {
    let dim = y.len();
    let scale: Vec<f64> = y
        .iter()
        .map(|v| settings.atol + settings.rtol * v.abs())
        .collect();

    let dnf: f64 = f0.iter().zip(&scale).map(|(f, s)| (f / s).powi(2)).sum();
    let dny: f64 = y.iter().zip(&scale).map(|(v, s)| (v / s).powi(2)).sum();
    let mut h = if dnf <= 1e-10 || dny <= 1e-10 {
        1e-6
    } else {
        (dny / dnf).sqrt() * 0.01
    };
    h = h.min(settings.step_cap());

    let probe: Vec<f64> = y.iter().zip(f0).map(|(v, f)| v + h * f).collect();
    let mut f1 = vec![0.0; dim];
    system.apply(t + h, &probe, &mut f1)?;
    stats.evaluations += 1;

    let der2 = f1
        .iter()
        .zip(f0)
        .zip(&scale)
        .map(|((a, b), s)| ((a - b) / s).powi(2))
        .sum::<f64>()
        .sqrt()
        / h;
    let der12 = der2.abs().max(dnf.sqrt());
    let h1 = if der12 <= 1e-15 {
        (h * 1e-3).max(1e-6)
    } else {
        (0.01 / der12).powf(0.2)
    };

    Ok((100.0 * h).min(h1).min(settings.step_cap()))
}
