//! Built-in scenarios exposed to JavaScript.

use crate::{js_error, to_value};
use lagrange_core::{builtin_scenarios, run_scenario, Scenario, SolverSettings};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct ScenarioSummary {
    name: String,
    system: String,
    y0: Vec<f64>,
    t_start: f64,
    t_end: f64,
    samples: usize,
}

impl From<&Scenario> for ScenarioSummary {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            system: scenario.kind().to_string(),
            y0: scenario.y0.clone(),
            t_start: scenario.t_start,
            t_end: scenario.t_end,
            samples: scenario.samples,
        }
    }
}

fn summaries() -> Vec<ScenarioSummary> {
    builtin_scenarios().iter().map(ScenarioSummary::from).collect()
}

#[wasm_bindgen]
pub fn list_scenarios() -> Result<JsValue, JsValue> {
    to_value(&summaries())
}

/// Runs a built-in scenario with default solver settings and returns its
/// trajectory document.
#[wasm_bindgen]
pub fn run_builtin_scenario(name: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let scenario = Scenario::find(name).map_err(|e| js_error("Unknown scenario", e))?;
    let outcome = run_scenario(&scenario, &SolverSettings::default())
        .map_err(|e| js_error("Simulation failed", e))?;
    to_value(&outcome.document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries_mirror_builtin_scenarios() {
        let summaries = summaries();
        assert_eq!(summaries.len(), builtin_scenarios().len());
        let cone = summaries
            .iter()
            .find(|s| s.name == "ball-in-cone")
            .expect("ball-in-cone summary");
        assert_eq!(cone.system, "ball-in-cone");
        assert_eq!(cone.y0, vec![1.0, 0.0, 0.0, 3.0]);
    }
}
