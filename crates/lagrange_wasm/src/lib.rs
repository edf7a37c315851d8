//! Browser bridge: compute trajectory documents in-page.

mod scenarios;

pub use scenarios::{list_scenarios, run_builtin_scenario};

use js_sys::Float64Array;
use lagrange_core::traits::{Conservative, DynamicalSystem};
use lagrange_core::{
    solve_on_grid, MechanicalSystem, SimResult, SolverSettings, SystemKind, TimeGrid,
    TrajectoryDocument, TrajectoryExporter,
};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

pub(crate) fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

/// Maps become plain objects, matching the on-disk JSON document.
pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| js_error("Serialization error", e))
}

#[wasm_bindgen]
pub struct WasmSystem {
    system: MechanicalSystem,
}

#[wasm_bindgen]
impl WasmSystem {
    /// Builds the named system (e.g. `"ball-in-cone"`) with default parameters.
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str) -> Result<WasmSystem, JsValue> {
        console_error_panic_hook::set_once();
        let kind: SystemKind = name.parse().map_err(|e| js_error("Unknown system", e))?;
        Ok(WasmSystem {
            system: MechanicalSystem::default_for(kind),
        })
    }

    pub fn dimension(&self) -> usize {
        self.system.dimension()
    }

    pub fn labels(&self) -> Vec<String> {
        self.system
            .coordinate_names()
            .iter()
            .map(|label| label.to_string())
            .collect()
    }

    pub fn derivative(&self, t: f64, state: &[f64]) -> Result<Float64Array, JsValue> {
        let out = self
            .derivative_values(t, state)
            .map_err(|e| js_error("Derivative failed", e))?;
        Ok(Float64Array::from(out.as_slice()))
    }

    pub fn energy(&self, state: &[f64]) -> Result<f64, JsValue> {
        self.check_arity(state)
            .map_err(|e| js_error("Energy failed", e))?;
        Ok(self.system.energy(state))
    }

    pub fn simulate(
        &self,
        y0: Vec<f64>,
        t_start: f64,
        t_end: f64,
        samples: usize,
        rtol: f64,
        atol: f64,
    ) -> Result<JsValue, JsValue> {
        let settings = SolverSettings {
            rtol,
            atol,
            ..SolverSettings::default()
        };
        let document = self
            .simulate_document(&y0, t_start, t_end, samples, &settings)
            .map_err(|e| js_error("Simulation failed", e))?;
        to_value(&document)
    }
}

impl WasmSystem {
    fn check_arity(&self, state: &[f64]) -> SimResult<()> {
        let expected = self.system.dimension();
        if state.len() != expected {
            return Err(lagrange_core::SimulationError::DimensionMismatch {
                expected,
                got: state.len(),
            });
        }
        Ok(())
    }

    fn derivative_values(&self, t: f64, state: &[f64]) -> SimResult<Vec<f64>> {
        self.check_arity(state)?;
        let mut out = vec![0.0; state.len()];
        self.system.apply(t, state, &mut out)?;
        Ok(out)
    }

    fn simulate_document(
        &self,
        y0: &[f64],
        t_start: f64,
        t_end: f64,
        samples: usize,
        settings: &SolverSettings,
    ) -> SimResult<TrajectoryDocument> {
        let grid = TimeGrid::linspace(t_start, t_end, samples)?;
        let trajectory = solve_on_grid(&self.system, y0, &grid, settings)?;
        TrajectoryExporter::default().build_for(&self.system, &trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lagrange_core::SimulationError;

    fn system(kind: SystemKind) -> WasmSystem {
        WasmSystem {
            system: MechanicalSystem::default_for(kind),
        }
    }

    #[test]
    fn labels_follow_the_system() {
        let cone = system(SystemKind::BallInCone);
        assert_eq!(cone.dimension(), 4);
        assert_eq!(cone.labels(), vec!["z", "phi", "d/dt z", "d/dt phi"]);
    }

    #[test]
    fn derivative_checks_arity_and_singularity() {
        let cone = system(SystemKind::BallInCone);
        assert!(matches!(
            cone.derivative_values(0.0, &[1.0, 0.0]),
            Err(SimulationError::DimensionMismatch { expected: 4, got: 2 })
        ));
        assert!(matches!(
            cone.derivative_values(0.0, &[0.0; 4]),
            Err(SimulationError::SingularState(_))
        ));
        let out = cone
            .derivative_values(0.0, &[1.0, 0.0, 0.5, 3.0])
            .expect("derivative");
        assert_eq!(out[0], 0.5);
        assert_eq!(out[1], 3.0);
    }

    #[test]
    fn simulate_builds_a_document() {
        let pendulum = system(SystemKind::SimplePendulum);
        let document = pendulum
            .simulate_document(&[0.2, 0.0], 0.0, 5.0, 100, &SolverSettings::default())
            .expect("simulate");
        assert_eq!(document.times().len(), 100);
        assert_eq!(document.points().len(), 1);
        assert!((document.points()[0].x[0] - 19.867).abs() < 1e-3);
    }
}
