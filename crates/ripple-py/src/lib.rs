use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use ripple_core::{SimConfig, Simulator};

/// Minimal PyO3 module exposing ripple-core to Python.
#[pyfunction]
fn version() -> &'static str {
    "0.1.0"
}

/// Default configuration as a JSON object.
#[pyfunction]
fn default_config_json() -> PyResult<String> {
    serde_json::to_string(&SimConfig::default()).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Run a full simulation from a JSON config and return the run summary as JSON.
#[pyfunction]
#[pyo3(signature = (config_json, sample_every = 100))]
fn run_experiment_json(config_json: &str, sample_every: usize) -> PyResult<String> {
    let config: SimConfig =
        serde_json::from_str(config_json).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let mut sim = Simulator::try_new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let summary = sim
        .try_run_experiment(sample_every)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    summary
        .to_json_pretty()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(default_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(run_experiment_json, m)?)?;
    Ok(())
}
