//! JSON export of a finished run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::config::Parameters;
use crate::control::NEURON_COUNT;
use crate::simulation::Simulation;
use crate::state::{PatientState, RunMetrics};

/// Summary of a run: parameters, final state and diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    pub parameters: Parameters,
    pub final_state: PatientState,
    pub final_infusion_uU_per_min: f64,
    /// Control error after the last step (mg/dL)
    pub final_error_mg_per_dL: f64,
    /// Disturbance estimate after the last step
    pub final_disturbance: f64,
    pub final_weights: [f64; NEURON_COUNT],
    pub final_weight_norm: f64,
    pub mean_glucose_mg_per_dL: f64,
    pub time_in_range_fraction: f64,
    pub metrics: RunMetrics,
}

impl RunSummary {
    pub fn from_simulation(sim: &Simulation, parameters: &Parameters) -> Self {
        let metrics = sim.metrics().clone();
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            parameters: parameters.clone(),
            final_state: sim.state,
            final_infusion_uU_per_min: sim.controller().infusion_uU_per_min(),
            final_error_mg_per_dL: sim.last_error(),
            final_disturbance: sim.last_disturbance(),
            final_weights: *sim.network().weights(),
            final_weight_norm: sim.network().norm(),
            mean_glucose_mg_per_dL: metrics.mean_glucose_mg_per_dL(),
            time_in_range_fraction: metrics.time_in_range_fraction(),
            metrics,
        }
    }
}

/// Export a run summary to a specific file
pub fn export_summary_json<P: AsRef<Path>>(summary: &RunSummary, path: P) -> Result<PathBuf> {
    let path = path.as_ref().to_path_buf();
    let file = std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)?;

    log::info!("JSON summary exported: {}", path.display());
    Ok(path)
}
