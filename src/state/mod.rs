//! State management for the virtual patient simulation.
//!
//! Contains the physiological state advanced by the plant integrator and the
//! diagnostics accumulated over a run.

mod metrics;
pub mod patient;

pub use metrics::{
    GlycemicStatus, RunMetrics, HYPERGLYCEMIA_THRESHOLD_MG_PER_DL, HYPOGLYCEMIA_THRESHOLD_MG_PER_DL,
};
pub use patient::PatientState;
