//! Fatal simulation errors.

use thiserror::Error;

use crate::state::PatientState;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// The integrator produced NaN or infinity
    #[error("non-finite patient state at step {step}: {state:?}")]
    NonFiniteState { step: u64, state: PatientState },

    #[error("blood glucose went negative at step {step}: {glucose_mg_per_dL} mg/dL")]
    NegativeGlucose { step: u64, glucose_mg_per_dL: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A per-step recorder failed; the run stops so output stays complete
    #[error("step observer failed: {0}")]
    Observer(String),
}
