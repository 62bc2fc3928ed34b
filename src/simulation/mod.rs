//! Closed-loop orchestration of plant, meals, estimator and controller.

mod error;
pub mod orchestrator;

pub use error::SimulationError;
pub use orchestrator::{Simulation, StepObserver, StepRecord};
