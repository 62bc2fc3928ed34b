//! Virtual Patient - closed-loop glucose regulation simulator
//!
//! This library couples an insulin/glucose plant model, a meal disturbance
//! generator and an adaptive controller whose disturbance estimate comes from
//! an online-trained radial-basis-function network.

// Allow non-snake-case for unit suffixes in field names (mg_per_dL, uU_per_min, etc.)
// This follows the project convention of including units in names.
#![allow(non_snake_case)]

pub mod config;
pub mod control;
pub mod export;
pub mod physiology;
pub mod simulation;
pub mod state;

pub use config::Parameters;
pub use control::{AdaptiveController, LearningRateSchedule, RbfNetwork, NEURON_COUNT};
pub use physiology::{meal_appearance_rate, MealSchedule, PlantModel, Rk4Integrator};
pub use simulation::{Simulation, SimulationError, StepObserver, StepRecord};
pub use state::{PatientState, RunMetrics};
