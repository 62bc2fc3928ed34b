//! Configuration module for loading simulation parameters.
//!
//! Physiological constants, the meal schedule, estimator layout and
//! controller gains live in immutable records handed to each component at
//! construction.

mod parameters;

pub use parameters::{
    ControllerParameters, EstimatorParameters, LearningRateStep, MealParameters,
    MealSlotParameters, Parameters, PatientParameters, SimulationParameters, MINUTES_PER_DAY,
};
