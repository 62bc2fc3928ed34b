//! Parameter structures for the virtual patient and its controller.
//!
//! Every section can be loaded from its own JSON file; missing or malformed
//! files fall back to the documented defaults.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

use crate::control::rbf::NEURON_COUNT;
use crate::simulation::SimulationError;

/// Minutes in one simulated day
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Top-level parameters container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameters {
    /// Physiological constants of the plant
    pub patient: PatientParameters,
    /// Daily meal schedule
    pub meals: MealParameters,
    /// RBF disturbance estimator layout
    pub estimator: EstimatorParameters,
    /// Control law and actuator limits
    pub controller: ControllerParameters,
    /// Time axis and regulation target
    pub simulation: SimulationParameters,
}

impl Parameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        Self::load_from_dir("data/parameters")
    }

    /// Load parameters from specific directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            patient: load_section(dir.join("patient.json"), "patient"),
            meals: load_section(dir.join("meals.json"), "meal"),
            estimator: load_section(dir.join("estimator.json"), "estimator"),
            controller: load_section(dir.join("controller.json"), "controller"),
            simulation: load_section(dir.join("simulation.json"), "simulation"),
        }
    }

    /// Reject parameter sets the simulation cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let sim = &self.simulation;
        if !(sim.dt_min > 0.0 && sim.dt_min.is_finite()) {
            return Err(invalid(format!("time step must be positive, got {}", sim.dt_min)));
        }
        if !(sim.duration_min >= 0.0 && sim.duration_min.is_finite()) {
            return Err(invalid(format!(
                "duration must be non-negative, got {}",
                sim.duration_min
            )));
        }
        if sim.baseline_glucose_mg_per_dL < 0.0 {
            return Err(invalid("baseline glucose must be non-negative".to_string()));
        }

        let p = &self.patient;
        for (name, value) in [
            ("tau1_min", p.tau1_min),
            ("tau2_min", p.tau2_min),
            ("insulin_clearance_mL_per_min", p.insulin_clearance_mL_per_min),
            ("glucose_volume_dL", p.glucose_volume_dL),
            ("meal_peak_time_min", p.meal_peak_time_min),
        ] {
            if value <= 0.0 {
                return Err(invalid(format!("{} must be positive, got {}", name, value)));
            }
        }

        if let Some(w) = self.estimator.widths.iter().find(|w| **w <= 0.0) {
            return Err(invalid(format!("RBF widths must be positive, got {}", w)));
        }
        if self.estimator.weight_bound <= 0.0 {
            return Err(invalid("weight bound must be positive".to_string()));
        }

        let c = &self.controller;
        if c.b_hat == 0.0 || !c.b_hat.is_finite() {
            return Err(invalid(format!(
                "control effectiveness b_hat must be nonzero, got {}",
                c.b_hat
            )));
        }
        if c.min_infusion_uU_per_min > c.max_infusion_uU_per_min {
            return Err(invalid("infusion bounds are inverted".to_string()));
        }
        if c.learning_schedule.is_empty() {
            return Err(invalid("learning-rate schedule is empty".to_string()));
        }
        if c.learning_schedule
            .windows(2)
            .any(|pair| pair[1].start_min <= pair[0].start_min)
        {
            return Err(invalid(
                "learning-rate schedule must be strictly ascending in time".to_string(),
            ));
        }

        let m = &self.meals;
        if m.absorption_duration_min <= 0.0 {
            return Err(invalid("meal absorption duration must be positive".to_string()));
        }
        if let Some(slot) = m
            .slots
            .iter()
            .find(|s| s.time_of_day_min < 0.0 || s.time_of_day_min >= MINUTES_PER_DAY)
        {
            return Err(invalid(format!(
                "meal '{}' is scheduled outside the day: {} min",
                slot.name, slot.time_of_day_min
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> SimulationError {
    SimulationError::InvalidConfig(message)
}

fn load_section<T, P>(path: P, label: &str) -> T
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(params) => {
                log::info!("Loaded {} parameters from {:?}", label, path.as_ref());
                params
            }
            Err(e) => {
                log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
                T::default()
            }
        },
        Err(_) => {
            log::info!("{} parameters file not found, using defaults", label);
            T::default()
        }
    }
}

/// Physiological constants of the insulin/glucose plant.
///
/// Population means of the identifiable virtual patient model, Materials
/// and Methods of Kanderian et al., J Diabetes Sci Technol 2009. The first
/// seven enter the state equations (1); VG and τm enter the meal
/// appearance rate (2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientParameters {
    /// Subcutaneous pharmacokinetic time constant (min)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (1)
    pub tau1_min: f64,
    /// Plasma pharmacokinetic time constant (min)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (1)
    pub tau2_min: f64,
    /// Insulin clearance (mL/min)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (1)
    pub insulin_clearance_mL_per_min: f64,
    /// Rate constant of insulin action (min⁻¹)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (1)
    pub p2_per_min: f64,
    /// Insulin sensitivity (mL/μU/min)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (1)
    pub insulin_sensitivity: f64,
    /// Glucose effectiveness at zero insulin (min⁻¹)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (1)
    pub gezi_per_min: f64,
    /// Endogenous glucose production (mg/dL/min)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (1)
    pub egp_mg_per_dL_min: f64,
    /// Glucose distribution volume (dL)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (2)
    pub glucose_volume_dL: f64,
    /// Peak time of meal glucose appearance (min)
    /// Source: Kanderian et al., J Diabetes Sci Technol 2009, eq. (2)
    pub meal_peak_time_min: f64,
}

impl Default for PatientParameters {
    fn default() -> Self {
        Self {
            tau1_min: 49.0,
            tau2_min: 47.0,
            insulin_clearance_mL_per_min: 2010.0,
            p2_per_min: 1.06e-2,
            insulin_sensitivity: 8.11e-4,
            gezi_per_min: 2.2e-3,
            egp_mg_per_dL_min: 1.33,
            glucose_volume_dL: 253.0,
            meal_peak_time_min: 40.5,
        }
    }
}

impl PatientParameters {
    /// Glucose level the plant settles at without insulin or meals (mg/dL)
    pub fn zero_insulin_equilibrium_mg_per_dL(&self) -> f64 {
        self.egp_mg_per_dL_min / self.gezi_per_min
    }
}

/// One recurring meal in the daily schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSlotParameters {
    /// Display name used in meal-onset log lines
    pub name: String,
    /// Minute of the day the meal starts
    pub time_of_day_min: f64,
    /// Ingested carbohydrate (mg)
    pub carbohydrate_mg: f64,
}

impl MealSlotParameters {
    pub fn new(name: &str, time_of_day_min: f64, carbohydrate_g: f64) -> Self {
        Self {
            name: name.to_string(),
            time_of_day_min,
            carbohydrate_mg: carbohydrate_g * 1000.0,
        }
    }
}

/// Daily meal schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MealParameters {
    /// Time after onset at which a meal stops contributing glucose (min)
    pub absorption_duration_min: f64,
    /// Meals in the order they are checked each step
    pub slots: Vec<MealSlotParameters>,
}

impl MealParameters {
    /// A schedule with no meals
    pub fn fasting() -> Self {
        Self {
            slots: Vec::new(),
            ..Self::default()
        }
    }
}

impl Default for MealParameters {
    fn default() -> Self {
        Self {
            absorption_duration_min: 180.0,
            slots: vec![
                MealSlotParameters::new("Breakfast", 7.5 * 60.0, 42.0),
                MealSlotParameters::new("Lunch", 12.5 * 60.0, 66.0),
                MealSlotParameters::new("Dinner", 19.5 * 60.0, 51.0),
            ],
        }
    }
}

/// Layout of the RBF disturbance estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParameters {
    /// Gaussian centers in control-error units (mg/dL)
    pub centers: [f64; NEURON_COUNT],
    /// Gaussian widths in control-error units (mg/dL)
    pub widths: [f64; NEURON_COUNT],
    /// Euclidean norm bound ϑ on the weight vector
    pub weight_bound: f64,
}

impl Default for EstimatorParameters {
    fn default() -> Self {
        Self {
            centers: [-25.0, -10.0, -8.0, -5.0, -2.0, 0.0, 5.0, 10.0, 20.0, 40.0, 100.0],
            widths: [20.0, 15.0, 10.0, 8.0, 5.0, 5.0, 5.0, 20.0, 40.0, 100.0, 200.0],
            weight_bound: 3.0e4,
        }
    }
}

/// Learning rate in effect from `start_min` until the next entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningRateStep {
    pub start_min: f64,
    pub rate: f64,
}

/// Control law gains and actuator limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerParameters {
    /// Proportional gain on the control error
    pub control_gain: f64,
    /// Nominal drift term f̂
    pub f_hat: f64,
    /// Nominal control effectiveness b̂ (must be nonzero)
    pub b_hat: f64,
    /// Lower infusion limit (μU/min)
    pub min_infusion_uU_per_min: f64,
    /// Upper infusion limit (μU/min)
    pub max_infusion_uU_per_min: f64,
    /// Piecewise-constant learning-rate schedule, ascending in time
    pub learning_schedule: Vec<LearningRateStep>,
}

impl Default for ControllerParameters {
    fn default() -> Self {
        Self {
            control_gain: 1.0,
            f_hat: 0.0,
            b_hat: 1.0,
            min_infusion_uU_per_min: 0.0,
            max_infusion_uU_per_min: 3.0e4,
            learning_schedule: vec![
                LearningRateStep { start_min: 0.0, rate: 0.5 },
                LearningRateStep { start_min: MINUTES_PER_DAY, rate: 0.1 },
                LearningRateStep { start_min: 3.0 * MINUTES_PER_DAY, rate: 0.05 },
            ],
        }
    }
}

/// Time axis and regulation target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Fixed integration step (min)
    pub dt_min: f64,
    /// Total simulated time (min)
    pub duration_min: f64,
    /// Regulation target (mg/dL)
    pub target_glucose_mg_per_dL: f64,
    /// Blood glucose at t = 0 (mg/dL)
    pub baseline_glucose_mg_per_dL: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            dt_min: 1.0e-3,
            duration_min: 7.0 * MINUTES_PER_DAY,
            target_glucose_mg_per_dL: 110.0,
            baseline_glucose_mg_per_dL: 100.0,
        }
    }
}

impl SimulationParameters {
    /// Number of fixed steps covering the configured duration
    pub fn total_steps(&self) -> u64 {
        (self.duration_min / self.dt_min).round() as u64
    }
}
