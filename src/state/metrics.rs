//! Run-level diagnostics for export and console reporting.
//!
//! Aggregates glucose statistics, clamp events and estimator activity over a
//! whole run. Updating metrics never feeds back into the simulation.

use serde::{Deserialize, Serialize};

/// Lower edge of the normoglycemic range (mg/dL)
pub const HYPOGLYCEMIA_THRESHOLD_MG_PER_DL: f64 = 70.0;
/// Upper edge of the normoglycemic range (mg/dL)
pub const HYPERGLYCEMIA_THRESHOLD_MG_PER_DL: f64 = 180.0;

/// Glycemic status relative to the normoglycemic range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GlycemicStatus {
    Hypoglycemic,
    #[default]
    InRange,
    Hyperglycemic,
}

impl GlycemicStatus {
    pub fn from_glucose(glucose_mg_per_dL: f64) -> Self {
        if glucose_mg_per_dL < HYPOGLYCEMIA_THRESHOLD_MG_PER_DL {
            GlycemicStatus::Hypoglycemic
        } else if glucose_mg_per_dL > HYPERGLYCEMIA_THRESHOLD_MG_PER_DL {
            GlycemicStatus::Hyperglycemic
        } else {
            GlycemicStatus::InRange
        }
    }
}

/// Aggregated statistics of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Plant steps executed
    pub steps: u64,
    /// Simulated time covered (min)
    pub simulated_min: f64,

    // === Glucose ===
    pub min_glucose_mg_per_dL: f64,
    pub max_glucose_mg_per_dL: f64,
    /// Running sum for the mean
    glucose_sum: f64,
    pub steps_hypoglycemic: u64,
    pub steps_in_range: u64,
    pub steps_hyperglycemic: u64,

    // === Meals ===
    pub meals_started: u64,

    // === Actuator ===
    pub infusion_clamped_low: u64,
    pub infusion_clamped_high: u64,

    // === Estimator ===
    pub projected_updates: u64,
    pub max_weight_norm: f64,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self {
            steps: 0,
            simulated_min: 0.0,
            min_glucose_mg_per_dL: f64::INFINITY,
            max_glucose_mg_per_dL: f64::NEG_INFINITY,
            glucose_sum: 0.0,
            steps_hypoglycemic: 0,
            steps_in_range: 0,
            steps_hyperglycemic: 0,
            meals_started: 0,
            infusion_clamped_low: 0,
            infusion_clamped_high: 0,
            projected_updates: 0,
            max_weight_norm: 0.0,
        }
    }
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one plant step ending at `time_min`
    pub fn record_glucose(&mut self, time_min: f64, glucose_mg_per_dL: f64) {
        self.steps += 1;
        self.simulated_min = time_min;
        self.min_glucose_mg_per_dL = self.min_glucose_mg_per_dL.min(glucose_mg_per_dL);
        self.max_glucose_mg_per_dL = self.max_glucose_mg_per_dL.max(glucose_mg_per_dL);
        self.glucose_sum += glucose_mg_per_dL;

        match GlycemicStatus::from_glucose(glucose_mg_per_dL) {
            GlycemicStatus::Hypoglycemic => self.steps_hypoglycemic += 1,
            GlycemicStatus::InRange => self.steps_in_range += 1,
            GlycemicStatus::Hyperglycemic => self.steps_hyperglycemic += 1,
        }
    }

    pub fn record_weight_norm(&mut self, norm: f64) {
        self.max_weight_norm = self.max_weight_norm.max(norm);
    }

    pub fn mean_glucose_mg_per_dL(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.glucose_sum / self.steps as f64
    }

    /// Fraction of steps spent in 70-180 mg/dL
    pub fn time_in_range_fraction(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.steps_in_range as f64 / self.steps as f64
    }
}
