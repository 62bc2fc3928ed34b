//! Physiological state of the virtual patient.

use serde::{Deserialize, Serialize};

/// Number of state variables in the plant model
pub const STATE_DIM: usize = 4;

/// Index of each variable in the packed state vector
pub const SUBCUTANEOUS_INSULIN: usize = 0;
pub const PLASMA_INSULIN: usize = 1;
pub const INSULIN_EFFECT: usize = 2;
pub const BLOOD_GLUCOSE: usize = 3;

/// Insulin/glucose state advanced by the plant integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientState {
    /// Insulin concentration in the subcutaneous depot (μU/mL)
    pub subcutaneous_insulin_uU_per_mL: f64,
    /// Plasma insulin concentration (μU/mL)
    pub plasma_insulin_uU_per_mL: f64,
    /// Remote insulin action on glucose disposal (min⁻¹)
    pub insulin_effect_per_min: f64,
    /// Blood glucose concentration (mg/dL)
    pub blood_glucose_mg_per_dL: f64,
}

impl PatientState {
    /// Insulin-free state with the given glucose level
    pub fn baseline(blood_glucose_mg_per_dL: f64) -> Self {
        Self {
            subcutaneous_insulin_uU_per_mL: 0.0,
            plasma_insulin_uU_per_mL: 0.0,
            insulin_effect_per_min: 0.0,
            blood_glucose_mg_per_dL,
        }
    }

    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [
            self.subcutaneous_insulin_uU_per_mL,
            self.plasma_insulin_uU_per_mL,
            self.insulin_effect_per_min,
            self.blood_glucose_mg_per_dL,
        ]
    }

    pub fn from_array(y: &[f64; STATE_DIM]) -> Self {
        Self {
            subcutaneous_insulin_uU_per_mL: y[SUBCUTANEOUS_INSULIN],
            plasma_insulin_uU_per_mL: y[PLASMA_INSULIN],
            insulin_effect_per_min: y[INSULIN_EFFECT],
            blood_glucose_mg_per_dL: y[BLOOD_GLUCOSE],
        }
    }

    /// True when every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl Default for PatientState {
    fn default() -> Self {
        Self::baseline(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = PatientState::default();
        assert_eq!(state.subcutaneous_insulin_uU_per_mL, 0.0);
        assert_eq!(state.plasma_insulin_uU_per_mL, 0.0);
        assert_eq!(state.insulin_effect_per_min, 0.0);
        assert_eq!(state.blood_glucose_mg_per_dL, 100.0);
    }

    #[test]
    fn test_array_packing() {
        let state = PatientState {
            subcutaneous_insulin_uU_per_mL: 1.0,
            plasma_insulin_uU_per_mL: 2.0,
            insulin_effect_per_min: 3.0,
            blood_glucose_mg_per_dL: 4.0,
        };
        let y = state.to_array();
        assert_eq!(y[BLOOD_GLUCOSE], 4.0);
        assert_eq!(PatientState::from_array(&y), state);
    }

    #[test]
    fn test_non_finite_detection() {
        let mut state = PatientState::default();
        assert!(state.is_finite());
        state.insulin_effect_per_min = f64::NAN;
        assert!(!state.is_finite());
    }
}
