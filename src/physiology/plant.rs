//! Insulin/glucose plant model.
//!
//! Four coupled ODEs describe subcutaneous insulin absorption, plasma insulin
//! kinetics, remote insulin action and blood glucose:
//!
//! ```text
//! dISC/dt  = -ISC/τ1 + u/(τ1·CI)
//! dI/dt    = (ISC - I)/τ2
//! dIEFF/dt = -p2·IEFF + p2·SI·I
//! dG/dt    = -(GEZI + IEFF)·G + EGP + RA
//! ```
//!
//! `u` is the insulin infusion (μU/min) and `RA` the meal glucose appearance
//! rate (mg/dL/min). Both are held constant over one integration step.

use crate::config::PatientParameters;
use crate::simulation::SimulationError;
use crate::state::patient::{
    PatientState, BLOOD_GLUCOSE, INSULIN_EFFECT, PLASMA_INSULIN, STATE_DIM, SUBCUTANEOUS_INSULIN,
};

use super::integrator::Rk4Integrator;

/// Plant model with its fixed-step integrator
#[derive(Debug, Clone)]
pub struct PlantModel {
    /// Physiological constants
    pub params: PatientParameters,
    integrator: Rk4Integrator<STATE_DIM>,
}

impl PlantModel {
    pub fn new(params: PatientParameters, dt_min: f64) -> Self {
        Self {
            params,
            integrator: Rk4Integrator::new(dt_min),
        }
    }

    /// Integration step (min)
    pub fn dt_min(&self) -> f64 {
        self.integrator.dt_min
    }

    /// Number of steps taken so far
    pub fn step_count(&self) -> u64 {
        self.integrator.step_count
    }

    /// Simulated time reached by the integrator (min)
    pub fn time_min(&self) -> f64 {
        self.integrator.time_min()
    }

    /// Time derivatives of the packed state vector
    pub fn derivatives(
        params: &PatientParameters,
        y: &[f64; STATE_DIM],
        infusion_uU_per_min: f64,
        appearance_rate: f64,
        dydt: &mut [f64; STATE_DIM],
    ) {
        let isc = y[SUBCUTANEOUS_INSULIN];
        let i = y[PLASMA_INSULIN];
        let ieff = y[INSULIN_EFFECT];
        let g = y[BLOOD_GLUCOSE];

        dydt[SUBCUTANEOUS_INSULIN] = -isc / params.tau1_min
            + infusion_uU_per_min / (params.tau1_min * params.insulin_clearance_mL_per_min);
        dydt[PLASMA_INSULIN] = (isc - i) / params.tau2_min;
        dydt[INSULIN_EFFECT] =
            -params.p2_per_min * ieff + params.p2_per_min * params.insulin_sensitivity * i;
        dydt[BLOOD_GLUCOSE] =
            -(params.gezi_per_min + ieff) * g + params.egp_mg_per_dL_min + appearance_rate;
    }

    /// Derivatives of a patient state, in state form
    pub fn state_derivatives(
        &self,
        state: &PatientState,
        infusion_uU_per_min: f64,
        appearance_rate: f64,
    ) -> PatientState {
        let mut dydt = [0.0; STATE_DIM];
        Self::derivatives(
            &self.params,
            &state.to_array(),
            infusion_uU_per_min,
            appearance_rate,
            &mut dydt,
        );
        PatientState::from_array(&dydt)
    }

    /// Advance the patient by one fixed step.
    ///
    /// A non-finite component or a negative glucose level leaves `state`
    /// untouched and is reported as a fatal error.
    pub fn step(
        &mut self,
        state: &mut PatientState,
        infusion_uU_per_min: f64,
        appearance_rate: f64,
    ) -> Result<(), SimulationError> {
        let params = &self.params;
        let mut y = state.to_array();
        self.integrator.step(&mut y, |y, dydt| {
            Self::derivatives(params, y, infusion_uU_per_min, appearance_rate, dydt)
        });

        let next = PatientState::from_array(&y);
        let step = self.integrator.step_count;
        if !next.is_finite() {
            return Err(SimulationError::NonFiniteState { step, state: next });
        }
        if next.blood_glucose_mg_per_dL < 0.0 {
            return Err(SimulationError::NegativeGlucose {
                step,
                glucose_mg_per_dL: next.blood_glucose_mg_per_dL,
            });
        }

        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_derivatives() {
        let plant = PlantModel::new(PatientParameters::default(), 1e-3);
        let d = plant.state_derivatives(&PatientState::default(), 0.0, 0.0);

        assert_eq!(d.subcutaneous_insulin_uU_per_mL, 0.0);
        assert_eq!(d.plasma_insulin_uU_per_mL, 0.0);
        assert_eq!(d.insulin_effect_per_min, 0.0);
        // EGP - GEZI * G = 1.33 - 0.22
        assert!((d.blood_glucose_mg_per_dL - 1.11).abs() < 1e-12);
    }

    #[test]
    fn test_infusion_drives_depot() {
        let plant = PlantModel::new(PatientParameters::default(), 1e-3);
        let d = plant.state_derivatives(&PatientState::default(), 2010.0 * 49.0, 0.0);
        assert!((d.subcutaneous_insulin_uU_per_mL - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_advances_counter() {
        let mut plant = PlantModel::new(PatientParameters::default(), 1e-3);
        let mut state = PatientState::default();
        plant.step(&mut state, 0.0, 0.0).unwrap();
        assert_eq!(plant.step_count(), 1);
        assert!((plant.time_min() - 1e-3).abs() < 1e-18);
        assert!(state.blood_glucose_mg_per_dL > 100.0);
    }

    #[test]
    fn test_non_finite_is_fatal() {
        let mut plant = PlantModel::new(PatientParameters::default(), 1e-3);
        let mut state = PatientState::default();
        let before = state;

        let result = plant.step(&mut state, f64::INFINITY, 0.0);
        assert!(matches!(result, Err(SimulationError::NonFiniteState { step: 1, .. })));
        assert_eq!(state, before);
    }

    #[test]
    fn test_negative_glucose_is_fatal() {
        let mut plant = PlantModel::new(PatientParameters::default(), 1.0);
        let mut state = PatientState::baseline(0.0);

        let result = plant.step(&mut state, 0.0, -1.0e3);
        assert!(matches!(result, Err(SimulationError::NegativeGlucose { .. })));
    }
}
