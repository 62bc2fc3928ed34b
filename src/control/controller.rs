//! Disturbance-rejecting insulin controller.
//!
//! ```text
//! u = (1/b̂) · (-f̂ - k·e + d̂)
//! ```
//!
//! where e is the control error, d̂ the RBF disturbance estimate, k the
//! proportional gain and f̂, b̂ the nominal drift and control effectiveness.
//! The command is clamped to the pump's safe range.

use crate::config::{ControllerParameters, LearningRateStep};
use crate::simulation::SimulationError;

/// Adaptive controller holding the current infusion command
#[derive(Debug, Clone)]
pub struct AdaptiveController {
    pub control_gain: f64,
    pub f_hat: f64,
    b_hat: f64,
    min_infusion_uU_per_min: f64,
    max_infusion_uU_per_min: f64,
    /// Command applied during the next plant step (μU/min)
    infusion_uU_per_min: f64,
    /// Commands raised to the lower limit
    pub clamped_low: u64,
    /// Commands cut to the upper limit
    pub clamped_high: u64,
}

impl AdaptiveController {
    pub fn new(params: &ControllerParameters) -> Result<Self, SimulationError> {
        if params.b_hat == 0.0 || !params.b_hat.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "control effectiveness b_hat must be nonzero, got {}",
                params.b_hat
            )));
        }
        if params.min_infusion_uU_per_min > params.max_infusion_uU_per_min {
            return Err(SimulationError::InvalidConfig(
                "infusion bounds are inverted".to_string(),
            ));
        }

        Ok(Self {
            control_gain: params.control_gain,
            f_hat: params.f_hat,
            b_hat: params.b_hat,
            min_infusion_uU_per_min: params.min_infusion_uU_per_min,
            max_infusion_uU_per_min: params.max_infusion_uU_per_min,
            infusion_uU_per_min: params.min_infusion_uU_per_min,
            clamped_low: 0,
            clamped_high: 0,
        })
    }

    /// Unclamped control law
    pub fn control_law(&self, error: f64, disturbance: f64) -> f64 {
        (1.0 / self.b_hat) * (-self.f_hat - self.control_gain * error + disturbance)
    }

    /// Compute, clamp and store the next infusion command.
    pub fn update(&mut self, error: f64, disturbance: f64) -> f64 {
        let raw = self.control_law(error, disturbance);

        // NaN compares false both ways; treat it as a request for no insulin
        let command = if raw.is_nan() || raw < self.min_infusion_uU_per_min {
            self.clamped_low += 1;
            log::debug!(
                "Infusion command {:.1} μU/min clamped to {:.1}",
                raw,
                self.min_infusion_uU_per_min
            );
            self.min_infusion_uU_per_min
        } else if raw > self.max_infusion_uU_per_min {
            self.clamped_high += 1;
            log::debug!(
                "Infusion command {:.1} μU/min clamped to {:.1}",
                raw,
                self.max_infusion_uU_per_min
            );
            self.max_infusion_uU_per_min
        } else {
            raw
        };

        self.infusion_uU_per_min = command;
        command
    }

    pub fn infusion_uU_per_min(&self) -> f64 {
        self.infusion_uU_per_min
    }
}

/// Piecewise-constant learning rate over simulated time
#[derive(Debug, Clone)]
pub struct LearningRateSchedule {
    steps: Vec<LearningRateStep>,
}

impl LearningRateSchedule {
    /// `steps` must be non-empty and ascending in `start_min`.
    pub fn new(steps: Vec<LearningRateStep>) -> Self {
        Self { steps }
    }

    /// Rate in effect at `time_min`; times before the first entry use it too.
    pub fn rate_at(&self, time_min: f64) -> f64 {
        self.steps
            .iter()
            .rev()
            .find(|s| s.start_min <= time_min)
            .or_else(|| self.steps.first())
            .map(|s| s.rate)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AdaptiveController {
        AdaptiveController::new(&ControllerParameters::default()).unwrap()
    }

    #[test]
    fn test_control_law_defaults() {
        let c = controller();
        // f̂ = 0, b̂ = 1, k = 1
        assert!((c.control_law(-20.0, 5.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_nominal_terms_applied() {
        let params = ControllerParameters {
            control_gain: 2.0,
            f_hat: 4.0,
            b_hat: 0.5,
            ..Default::default()
        };
        let c = AdaptiveController::new(&params).unwrap();
        // (1/0.5) * (-4 - 2*(-10) + 1) = 34
        assert!((c.control_law(-10.0, 1.0) - 34.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_b_hat_rejected() {
        let params = ControllerParameters {
            b_hat: 0.0,
            ..Default::default()
        };
        assert!(AdaptiveController::new(&params).is_err());
    }

    #[test]
    fn test_clamps_are_counted() {
        let mut c = controller();
        assert_eq!(c.update(1.0e9, 0.0), 0.0);
        assert_eq!(c.update(0.0, 1.0e9), 3.0e4);
        assert_eq!(c.update(-100.0, 0.0), 100.0);
        assert_eq!(c.clamped_low, 1);
        assert_eq!(c.clamped_high, 1);
        assert_eq!(c.infusion_uU_per_min(), 100.0);
    }

    #[test]
    fn test_nan_command_maps_to_lower_limit() {
        let mut c = controller();
        assert_eq!(c.update(f64::NAN, 0.0), 0.0);
        assert_eq!(c.clamped_low, 1);
    }

    #[test]
    fn test_default_learning_schedule() {
        let schedule = LearningRateSchedule::new(ControllerParameters::default().learning_schedule);
        assert_eq!(schedule.rate_at(0.0), 0.5);
        assert_eq!(schedule.rate_at(1439.999), 0.5);
        assert_eq!(schedule.rate_at(1440.0), 0.1);
        assert_eq!(schedule.rate_at(4319.0), 0.1);
        assert_eq!(schedule.rate_at(4320.0), 0.05);
        assert_eq!(schedule.rate_at(10_000.0), 0.05);
        assert_eq!(schedule.rate_at(-1.0), 0.5);
    }
}
