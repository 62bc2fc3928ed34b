//! Fixed-step closed-loop simulation of one virtual patient.
//!
//! ## Step Sequence
//! 1. Start meals scheduled at this step's time of day
//! 2. Advance the plant with the current infusion and meal appearance
//! 3. Emit a [`StepRecord`] to the observer
//! 4. Advance absorbing meal timers, retiring expired meals
//! 5. Recompute the control error from the new glucose level
//! 6. RBF forward pass
//! 7. Weight update with the scheduled learning rate
//! 8. New infusion command, applied during the next step
//!
//! Simulated time is the plant's step counter times `dt`, never an
//! accumulated sum.
//!
//! ## Usage
//! ```ignore
//! let mut sim = Simulation::new(&Parameters::default())?;
//! let mut records: Vec<StepRecord> = Vec::new();
//! let metrics = sim.run(&mut records)?;
//! ```

use serde::Serialize;

use crate::config::Parameters;
use crate::control::{AdaptiveController, LearningRateSchedule, RbfNetwork, UpdateKind};
use crate::physiology::{MealSchedule, MealTransition, PlantModel};
use crate::state::{PatientState, RunMetrics};

use super::error::SimulationError;

/// Per-step output handed to recorders
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepRecord {
    /// Simulated time at the start of the step (min)
    pub time_min: f64,
    /// Blood glucose after the step (mg/dL)
    pub blood_glucose_mg_per_dL: f64,
    /// Infusion applied during the step (μU/min)
    pub insulin_infusion_uU_per_min: f64,
}

/// Receives one record per plant step, in step order.
///
/// Observers must not influence the simulation; an error aborts the run.
pub trait StepObserver {
    fn observe(&mut self, record: &StepRecord) -> anyhow::Result<()>;
}

/// Discards every record
impl StepObserver for () {
    fn observe(&mut self, _record: &StepRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Collects every record in memory
impl StepObserver for Vec<StepRecord> {
    fn observe(&mut self, record: &StepRecord) -> anyhow::Result<()> {
        self.push(*record);
        Ok(())
    }
}

/// Closed-loop simulation owning all patient and controller state
pub struct Simulation {
    /// Current patient state
    pub state: PatientState,
    plant: PlantModel,
    meals: MealSchedule,
    network: RbfNetwork,
    controller: AdaptiveController,
    learning_schedule: LearningRateSchedule,
    target_glucose_mg_per_dL: f64,
    total_steps: u64,
    last_error: f64,
    last_disturbance: f64,
    metrics: RunMetrics,
}

impl Simulation {
    /// Build a simulation from validated parameters
    pub fn new(params: &Parameters) -> Result<Self, SimulationError> {
        params.validate()?;

        let sim = &params.simulation;
        Ok(Self {
            state: PatientState::baseline(sim.baseline_glucose_mg_per_dL),
            plant: PlantModel::new(params.patient.clone(), sim.dt_min),
            meals: MealSchedule::new(&params.meals, sim.dt_min),
            network: RbfNetwork::new(&params.estimator),
            controller: AdaptiveController::new(&params.controller)?,
            learning_schedule: LearningRateSchedule::new(params.controller.learning_schedule.clone()),
            target_glucose_mg_per_dL: sim.target_glucose_mg_per_dL,
            total_steps: sim.total_steps(),
            last_error: sim.baseline_glucose_mg_per_dL - sim.target_glucose_mg_per_dL,
            last_disturbance: 0.0,
            metrics: RunMetrics::new(),
        })
    }

    pub fn dt_min(&self) -> f64 {
        self.plant.dt_min()
    }

    /// Simulated time at the start of the next step (min)
    pub fn time_min(&self) -> f64 {
        self.plant.time_min()
    }

    /// Steps completed so far
    pub fn step_index(&self) -> u64 {
        self.plant.step_count()
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn is_finished(&self) -> bool {
        self.step_index() >= self.total_steps
    }

    pub fn network(&self) -> &RbfNetwork {
        &self.network
    }

    pub fn controller(&self) -> &AdaptiveController {
        &self.controller
    }

    pub fn meals(&self) -> &MealSchedule {
        &self.meals
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Control error computed at the end of the last step (mg/dL)
    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    /// Disturbance estimate computed at the end of the last step
    pub fn last_disturbance(&self) -> f64 {
        self.last_disturbance
    }

    /// Meal glucose appearance rate that the next step will use (mg/dL/min)
    pub fn current_appearance_rate(&self) -> f64 {
        self.meals.total_appearance_rate(&self.plant.params)
    }

    /// Advance the closed loop by one fixed step.
    pub fn step<O>(&mut self, observer: &mut O) -> Result<StepRecord, SimulationError>
    where
        O: StepObserver + ?Sized,
    {
        let time_min = self.time_min();
        let dt = self.plant.dt_min();

        for transition in self.meals.begin_due_meals(self.step_index()) {
            if let MealTransition::Started { name, carbohydrate_mg } = transition {
                log::info!(
                    "{} started at t={:.3} min ({:.0} mg carbohydrate)",
                    name,
                    time_min,
                    carbohydrate_mg
                );
                self.metrics.meals_started += 1;
            }
        }

        let infusion = self.controller.infusion_uU_per_min();
        let appearance_rate = self.meals.total_appearance_rate(&self.plant.params);
        self.plant.step(&mut self.state, infusion, appearance_rate)?;

        let record = StepRecord {
            time_min,
            blood_glucose_mg_per_dL: self.state.blood_glucose_mg_per_dL,
            insulin_infusion_uU_per_min: infusion,
        };
        observer
            .observe(&record)
            .map_err(|e| SimulationError::Observer(format!("{:#}", e)))?;
        self.metrics
            .record_glucose(self.time_min(), record.blood_glucose_mg_per_dL);

        for transition in self.meals.advance() {
            if let MealTransition::Absorbed { name } = transition {
                log::debug!("{} absorbed at t={:.3} min", name, self.time_min());
            }
        }

        let error = self.state.blood_glucose_mg_per_dL - self.target_glucose_mg_per_dL;
        let (activations, disturbance) = self.network.estimate(error);

        let learning_rate = self.learning_schedule.rate_at(time_min);
        if self.network.update(learning_rate, error, &activations, dt) == UpdateKind::Projected {
            self.metrics.projected_updates += 1;
        }
        self.metrics.record_weight_norm(self.network.norm());

        self.controller.update(error, disturbance);
        self.metrics.infusion_clamped_low = self.controller.clamped_low;
        self.metrics.infusion_clamped_high = self.controller.clamped_high;

        self.last_error = error;
        self.last_disturbance = disturbance;
        Ok(record)
    }

    /// Run the remaining steps, emitting every record to `observer`.
    pub fn run<O>(&mut self, observer: &mut O) -> Result<RunMetrics, SimulationError>
    where
        O: StepObserver + ?Sized,
    {
        log::info!(
            "Simulating {:.1} min in {} steps of {} min",
            self.total_steps as f64 * self.dt_min(),
            self.total_steps - self.step_index().min(self.total_steps),
            self.dt_min()
        );

        while !self.is_finished() {
            self.step(observer)?;
        }

        log::info!(
            "Simulation finished: mean glucose {:.1} mg/dL, range {:.1}-{:.1} mg/dL, {:.1}% in range",
            self.metrics.mean_glucose_mg_per_dL(),
            self.metrics.min_glucose_mg_per_dL,
            self.metrics.max_glucose_mg_per_dL,
            self.metrics.time_in_range_fraction() * 100.0
        );
        Ok(self.metrics.clone())
    }
}
