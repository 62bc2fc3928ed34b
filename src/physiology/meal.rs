//! Meal disturbance generator and daily meal schedule.
//!
//! Ingested carbohydrate appears in plasma following a single-peaked
//! impulse response:
//!
//! ```text
//! RA(CH, t) = CH·t / (VG·τm²) · exp(-t/τm)
//! ```
//!
//! RA is zero at onset, peaks at t = τm and decays back toward zero. Each
//! recurring meal slot owns its own absorption timer so overlapping meals
//! add up instead of sharing one clock.

use crate::config::{MealParameters, PatientParameters, MINUTES_PER_DAY};

/// Glucose appearance rate (mg/dL/min) for a meal of `carbohydrate_mg`
/// eaten `elapsed_min` ago.
///
/// Times before onset yield zero.
pub fn appearance_rate(
    carbohydrate_mg: f64,
    elapsed_min: f64,
    glucose_volume_dL: f64,
    peak_time_min: f64,
) -> f64 {
    if elapsed_min <= 0.0 {
        return 0.0;
    }
    (carbohydrate_mg * elapsed_min / (glucose_volume_dL * peak_time_min * peak_time_min))
        * (-elapsed_min / peak_time_min).exp()
}

/// [`appearance_rate`] with the patient's distribution volume and peak time
pub fn meal_appearance_rate(params: &PatientParameters, carbohydrate_mg: f64, elapsed_min: f64) -> f64 {
    appearance_rate(
        carbohydrate_mg,
        elapsed_min,
        params.glucose_volume_dL,
        params.meal_peak_time_min,
    )
}

/// Meal state change observed during a step
#[derive(Debug, Clone, PartialEq)]
pub enum MealTransition {
    /// Slot went from idle to absorbing
    Started { name: String, carbohydrate_mg: f64 },
    /// Slot finished its absorption window
    Absorbed { name: String },
}

/// One recurring meal with its own absorption timer
#[derive(Debug, Clone)]
struct MealSlot {
    name: String,
    carbohydrate_mg: f64,
    /// Minutes after midnight at which the meal starts
    time_of_day_min: f64,
    /// Steps elapsed since onset while active
    elapsed_steps: u64,
    active: bool,
}

/// Signed distance from `scheduled_min` to `time_of_day_min` on the daily
/// clock, in `[-720, 720)` minutes
fn time_of_day_offset(time_of_day_min: f64, scheduled_min: f64) -> f64 {
    let half_day = 0.5 * MINUTES_PER_DAY;
    (time_of_day_min - scheduled_min + half_day).rem_euclid(MINUTES_PER_DAY) - half_day
}

/// Ordered collection of meal slots recurring every simulated day
///
/// Onsets are matched against the time of day of each step, so a step that
/// does not divide the day still starts every meal within half a step of
/// its scheduled time. Absorption timers count whole steps.
#[derive(Debug, Clone)]
pub struct MealSchedule {
    slots: Vec<MealSlot>,
    dt_min: f64,
    absorption_steps: u64,
}

impl MealSchedule {
    pub fn new(params: &MealParameters, dt_min: f64) -> Self {
        let slots = params
            .slots
            .iter()
            .map(|slot| MealSlot {
                name: slot.name.clone(),
                carbohydrate_mg: slot.carbohydrate_mg,
                time_of_day_min: slot.time_of_day_min,
                elapsed_steps: 0,
                active: false,
            })
            .collect();

        Self {
            slots,
            dt_min,
            absorption_steps: (params.absorption_duration_min / dt_min).round() as u64,
        }
    }

    /// True if any slot is absorbing
    pub fn any_active(&self) -> bool {
        self.slots.iter().any(|s| s.active)
    }

    /// Activate every slot scheduled within half a step of this step's
    /// time of day.
    ///
    /// The window `[-dt/2, dt/2)` is half-open so exactly one step per day
    /// matches each slot. A slot that is already absorbing restarts its timer.
    pub fn begin_due_meals(&mut self, step: u64) -> Vec<MealTransition> {
        let time_of_day_min = (step as f64 * self.dt_min).rem_euclid(MINUTES_PER_DAY);
        let half_step = 0.5 * self.dt_min;
        let mut started = Vec::new();
        for slot in self.slots.iter_mut().filter(|s| {
            let offset = time_of_day_offset(time_of_day_min, s.time_of_day_min);
            offset >= -half_step && offset < half_step
        }) {
            slot.active = true;
            slot.elapsed_steps = 0;
            started.push(MealTransition::Started {
                name: slot.name.clone(),
                carbohydrate_mg: slot.carbohydrate_mg,
            });
        }
        started
    }

    /// Total glucose appearance rate of all absorbing meals (mg/dL/min)
    pub fn total_appearance_rate(&self, params: &PatientParameters) -> f64 {
        self.slots
            .iter()
            .filter(|s| s.active)
            .map(|s| meal_appearance_rate(params, s.carbohydrate_mg, s.elapsed_steps as f64 * self.dt_min))
            .sum()
    }

    /// Advance the timers of absorbing meals by one step and retire the
    /// meals whose absorption window has expired.
    pub fn advance(&mut self) -> Vec<MealTransition> {
        let mut absorbed = Vec::new();
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            slot.elapsed_steps += 1;
            if slot.elapsed_steps >= self.absorption_steps {
                slot.active = false;
                slot.elapsed_steps = 0;
                absorbed.push(MealTransition::Absorbed {
                    name: slot.name.clone(),
                });
            }
        }
        absorbed
    }
}
