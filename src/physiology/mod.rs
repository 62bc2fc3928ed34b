//! Patient physiology: the insulin/glucose plant, its integrator and the
//! meal disturbance feeding it.
//!
//! ## Data Flow
//! ```text
//!  MealSchedule ──RA──►┌──────────────┐
//!                      │  PlantModel  │──► PatientState (G)
//!  infusion u ────────►│  RK4, dt     │
//!                      └──────────────┘
//! ```

pub mod integrator;
pub mod meal;
pub mod plant;

pub use integrator::Rk4Integrator;
pub use meal::{appearance_rate, meal_appearance_rate, MealSchedule, MealTransition};
pub use plant::PlantModel;
