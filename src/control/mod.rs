//! Adaptive glucose control: the RBF disturbance estimator and the control
//! law that cancels its estimate.
//!
//! ## Data Flow
//! ```text
//! error e = G - G_target
//!        │
//!        ▼
//! ┌──────────────┐  d̂  ┌─────────────────────┐
//! │  RbfNetwork  │────►│ AdaptiveController  │──► infusion u ∈ [0, 30000]
//! │  11 Gaussians│     │ (−f̂ − k·e + d̂)/b̂   │
//! └──────────────┘     └─────────────────────┘
//!        ▲
//!        └── projection update, η from LearningRateSchedule
//! ```

pub mod controller;
pub mod rbf;

pub use controller::{AdaptiveController, LearningRateSchedule};
pub use rbf::{gaussian_activation, Activations, RbfNetwork, UpdateKind, NEURON_COUNT};
