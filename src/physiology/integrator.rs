//! Fixed-step ODE integration for the plant model.
//!
//! Implements classical 4th-order Runge-Kutta (RK4) over a fixed-size state
//! vector. Forcing terms (insulin infusion, meal appearance) are sampled once
//! per step by the caller and held constant across the four stages.
//!
//! Reference: Press et al., Numerical Recipes, 3rd ed., Cambridge University Press 2007

/// 4th-order Runge-Kutta integrator for an N-dimensional ODE system
///
/// Solves dy/dt = f(y) with a fixed step. Unlike a concentration solver the
/// update is never clamped: the caller decides what an invalid state means.
#[derive(Debug, Clone)]
pub struct Rk4Integrator<const N: usize> {
    /// Integration timestep in minutes
    pub dt_min: f64,
    /// Number of steps taken
    pub step_count: u64,
}

impl<const N: usize> Rk4Integrator<N> {
    /// Create a new integrator with the given fixed step
    pub fn new(dt_min: f64) -> Self {
        Self {
            dt_min,
            step_count: 0,
        }
    }

    /// Simulated time derived from the step counter (min)
    ///
    /// Multiplying the counter avoids the drift of repeatedly adding `dt`.
    pub fn time_min(&self) -> f64 {
        self.step_count as f64 * self.dt_min
    }

    /// Perform one RK4 integration step
    ///
    /// # Arguments
    /// * `y` - Current state vector, modified in place
    /// * `derivatives` - Function that computes dy/dt given a state
    ///
    /// # RK4 Algorithm
    /// k1 = f(y)
    /// k2 = f(y + dt/2 * k1)
    /// k3 = f(y + dt/2 * k2)
    /// k4 = f(y + dt * k3)
    /// y_new = y + dt/6 * (k1 + 2*k2 + 2*k3 + k4)
    pub fn step<F>(&mut self, y: &mut [f64; N], derivatives: F)
    where
        F: Fn(&[f64; N], &mut [f64; N]),
    {
        let dt = self.dt_min;
        let mut k1 = [0.0; N];
        let mut k2 = [0.0; N];
        let mut k3 = [0.0; N];
        let mut k4 = [0.0; N];
        let mut y_temp = [0.0; N];

        derivatives(y, &mut k1);

        for i in 0..N {
            y_temp[i] = y[i] + 0.5 * dt * k1[i];
        }
        derivatives(&y_temp, &mut k2);

        for i in 0..N {
            y_temp[i] = y[i] + 0.5 * dt * k2[i];
        }
        derivatives(&y_temp, &mut k3);

        for i in 0..N {
            y_temp[i] = y[i] + dt * k3[i];
        }
        derivatives(&y_temp, &mut k4);

        let dt_6 = dt / 6.0;
        for i in 0..N {
            y[i] += dt_6 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }

        self.step_count += 1;
    }
}
