//! Radial-basis-function disturbance estimator.
//!
//! An 11-neuron Gaussian network maps the control error e (mg/dL) to an
//! estimate of the unmodeled glucose dynamics:
//!
//! ```text
//! a_i = exp(-0.5 · ((e - c_i) / σ_i)²)
//! d̂   = Σ w_i · a_i
//! ```
//!
//! Weights adapt online with a projection rule that keeps ‖w‖ ≤ ϑ. Inside
//! the ball the gradient step `w += η·e·a·dt` is applied directly; on the
//! boundary an outward step is projected onto the tangent plane of the
//! sphere with `P = I - w·wᵀ / (wᵀw)`.

use crate::config::EstimatorParameters;

/// Number of hidden neurons
pub const NEURON_COUNT: usize = 11;

/// Substitute for a zero `wᵀw` when forming the projection matrix
const PROJECTION_EPSILON: f64 = 1e-6;

/// Relative tolerance for deciding that the norm sits on the bound
const BOUNDARY_TOLERANCE: f64 = 1e-12;

/// Activation of every hidden neuron for one error value
pub type Activations = [f64; NEURON_COUNT];

type Matrix = [[f64; NEURON_COUNT]; NEURON_COUNT];

/// Which branch of the projection rule an update took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Unconstrained gradient step
    Free,
    /// Step projected onto the tangent plane of the norm bound
    Projected,
}

/// Gaussian basis function
#[inline]
pub fn gaussian_activation(center: f64, width: f64, error: f64) -> f64 {
    let z = (error - center) / width;
    (-0.5 * z * z).exp()
}

#[inline]
fn dot(a: &[f64; NEURON_COUNT], b: &[f64; NEURON_COUNT]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Online-trained RBF network with a bounded weight vector
#[derive(Debug, Clone)]
pub struct RbfNetwork {
    centers: [f64; NEURON_COUNT],
    widths: [f64; NEURON_COUNT],
    weights: [f64; NEURON_COUNT],
    weight_bound: f64,
}

impl RbfNetwork {
    /// Create a network with zero weights
    pub fn new(params: &EstimatorParameters) -> Self {
        Self {
            centers: params.centers,
            widths: params.widths,
            weights: [0.0; NEURON_COUNT],
            weight_bound: params.weight_bound,
        }
    }

    /// Replace the weight vector, e.g. to start from a trained state
    pub fn with_weights(mut self, weights: [f64; NEURON_COUNT]) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> &[f64; NEURON_COUNT] {
        &self.weights
    }

    pub fn bound(&self) -> f64 {
        self.weight_bound
    }

    /// Euclidean norm of the weight vector
    pub fn norm(&self) -> f64 {
        dot(&self.weights, &self.weights).sqrt()
    }

    /// Activation of every neuron for the given control error.
    ///
    /// Pure: depends only on the error and the fixed centers and widths.
    pub fn forward(&self, error: f64) -> Activations {
        let mut activations = [0.0; NEURON_COUNT];
        for (i, a) in activations.iter_mut().enumerate() {
            *a = gaussian_activation(self.centers[i], self.widths[i], error);
        }
        activations
    }

    /// Disturbance estimate: weighted sum of the activations
    pub fn output(&self, activations: &Activations) -> f64 {
        dot(&self.weights, activations)
    }

    /// Forward pass followed by the output layer
    pub fn estimate(&self, error: f64) -> (Activations, f64) {
        let activations = self.forward(error);
        let disturbance = self.output(&activations);
        (activations, disturbance)
    }

    /// Adapt the weights for one step of length `dt`.
    pub fn update(
        &mut self,
        learning_rate: f64,
        error: f64,
        activations: &Activations,
        dt: f64,
    ) -> UpdateKind {
        let norm = self.norm();
        let tolerance = self.weight_bound * BOUNDARY_TOLERANCE;
        let inside = norm < self.weight_bound - tolerance;
        let on_boundary = (norm - self.weight_bound).abs() <= tolerance;
        let inward = learning_rate * error * dot(&self.weights, activations) < 0.0;

        let kind = if inside || (on_boundary && inward) {
            for (w, a) in self.weights.iter_mut().zip(activations.iter()) {
                *w += learning_rate * error * a * dt;
            }
            UpdateKind::Free
        } else {
            let projection = self.projection_matrix();
            let mut delta = [0.0; NEURON_COUNT];
            for (d, a) in delta.iter_mut().zip(activations.iter()) {
                *d = learning_rate * error * a;
            }
            for (i, w) in self.weights.iter_mut().enumerate() {
                *w += dot(&projection[i], &delta) * dt;
            }
            UpdateKind::Projected
        };

        // A discrete step can leave the ball by O(dt²) even along the
        // tangent plane, and a free step can overshoot the first crossing.
        self.pull_onto_bound();
        kind
    }

    /// `I - w·wᵀ / (wᵀw)`
    fn projection_matrix(&self) -> Matrix {
        let mut scale = dot(&self.weights, &self.weights);
        if scale == 0.0 {
            scale = PROJECTION_EPSILON;
        }

        let mut projection = [[0.0; NEURON_COUNT]; NEURON_COUNT];
        for (i, row) in projection.iter_mut().enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                let outer = self.weights[i] * self.weights[j] / scale;
                *p = if i == j { 1.0 - outer } else { -outer };
            }
        }
        projection
    }

    fn pull_onto_bound(&mut self) {
        let norm = self.norm();
        if norm > self.weight_bound {
            let factor = self.weight_bound / norm;
            for w in self.weights.iter_mut() {
                *w *= factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> RbfNetwork {
        RbfNetwork::new(&EstimatorParameters::default())
    }

    #[test]
    fn test_activation_peaks_at_center() {
        assert!((gaussian_activation(5.0, 2.0, 5.0) - 1.0).abs() < 1e-15);
        let one_sigma = gaussian_activation(5.0, 2.0, 7.0);
        assert!((one_sigma - (-0.5_f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn test_forward_is_pure() {
        let net = network().with_weights([1.0; NEURON_COUNT]);
        let (a1, d1) = net.estimate(12.5);
        let (a2, d2) = net.estimate(12.5);
        assert_eq!(a1, a2);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_zero_weights_zero_output() {
        let net = network();
        let a = net.forward(-3.0);
        assert_eq!(net.output(&a), 0.0);
    }

    #[test]
    fn test_free_update_inside_bound() {
        let mut net = network();
        let a = net.forward(0.0);
        let kind = net.update(0.5, 10.0, &a, 1e-3);

        assert_eq!(kind, UpdateKind::Free);
        for i in 0..NEURON_COUNT {
            let expected = 0.5 * 10.0 * a[i] * 1e-3;
            assert!((net.weights()[i] - expected).abs() < 1e-15);
        }
    }

    #[test]
    fn test_projection_matrix_annihilates_weights() {
        let mut weights = [0.0; NEURON_COUNT];
        weights[0] = 3.0;
        weights[4] = 4.0;
        let net = network().with_weights(weights);
        let p = net.projection_matrix();

        for row in p.iter() {
            assert!(dot(row, &weights).abs() < 1e-12);
        }
    }

    #[test]
    fn test_projection_matrix_with_zero_weights_is_identity() {
        let p = network().projection_matrix();
        for i in 0..NEURON_COUNT {
            for j in 0..NEURON_COUNT {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(p[i][j], expected);
            }
        }
    }

    #[test]
    fn test_outward_update_on_bound_is_projected() {
        let mut weights = [0.0; NEURON_COUNT];
        weights[5] = 3.0e4;
        let mut net = network().with_weights(weights);

        // Positive error with positive w·a pushes outward
        let a = net.forward(0.0);
        let kind = net.update(0.5, 50.0, &a, 1e-3);

        assert_eq!(kind, UpdateKind::Projected);
        assert!(net.norm() <= 3.0e4 * (1.0 + 1e-12), "norm {}", net.norm());
        // Radial component removed: neuron 5 only moved by the renormalisation
        assert!(net.weights()[5] <= 3.0e4);
        assert!(net.weights()[6] > 0.0);
    }

    #[test]
    fn test_inward_update_on_bound_is_free() {
        let mut weights = [0.0; NEURON_COUNT];
        weights[5] = 3.0e4;
        let mut net = network().with_weights(weights);

        let a = net.forward(0.0);
        let kind = net.update(0.5, -50.0, &a, 1e-3);

        assert_eq!(kind, UpdateKind::Free);
        assert!(net.norm() < 3.0e4);
    }

    #[test]
    fn test_first_crossing_is_pulled_back() {
        let mut weights = [0.0; NEURON_COUNT];
        weights[5] = 3.0e4 - 1e-6;
        let mut net = network().with_weights(weights);

        let a = net.forward(0.0);
        net.update(0.5, 100.0, &a, 1.0);
        assert!(net.norm() <= 3.0e4 * (1.0 + 1e-12));
    }
}
