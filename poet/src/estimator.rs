//! Scalar Kalman workload estimator (§4.2).
//!
//! Each of the two tracked metrics (performance, cost) gets its own
//! [`FilterState`]. Given the latest observed metric and the multiplier that
//! was in effect when it was observed, [`FilterState::update`] estimates the
//! *base workload* — what the metric would have cost under a unit
//! multiplier — and advances the filter.

use crate::numeric::Real;

/// Process noise. Larger values track faster but noisier.
const Q: f64 = 1e-4;
/// Measurement noise.
const R: f64 = 1e-2;

/// One scalar Kalman filter's state. Held twice per session: once for the
/// performance metric, once for the cost metric.
#[derive(Debug, Clone, Copy)]
pub struct FilterState {
    pub x_hat_minus: Real,
    pub x_hat: Real,
    pub p_minus: Real,
    pub h: Real,
    pub k: Real,
    pub p: Real,
}

impl FilterState {
    /// Initial values shared with the reference implementation: workload
    /// starts at the unit estimate, with high initial uncertainty so the
    /// first few observations pull it quickly toward truth.
    pub fn new() -> Self {
        Self {
            x_hat_minus: Real::ONE,
            x_hat: Real::ONE,
            p_minus: Real::konst(1.0),
            h: Real::ONE,
            k: Real::ZERO,
            p: Real::konst(1.0),
        }
    }

    /// Runs one Kalman update given the observed metric `y` and the
    /// multiplier `u` applied when `y` was measured, returning the
    /// estimated base workload `1 / x_hat`.
    pub fn update(&mut self, y: Real, u: Real) -> Real {
        let q = Real::konst(Q);
        let r = Real::konst(R);

        self.x_hat_minus = self.x_hat;
        self.p_minus = self.p + q;
        self.h = u;

        let denom = self.h.mult3(self.p_minus, self.h) + r;
        self.k = self.p_minus.mult(self.h).div(denom);

        let innovation = y - self.h.mult(self.x_hat_minus);
        self.x_hat = self.x_hat_minus + self.k.mult(innovation);
        self.p = (Real::ONE - self.k.mult(self.h)).mult(self.p_minus);

        Real::ONE.div(self.x_hat)
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}
