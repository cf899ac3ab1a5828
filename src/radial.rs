// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one-dimensional integrand in `1/r` (equivalently in `x = ln r`) that
//! the adaptive quadrature integrates over distance, for a single lattice
//! point `(u, 2*psi)` of a single pixel.
//!
//! Two priors are supported: uniform in `ln(r)`, and
//! uniform in volume (an extra `r^3` Jacobian). The quadratic in `1/r`
//! inside the exponent, `A/r^2 + B/r`, has its maximum at `1/r* = -B/(2A)`;
//! breakpoints bracketing that peak are placed analytically so the adaptive
//! quadrature doesn't have to discover it numerically.

use crate::detector::Prior;

/// The integrand coefficients and the prior they should be evaluated under.
/// `a` is expected to be negative (a well-posed Gaussian-like peak); `b` is
/// non-negative.
#[derive(Clone, Copy, Debug)]
pub struct RadialIntegrand {
    a: f64,
    b: f64,
    /// Stabilizing log-offset (the value of `A/r*^2 + B/r*` at the peak),
    /// pre-subtracted inside the exponential so the integrand peaks at
    /// `O(1)` instead of overflowing.
    log_offset: f64,
    prior: Prior,
}

impl RadialIntegrand {
    /// Builds the integrand from its `(A, B)` coefficients. Returns `None`
    /// if `a >= 0`, which should not occur for a positive antenna response.
    pub fn new(a: f64, b: f64, prior: Prior) -> Option<Self> {
        if a >= 0.0 {
            return None;
        }
        let log_offset = -b * b / (4.0 * a);
        Some(Self {
            a,
            b,
            log_offset,
            prior,
        })
    }

    /// The stabilizing log-offset `L`; the caller must add this back to the
    /// log of the quadrature's returned value.
    pub fn log_offset(&self) -> f64 {
        self.log_offset
    }

    /// Evaluates the integrand at `x = ln(r)`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let inv_r = (-x).exp();
        let quadratic = self.a * inv_r * inv_r + self.b * inv_r - self.log_offset;
        let base = quadratic.exp();
        match self.prior {
            Prior::UniformInLogDistance => base,
            Prior::UniformInVolume => base * (3.0 * x).exp(),
        }
    }

    /// Up to five sorted breakpoints in `x` over `[x_min, x_max]`: the two
    /// endpoints, the peak `ln(r*)`, and (if they fall strictly inside the
    /// range) the two roots of `A*y^2 + B*y - (-B^2/(4A)) = ln(eta)` in
    /// `y = 1/r`, mapped back to `x = ln(1/y)`.
    pub fn breakpoints(&self, x_min: f64, x_max: f64, eta: f64) -> Vec<f64> {
        let mut interior = Vec::with_capacity(3);

        let y_star = -self.b / (2.0 * self.a);
        if y_star > 0.0 {
            interior.push(-y_star.ln());
        }

        // A < 0 always holds here (enforced by `new`), so ln(eta)/A > 0
        // whenever eta < 1.
        let ratio = eta.ln() / self.a;
        if ratio > 0.0 {
            let delta = ratio.sqrt();
            let y_upper = y_star + delta;
            let y_lower = y_star - delta;
            if y_upper > 0.0 {
                interior.push(-y_upper.ln());
            }
            if y_lower > 0.0 {
                interior.push(-y_lower.ln());
            }
        }

        let mut breakpoints: Vec<f64> = interior
            .into_iter()
            .filter(|&x| x > x_min && x < x_max)
            .collect();
        breakpoints.push(x_min);
        breakpoints.push(x_max);
        breakpoints.sort_by(|a, b| a.partial_cmp(b).unwrap());
        breakpoints.dedup_by(|a, b| (*a - *b).abs() < 1e-14);
        breakpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    #[test]
    fn rejects_non_negative_a() {
        assert!(RadialIntegrand::new(0.0, 1.0, Prior::UniformInLogDistance).is_none());
        assert!(RadialIntegrand::new(1.0, 1.0, Prior::UniformInLogDistance).is_none());
    }

    #[test]
    fn peak_is_at_o_one() {
        let integrand = RadialIntegrand::new(-50.0, 20.0, Prior::UniformInLogDistance).unwrap();
        let y_star = -20.0_f64 / (2.0 * -50.0);
        let x_star = (1.0 / y_star).ln();
        let peak_value = integrand.evaluate(x_star);
        assert!(peak_value > 0.1 && peak_value < 10.0, "peak = {peak_value}");
    }

    #[test]
    fn breakpoints_are_sorted_and_within_range() {
        let integrand = RadialIntegrand::new(-50.0, 20.0, Prior::UniformInLogDistance).unwrap();
        let x_min = (0.001_f64).ln();
        let x_max = (1000.0_f64).ln();
        let bps = integrand.breakpoints(x_min, x_max, 0.01);
        assert!(bps.len() >= 2);
        assert_abs_diff_eq!(*bps.first().unwrap(), x_min, epsilon = 1e-12);
        assert_abs_diff_eq!(*bps.last().unwrap(), x_max, epsilon = 1e-12);
        for w in bps.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn uniform_in_volume_has_extra_jacobian() {
        let a = -50.0;
        let b = 20.0;
        let log_integrand = RadialIntegrand::new(a, b, Prior::UniformInLogDistance).unwrap();
        let vol_integrand = RadialIntegrand::new(a, b, Prior::UniformInVolume).unwrap();
        let x = 0.3;
        assert_abs_diff_eq!(
            vol_integrand.evaluate(x),
            log_integrand.evaluate(x) * (3.0 * x).exp(),
            epsilon = 1e-9
        );
    }
}
