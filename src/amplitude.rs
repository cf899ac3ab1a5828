// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-pixel amplitude log-posterior evaluation. This is
//! the hot path of the whole crate: for every surviving pixel, it sweeps a
//! regular lattice in `(2*psi, u = cos(inclination))`, and for each lattice
//! point computes a one-dimensional radial integral via adaptive
//! quadrature, finally combining all lattice contributions with
//! [`log_sum_exp`].

use std::f64::consts::TAU;

use itertools::iproduct;
use log::trace;
use thiserror::Error;

use crate::constants::BREAKPOINT_ETA;
use crate::detector::{DetectorRecord, Prior};
use crate::geometry::antenna_response;
use crate::logsumexp::log_sum_exp;
use crate::quadrature::{adaptive_integrate, QuadratureError};
use crate::radial::RadialIntegrand;

/// Error recorded for a single pixel when its amplitude log-posterior
/// couldn't be computed at all, i.e. every lattice point failed. Partial
/// lattice-point failures are not fatal to the pixel — see `DESIGN.md` for
/// the rationale — and are only traced for diagnostics.
#[derive(Error, Debug, Clone, Copy)]
pub enum PixelError {
    #[error("every lattice point failed for this pixel: {0}")]
    AllLatticePointsFailed(QuadratureError),
    #[error("every lattice point failed for this pixel (non-positive antenna response)")]
    NoUsableLatticePoints,
}

struct DetectorAmplitude {
    f_plus: f64,
    f_cross: f64,
    snr_magnitude: f64,
}

/// Computes the amplitude log-posterior for a single pixel at sky position
/// `(ra, dec)`.
///
/// `detectors` must already have their antenna-response tensors and
/// horizons available; `min_distance`/`max_distance` bound the radial
/// integral; `nu`/`npsi` set the lattice density.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_pixel(
    ra: f64,
    dec: f64,
    gmst: f64,
    detectors: &[DetectorRecord],
    min_distance: f64,
    max_distance: f64,
    prior: Prior,
    nu: usize,
    npsi: usize,
) -> Result<f64, PixelError> {
    // Step 1: raw antenna factors (psi = 0), scaled by each detector's
    // rescaled horizon to units of SNR per unit 1/r.
    let amps: Vec<DetectorAmplitude> = detectors
        .iter()
        .map(|d| {
            let (f_plus, f_cross) = antenna_response(&d.response, ra, dec, 0.0, gmst);
            DetectorAmplitude {
                f_plus: f_plus * d.horizon,
                f_cross: f_cross * d.horizon,
                snr_magnitude: d.snr.norm(),
            }
        })
        .collect();

    let x_min = min_distance.ln();
    let x_max = max_distance.ln();

    let mut lattice_log_contribs = Vec::with_capacity((nu + 1) * npsi);
    let mut last_failure: Option<QuadratureError> = None;
    let mut any_non_positive_a = false;

    for (iu, ipsi) in iproduct!(0..=nu, 0..npsi) {
        let u = iu as f64 / nu as f64;
        let u2 = u * u;
        let one_minus_u2 = 1.0 - u2;
        let inclination_envelope = 1.0 + 6.0 * u2 + u2 * u2;

        let two_psi = TAU * ipsi as f64 / npsi as f64;
        let (s_2psi, c_2psi) = two_psi.sin_cos();

        let mut a = 0.0;
        let mut b = 0.0;
        for amp in &amps {
            let fp2 = amp.f_plus * amp.f_plus;
            let fx2 = amp.f_cross * amp.f_cross;
            let rho2r2 = 0.125
                * ((fp2 + fx2) * inclination_envelope
                    + one_minus_u2
                        * one_minus_u2
                        * ((fp2 - fx2) * c_2psi + 2.0 * amp.f_plus * amp.f_cross * s_2psi));
            // Floating-point noise can push this marginally negative at
            // u close to 1; clamp rather than propagate a NaN sqrt.
            let rho2r2 = rho2r2.max(0.0);
            a += -0.5 * rho2r2;
            b += rho2r2.sqrt() * amp.snr_magnitude;
        }

        let integrand = match RadialIntegrand::new(a, b, prior) {
            Some(i) => i,
            None => {
                any_non_positive_a = true;
                trace!("pixel lattice point (u={u}, 2psi={two_psi}) skipped: A >= 0");
                continue;
            }
        };

        // A degenerate distance range (min_distance == max_distance)
        // collapses the radial integral to a point mass: there's nothing
        // to subdivide, and both priors must agree up to the shared (and
        // here pixel-independent) r^3 Jacobian evaluated at the single
        // allowed distance.
        if x_max <= x_min {
            let value = integrand.evaluate(x_min);
            if value > 0.0 {
                lattice_log_contribs.push(value.ln() + integrand.log_offset());
            } else {
                any_non_positive_a = true;
            }
            continue;
        }

        let breakpoints = integrand.breakpoints(x_min, x_max, BREAKPOINT_ETA);
        match adaptive_integrate(
            |x| integrand.evaluate(x),
            &breakpoints,
            crate::constants::QUADRATURE_REL_TOL,
            crate::constants::QUADRATURE_ABS_TOL,
            crate::constants::QUADRATURE_MAX_INTERVALS,
        ) {
            Ok(value) if value > 0.0 => {
                lattice_log_contribs.push(value.ln() + integrand.log_offset());
            }
            Ok(_) => {
                any_non_positive_a = true;
                trace!("pixel lattice point (u={u}, 2psi={two_psi}) integrated to <= 0");
            }
            Err(e) => {
                trace!("pixel lattice point (u={u}, 2psi={two_psi}) failed to converge: {e}");
                last_failure = Some(e);
            }
        }
    }

    if lattice_log_contribs.is_empty() {
        return Err(match last_failure {
            Some(e) => PixelError::AllLatticePointsFailed(e),
            None => {
                debug_assert!(any_non_positive_a);
                PixelError::NoUsableLatticePoints
            }
        });
    }

    Ok(log_sum_exp(&lattice_log_contribs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;
    use num_complex::Complex64;

    fn reference_detector(horizon: f64, snr: f64) -> DetectorRecord {
        DetectorRecord {
            response: [[0.5, 0.0, 0.0], [0.0, -0.5, 0.0], [0.0, 0.0, 0.0]],
            location: [0.0, 0.0, 0.0],
            horizon,
            toa: 0.0,
            snr: Complex64::new(snr, 0.0),
            s2_toa: 1e-6,
        }
    }

    #[test]
    fn evaluates_without_error_for_a_well_posed_pixel() {
        let detectors = vec![
            reference_detector(100.0, 10.0),
            reference_detector(100.0, 8.0),
            reference_detector(100.0, 9.0),
        ];
        let result = evaluate_pixel(
            0.0,
            0.0,
            0.0,
            &detectors,
            1.0,
            1000.0,
            Prior::UniformInVolume,
            16,
            16,
        );
        assert!(result.is_ok());
        assert!(result.unwrap().is_finite());
    }

    #[test]
    fn degenerate_distance_bounds_still_integrate() {
        // min_distance == max_distance is a documented edge case: both
        // priors should still normalize.
        let detectors = vec![reference_detector(100.0, 10.0)];
        let result = evaluate_pixel(
            0.1,
            0.2,
            0.0,
            &detectors,
            50.0,
            50.0,
            Prior::UniformInLogDistance,
            16,
            16,
        );
        assert!(result.is_ok());
    }
}
