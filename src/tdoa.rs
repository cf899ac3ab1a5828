// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Computes the un-normalized log-posterior contribution from times of
//! arrival alone, pixel by pixel. This is the prefilter used ahead of the
//! (much more expensive) amplitude evaluator.

use ndarray::parallel::prelude::*;

use crate::constants::SPEED_OF_LIGHT;
use crate::detector::TdoaDetector;
use crate::error::SkyMapError;
use crate::geometry::direction_from_colatitude;
use crate::pixel::{index_to_angle, resolution_from_npix};

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Computes the log-TDOA map: for each pixel, the un-normalized Gaussian
/// log-likelihood of the observed arrival times after analytically
/// marginalizing the common arrival-time offset.
///
/// The output is not exponentiated or normalized; that happens later in
/// [`crate::pipeline`].
pub fn log_tdoa_map(
    npix: usize,
    gmst: f64,
    detectors: &[TdoaDetector],
) -> Result<Vec<f64>, SkyMapError> {
    if detectors.is_empty() {
        return Err(SkyMapError::NoDetectors);
    }
    let n = resolution_from_npix(npix)?;

    let mut p = Vec::new();
    p.try_reserve_exact(npix)
        .map_err(|_| SkyMapError::Memory(npix))?;
    p.resize(npix, 0.0);

    // Subtract the zeroth detector's arrival time for numerical
    // conditioning; the weighted-mean subtraction below makes the result
    // invariant to this choice.
    let t0 = detectors[0].toa;

    p.par_iter_mut().enumerate().for_each(|(i, out)| {
        let (theta, phi) = index_to_angle(n, i);
        let n_hat = direction_from_colatitude(theta, phi, gmst);

        let mut w_sum = 0.0;
        let mut w_dt_sum = 0.0;
        // Residuals are recomputed in the second pass rather than stored,
        // since the number of detectors is always small (a handful) and
        // this avoids a per-pixel heap allocation.
        for d in detectors {
            let dt = (d.toa - t0) + dot(n_hat, d.location) / SPEED_OF_LIGHT;
            let w = 1.0 / d.s2_toa;
            w_sum += w;
            w_dt_sum += w * dt;
        }
        let weighted_mean = w_dt_sum / w_sum;

        let mut chi_sq = 0.0;
        for d in detectors {
            let dt = (d.toa - t0) + dot(n_hat, d.location) / SPEED_OF_LIGHT;
            let w = 1.0 / d.s2_toa;
            let resid = dt - weighted_mean;
            chi_sq += w * resid * resid;
        }

        *out = -0.5 * chi_sq;
    });

    Ok(p)
}
