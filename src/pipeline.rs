// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The posterior pipeline and the two public facade
//! functions. This is where TDOA evaluation, pixel pruning, and the parallel
//! amplitude phase are sequenced into a single normalized sky map.

use std::f64::consts::FRAC_PI_2;

use log::{debug, warn};
use num_complex::Complex64;
use rayon::prelude::*;
use vec1::Vec1;

use crate::amplitude::evaluate_pixel;
use crate::constants::{DEFAULT_NPSI, DEFAULT_NU, TDOA_MASS_FRACTION};
use crate::detector::{DetectorRecord, Prior, TdoaDetector};
use crate::error::SkyMapError;
use crate::geometry::{ResponseTensor, Vec3};
use crate::logsumexp::{exp_normalize, log_sum_exp, sort_descending};
use crate::pixel::{index_to_angle, resolution_from_npix};
use crate::tdoa::log_tdoa_map;

fn check_lengths(name: &'static str, expected: usize, got: usize) -> Result<(), SkyMapError> {
    if expected != got {
        return Err(SkyMapError::ArrayLengthMismatch { name, expected, got });
    }
    Ok(())
}

/// Time-delay-only sky localizer. Produces a normalized
/// probability map in ring order from times of arrival alone; used as a
/// cheap prefilter ahead of [`sky_map_tdoa_snr`].
///
/// `locations`, `toas`, and `s2_toas` must all have the same length, one
/// entry per detector; that shared length plays the role of the ABI
/// signature's explicit `n_ifos`, which is redundant once the inputs are
/// slices.
pub fn sky_map_tdoa(
    npix: usize,
    gmst: f64,
    locations: &[Vec3],
    toas: &[f64],
    s2_toas: &[f64],
) -> Result<Vec<f64>, SkyMapError> {
    let n_ifos = locations.len();
    check_lengths("toas", n_ifos, toas.len())?;
    check_lengths("s2_toas", n_ifos, s2_toas.len())?;

    let detectors: Vec<TdoaDetector> = (0..n_ifos)
        .map(|j| TdoaDetector {
            location: locations[j],
            toa: toas[j],
            s2_toa: s2_toas[j],
        })
        .collect();
    let detectors = Vec1::try_from_vec(detectors).map_err(|_| SkyMapError::NoDetectors)?;

    let mut p = log_tdoa_map(npix, gmst, &detectors)?;
    exp_normalize(&mut p)?;
    Ok(p)
}

/// Time-delay + amplitude sky localizer: the primary
/// product of this crate. Sequences TDOA evaluation, top-K pixel pruning,
/// the parallel amplitude phase, and normalization.
///
/// As with [`sky_map_tdoa`], the per-detector slices (`responses`,
/// `locations`, `toas`, `snrs`, `s2_toas`, `horizons`) must all share one
/// length, which stands in for the ABI signature's `n_ifos`.
#[allow(clippy::too_many_arguments)]
pub fn sky_map_tdoa_snr(
    npix: usize,
    gmst: f64,
    responses: &[ResponseTensor],
    locations: &[Vec3],
    toas: &[f64],
    snrs: &[Complex64],
    s2_toas: &[f64],
    horizons: &[f64],
    min_distance: f64,
    max_distance: f64,
    prior: Prior,
) -> Result<Vec<f64>, SkyMapError> {
    let n_ifos = responses.len();
    check_lengths("locations", n_ifos, locations.len())?;
    check_lengths("toas", n_ifos, toas.len())?;
    check_lengths("snrs", n_ifos, snrs.len())?;
    check_lengths("s2_toas", n_ifos, s2_toas.len())?;
    check_lengths("horizons", n_ifos, horizons.len())?;

    if min_distance <= 0.0 || min_distance > max_distance {
        return Err(SkyMapError::BadDistanceBounds {
            min_distance,
            max_distance,
        });
    }

    // Rescale so the largest horizon is 1, carrying the same factor into the
    // distance bounds.
    let max_horizon = horizons.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let scale = 1.0 / max_horizon;
    let min_distance = min_distance * scale;
    let max_distance = max_distance * scale;

    let detectors: Vec<DetectorRecord> = (0..n_ifos)
        .map(|j| DetectorRecord {
            response: responses[j],
            location: locations[j],
            horizon: horizons[j] * scale,
            toa: toas[j],
            snr: snrs[j],
            s2_toa: s2_toas[j],
        })
        .collect();
    let detectors = Vec1::try_from_vec(detectors).map_err(|_| SkyMapError::NoDetectors)?;

    let n = resolution_from_npix(npix)?;
    let tdoa_detectors: Vec<TdoaDetector> = detectors.iter().map(DetectorRecord::as_tdoa).collect();
    let mut p = log_tdoa_map(npix, gmst, &tdoa_detectors)?;

    let perm = sort_descending(&p)?;
    let log_total = log_sum_exp(&p);

    // Select the smallest prefix of the permutation whose TDOA posterior
    // mass reaches TDOA_MASS_FRACTION of the total. If every pixel is -inf (log_total isn't finite), there is no mass
    // to cover and the whole permutation is kept, matching exp_normalize's
    // own handling of an all-(-inf) map.
    let top_k: usize = if log_total.is_finite() {
        let mut cumulative = 0.0;
        let mut count = 0;
        for &idx in &perm {
            cumulative += (p[idx] - log_total).exp();
            count += 1;
            if cumulative >= TDOA_MASS_FRACTION {
                break;
            }
        }
        if cumulative < TDOA_MASS_FRACTION {
            warn!(
                "TDOA mass threshold ({TDOA_MASS_FRACTION}) not reached after scanning all {} pixels (reached {cumulative})",
                perm.len()
            );
        }
        count
    } else {
        perm.len()
    };
    debug!("selected {top_k}/{npix} pixels for the amplitude phase");

    let selected = &perm[..top_k];
    for &idx in &perm[top_k..] {
        p[idx] = f64::NEG_INFINITY;
    }

    // Each worker evaluates one pixel independently; results are collected
    // into a buffer the same size as the selected set and applied back
    // afterwards, so no locks are taken during the parallel phase.
    let results: Vec<_> = selected
        .par_iter()
        .map(|&idx| {
            let (theta, phi) = index_to_angle(n, idx);
            let dec = FRAC_PI_2 - theta;
            evaluate_pixel(
                phi,
                dec,
                gmst,
                &detectors,
                min_distance,
                max_distance,
                prior,
                DEFAULT_NU,
                DEFAULT_NPSI,
            )
        })
        .collect();

    // The first recorded failure (in selected-pixel order) is returned;
    // partial results are otherwise discarded. Collecting into a
    // `Result<Vec<f64>, _>` makes "no Err remains past this point" a
    // property of the type rather than something an `expect()` asserts.
    let amplitudes: Vec<f64> = results
        .into_iter()
        .collect::<Result<Vec<f64>, _>>()
        .map_err(SkyMapError::from)?;

    for (&idx, amp) in selected.iter().zip(amplitudes) {
        p[idx] += amp;
    }

    exp_normalize(&mut p)?;
    Ok(p)
}
