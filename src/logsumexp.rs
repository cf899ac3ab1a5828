// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Numerically stable exponentiation and normalization of log-probability
//! arrays, and the pixel permutation used both to select a top-K subset and
//! to fix the summation order during normalization.

use crate::error::SkyMapError;

/// Returns the indices `[0, values.len())` sorted by descending value. Used
/// both as the pixel permutation of the posterior pipeline and internally by
/// [`exp_normalize`] to accumulate a sum least-significant-term-first.
pub fn sort_descending(values: &[f64]) -> Result<Vec<usize>, SkyMapError> {
    let mut perm = Vec::new();
    perm.try_reserve_exact(values.len())
        .map_err(|_| SkyMapError::Memory(values.len()))?;
    perm.extend(0..values.len());
    perm.sort_unstable_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(perm)
}

/// The log of the sum of exponentials of `values`, computed by shifting by
/// the running maximum. Returns `-inf` if `values` is empty or every element
/// is `-inf`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let m = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !m.is_finite() {
        return m;
    }
    let sum: f64 = values.iter().map(|v| (v - m).exp()).sum();
    m + sum.ln()
}

/// Exponentiates and normalizes a log-probability array in place: computes
/// the maximum, shifts and exponentiates, then divides by the sum. The sum
/// is accumulated in ascending-value order (using a descending-value
/// permutation, traversed in reverse) to reduce cancellation error from
/// adding many small terms to a fixed-size accumulator after a few large
/// ones.
pub fn exp_normalize(p: &mut [f64]) -> Result<(), SkyMapError> {
    let perm = sort_descending(p)?;
    let max = perm.first().map(|&i| p[i]).unwrap_or(f64::NEG_INFINITY);

    if !max.is_finite() {
        // Every pixel is -inf (or the map is empty); there's nothing to
        // normalize to a nonzero distribution. Leave the map as all zeros,
        // which still satisfies "nonnegative" even though it can't sum to 1.
        p.iter_mut().for_each(|v| *v = 0.0);
        return Ok(());
    }

    for v in p.iter_mut() {
        *v = (*v - max).exp();
    }

    let mut sum = 0.0;
    for &i in perm.iter().rev() {
        sum += p[i];
    }

    for v in p.iter_mut() {
        *v /= sum;
    }
    Ok(())
}
