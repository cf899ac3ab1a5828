// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An equal-area, isolatitude spherical pixelization, indexed in "ring"
//! order: pixels are ordered by increasing co-latitude theta, and within a
//! ring by increasing phi. This is the pixelization convention fixed by the
//! external ABI (see the crate's top-level documentation); callers persist
//! sky maps using this ordering, so it must never change.

use std::f64::consts::PI;

use crate::error::SkyMapError;

/// Returns the resolution `N` such that `npix == 12*N*N`, or an error if
/// `npix` isn't of that form.
pub fn resolution_from_npix(npix: usize) -> Result<usize, SkyMapError> {
    if npix == 0 || npix % 12 != 0 {
        return Err(SkyMapError::BadNpix { npix });
    }
    let n_sq = npix / 12;
    let n = (n_sq as f64).sqrt().round() as usize;
    if n == 0 || n * n != n_sq {
        return Err(SkyMapError::BadNpix { npix });
    }
    Ok(n)
}

/// Integer square root, used to find ring indices without accumulating
/// floating-point error for the (potentially large) pixel counts this crate
/// deals with.
fn isqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as u64;
    // Floating-point sqrt can be off by one in either direction; correct it.
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

/// Maps a pixel index `i` in `[0, 12*N*N)` to the spherical coordinates
/// `(theta, phi)` of its center, using the standard HEALPix ring-ordering
/// formulas (Gorski et al. 2005). `theta` is co-latitude in `[0, pi]`, `phi`
/// is longitude in `[0, 2*pi)`.
pub fn index_to_angle(n: usize, i: usize) -> (f64, f64) {
    let nside = n as u64;
    let ipix = i as u64;
    let npix = 12 * nside * nside;
    let ncap = 2 * nside * (nside - 1);

    if ipix < ncap {
        // North polar cap.
        let iring = (1 + isqrt(1 + 2 * ipix)) / 2;
        let iphi = ipix - 2 * iring * (iring - 1);
        let theta = (1.0 - (iring * iring) as f64 / (3.0 * (nside * nside) as f64)).acos();
        let phi = (iphi as f64 + 0.5) * (PI / (2.0 * iring as f64));
        (theta, phi)
    } else if ipix < npix - ncap {
        // Equatorial belt.
        let ip = ipix - ncap;
        let iring = ip / (4 * nside) + nside;
        let iphi = ip % (4 * nside);
        let fodd = if (iring + nside) % 2 == 0 { 0.5 } else { 1.0 };
        let theta = ((2 * nside - iring) as f64 * 2.0 / (3.0 * nside as f64)).acos();
        let phi = (iphi as f64 + fodd) * (PI / (2.0 * nside as f64));
        (theta, phi)
    } else {
        // South polar cap.
        let ip = npix - ipix;
        let iring = (1 + isqrt(2 * ip - 1)) / 2;
        let iphi = 4 * iring - (ip - 2 * iring * (iring - 1));
        let theta = (-1.0 + (iring * iring) as f64 / (3.0 * (nside * nside) as f64)).acos();
        let phi = (iphi as f64 - 0.5) * (PI / (2.0 * iring as f64));
        (theta, phi)
    }
}
