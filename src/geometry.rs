// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Detector-frame geometry: antenna response and light-propagation delay.
//!
//! Both operations are pure, O(1), and independent of the pixelization; they
//! are called once per pixel (and, for [`antenna_response`], once per
//! lattice point within a pixel in the amplitude evaluator).

use crate::constants::SPEED_OF_LIGHT;

/// A detector's 3x3 response tensor, stored single precision (per the data
/// model's detector record), but always promoted to double precision before
/// it's contracted against anything.
pub type ResponseTensor = [[f32; 3]; 3];

/// A 3-vector, used for both detector locations (metres) and unit direction
/// vectors.
pub type Vec3 = [f64; 3];

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// The unit vector toward a sky direction `(ra, dec)` in the Earth-fixed
/// frame at sidereal time `gmst`, all in radians: `theta = pi/2 - dec`, and
/// the Earth-fixed longitude is `ra - gmst`.
pub fn direction_earth_fixed(ra: f64, dec: f64, gmst: f64) -> Vec3 {
    direction_from_colatitude(std::f64::consts::FRAC_PI_2 - dec, ra, gmst)
}

/// The unit vector toward a pixel center given directly in pixelization
/// coordinates `(theta, phi)` (co-latitude, longitude), at sidereal time
/// `gmst`. Equivalent to `direction_earth_fixed` but avoids converting to
/// and from declination in the TDOA evaluator's per-pixel hot loop.
pub fn direction_from_colatitude(theta: f64, phi: f64, gmst: f64) -> Vec3 {
    let lon = phi - gmst;
    let (s_theta, c_theta) = theta.sin_cos();
    let (s_lon, c_lon) = lon.sin_cos();
    [s_theta * c_lon, s_theta * s_lon, c_theta]
}

/// Geocentric-to-detector light propagation delay, in seconds, for a plane
/// wave arriving from `(ra, dec)` at sidereal time `gmst`. Uses the
/// algebraically equivalent form `dot(n_hat, location) / c` rather than an
/// explicit vector subtraction.
///
/// Note: unlike the interface implied by an astrometric library, this takes
/// `gmst` directly rather than an epoch; sidereal-time conversion from a
/// calendar epoch is an ingestion-side concern outside this crate's scope
/// (see `DESIGN.md`).
pub fn light_travel_delay(location: Vec3, ra: f64, dec: f64, gmst: f64) -> f64 {
    let n_hat = direction_earth_fixed(ra, dec, gmst);
    dot(n_hat, location) / SPEED_OF_LIGHT
}

/// Evaluates the standard long-wavelength plane-wave antenna pattern
/// `(F+, Fx)` for a detector with response tensor `r`, at sky position
/// `(ra, dec)`, polarization angle `psi`, and sidereal time `gmst` (all
/// radians). The core always calls this with `psi = 0`; polarization is
/// folded in analytically by the amplitude evaluator (see
/// [`crate::amplitude`]).
pub fn antenna_response(r: &ResponseTensor, ra: f64, dec: f64, psi: f64, gmst: f64) -> (f64, f64) {
    let gha = gmst - ra;
    let (s_gha, c_gha) = gha.sin_cos();
    let (s_dec, c_dec) = dec.sin_cos();
    let (s_psi, c_psi) = psi.sin_cos();

    let x = [
        -c_psi * s_gha - s_psi * c_gha * s_dec,
        -c_psi * c_gha + s_psi * s_gha * s_dec,
        s_psi * c_dec,
    ];
    let y = [
        s_psi * s_gha - c_psi * c_gha * s_dec,
        s_psi * c_gha + c_psi * s_gha * s_dec,
        c_psi * c_dec,
    ];

    let mut f_plus = 0.0;
    let mut f_cross = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            let r_ij = r[i][j] as f64;
            f_plus += r_ij * (x[i] * x[j] - y[i] * y[j]);
            f_cross += r_ij * (x[i] * y[j] + y[i] * x[j]);
        }
    }
    (f_plus, f_cross)
}
