// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The data model for a single detector's trigger record, immutable for the
//! duration of one sky-map evaluation.

use num_complex::Complex64;

use crate::geometry::{ResponseTensor, Vec3};

/// The inputs needed for the time-delay-only localizer ([`crate::sky_map_tdoa`]).
#[derive(Clone, Copy, Debug)]
pub struct TdoaDetector {
    /// Geocentric Cartesian location \[m\].
    pub location: Vec3,
    /// Arrival time \[s\]. Any epoch; only differences between detectors
    /// matter.
    pub toa: f64,
    /// Time-of-arrival measurement variance \[s^2\].
    pub s2_toa: f64,
}

/// The full trigger record for one detector, as used by the amplitude
/// evaluator ([`crate::sky_map_tdoa_snr`]).
#[derive(Clone, Copy, Debug)]
pub struct DetectorRecord {
    /// The detector's 3x3 antenna response tensor, single precision.
    pub response: ResponseTensor,
    /// Geocentric Cartesian location \[m\].
    pub location: Vec3,
    /// The distance at which this detector would observe SNR = 1 for the
    /// template in question, in the same units as the caller's distance
    /// bounds. Always positive.
    pub horizon: f64,
    /// Arrival time \[s\].
    pub toa: f64,
    /// Complex matched-filter SNR. Only the magnitude is used by the
    /// current algorithm; the phase is accepted and preserved for interface
    /// stability.
    pub snr: Complex64,
    /// Time-of-arrival measurement variance \[s^2\].
    pub s2_toa: f64,
}

impl DetectorRecord {
    /// A view of just the TDOA-relevant fields of this record.
    pub fn as_tdoa(&self) -> TdoaDetector {
        TdoaDetector {
            location: self.location,
            toa: self.toa,
            s2_toa: self.s2_toa,
        }
    }
}

/// The closed set of priors on luminosity distance that the radial
/// integrand supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prior {
    /// Uniform in `ln(r)`.
    UniformInLogDistance,
    /// Uniform in volume (an extra `r^3` Jacobian relative to the above).
    UniformInVolume,
}
