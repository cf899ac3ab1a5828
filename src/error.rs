// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all sky-map-related errors. This should be the *only*
//! error enum that is publicly visible.

use thiserror::Error;

use crate::amplitude::PixelError;
use crate::quadrature::QuadratureError;

/// The *only* publicly visible error from this crate.
#[derive(Error, Debug)]
pub enum SkyMapError {
    /// `npix` was not of the form `12 * N^2` for a positive integer `N`.
    #[error("npix ({npix}) is not of the form 12*N^2 for a positive integer N")]
    BadNpix { npix: usize },

    /// The caller's distance bounds are inverted or non-positive.
    #[error("min_distance ({min_distance}) must be positive and less than max_distance ({max_distance})")]
    BadDistanceBounds { min_distance: f64, max_distance: f64 },

    /// At least one detector is required.
    #[error("at least one detector is required")]
    NoDetectors,

    /// A per-detector input array had a length that didn't match `n_ifos`.
    #[error("expected {expected} entries in `{name}`, got {got}")]
    ArrayLengthMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    /// Allocation of a map-wide buffer (the sky map itself, the pixel
    /// permutation, or the per-pixel error buffer) failed.
    #[error("failed to allocate a buffer of {0} elements")]
    Memory(usize),

    /// The adaptive quadrature failed to converge, or no lattice point of at
    /// least one pixel produced a usable amplitude contribution.
    #[error("{0}")]
    Convergence(String),

    /// The prior enum value passed in wasn't one of the documented variants.
    #[error("unrecognized distance prior")]
    UnrecognizedPrior,
}

impl From<QuadratureError> for SkyMapError {
    fn from(e: QuadratureError) -> Self {
        SkyMapError::Convergence(e.to_string())
    }
}

impl From<PixelError> for SkyMapError {
    fn from(e: PixelError) -> Self {
        SkyMapError::Convergence(e.to_string())
    }
}

/// ABI-style status code mirroring [`SkyMapError`], for callers that prefer
/// to check an integer/enum code rather than match on a rich error.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success = 0,
    ShapeInvalid = 1,
    Memory = 2,
    Convergence = 3,
    UnrecognizedPrior = 4,
}

impl From<&SkyMapError> for Status {
    fn from(e: &SkyMapError) -> Self {
        match e {
            SkyMapError::BadNpix { .. }
            | SkyMapError::BadDistanceBounds { .. }
            | SkyMapError::NoDetectors
            | SkyMapError::ArrayLengthMismatch { .. } => Status::ShapeInvalid,
            SkyMapError::Memory(_) => Status::Memory,
            SkyMapError::Convergence(_) => Status::Convergence,
            SkyMapError::UnrecognizedPrior => Status::UnrecognizedPrior,
        }
    }
}

impl From<Result<(), SkyMapError>> for Status {
    fn from(r: Result<(), SkyMapError>) -> Self {
        match r {
            Ok(()) => Status::Success,
            Err(e) => Status::from(&e),
        }
    }
}
