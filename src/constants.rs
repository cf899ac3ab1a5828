// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. The core should do as many
calculations as possible in double precision before converting to a lower
precision, if it is ever required.
 */

pub use std::f64::consts::{PI, TAU};

/// Speed of light \[m/s\].
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Default number of nodes in the inclination (`u = cos i`) lattice axis
/// swept by the amplitude evaluator. Tuned empirically, not derived; see the
/// module docs on [`crate::amplitude`].
pub const DEFAULT_NU: usize = 16;

/// Default number of nodes in the polarization (`2 psi`) lattice axis swept
/// by the amplitude evaluator. Tuned empirically alongside [`DEFAULT_NU`].
pub const DEFAULT_NPSI: usize = 16;

/// Small constant used to place the two breakpoints enclosing the peak of
/// the radial integrand (see [`crate::radial`]). Tuned, not derived.
pub const BREAKPOINT_ETA: f64 = 0.01;

/// Fraction of the total TDOA posterior mass that must be covered by the
/// top-K pixel selection before the amplitude evaluator is run (see
/// [`crate::pipeline`]).
pub const TDOA_MASS_FRACTION: f64 = 0.9999;

/// Target relative tolerance for the adaptive quadrature.
pub const QUADRATURE_REL_TOL: f64 = 0.05;

/// Target absolute tolerance for the adaptive quadrature: the smallest
/// positive normal `f64`.
pub const QUADRATURE_ABS_TOL: f64 = f64::MIN_POSITIVE;

/// Subdivision budget for the adaptive quadrature before it reports
/// non-convergence.
pub const QUADRATURE_MAX_INTERVALS: usize = 64;
