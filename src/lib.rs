// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rapid Bayesian sky localization of compact binary inspiral candidates.
//!
//! Given a set of detector trigger records (times of arrival, and
//! optionally complex matched-filter amplitudes and sensitivity metadata),
//! this crate computes a posterior probability density over celestial
//! direction, discretized on an equal-area, isolatitude spherical
//! pixelization in ring order (12·N² pixels for a resolution N).
//!
//! Two entry points are exposed: [`sky_map_tdoa`], a fast time-delay-only
//! localizer, and [`sky_map_tdoa_snr`], the full time-delay + amplitude
//! localizer. Both return a normalized probability map (nonnegative,
//! summing to 1) in the same ring order used to index pixels on input.
//!
//! Ingestion of trigger records, synthetic-source generation, plotting,
//! command-line parsing, and detector metadata catalogs are all out of
//! scope; this crate is the posterior evaluator only.

pub(crate) mod amplitude;
pub(crate) mod constants;
pub(crate) mod detector;
pub(crate) mod error;
pub(crate) mod geometry;
pub(crate) mod logsumexp;
mod pipeline;
pub(crate) mod pixel;
pub(crate) mod quadrature;
pub(crate) mod radial;
pub(crate) mod tdoa;

pub use detector::{DetectorRecord, Prior, TdoaDetector};
pub use error::{SkyMapError, Status};
pub use geometry::{ResponseTensor, Vec3};
pub use pipeline::{sky_map_tdoa, sky_map_tdoa_snr};
