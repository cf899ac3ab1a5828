// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use bayestar_core::{sky_map_tdoa, sky_map_tdoa_snr, Prior, ResponseTensor};
use num_complex::Complex64;

const REFERENCE_RESPONSE: ResponseTensor = [[0.5, 0.0, 0.0], [0.0, -0.5, 0.0], [0.0, 0.0, 0.0]];

fn three_detector_locations() -> Vec<[f64; 3]> {
    vec![
        [-2_161_414.0, -3_834_695.0, 4_600_350.0],
        [-74_276.0, -5_496_283.0, 3_224_257.0],
        [4_546_374.0, 842_990.0, 4_378_577.0],
    ]
}

fn assert_is_normalized(map: &[f64]) {
    let sum: f64 = map.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
    assert!(map.iter().all(|&v| v >= 0.0), "map had a negative entry");
}

/// Scenario A: TDOA-only localization with three well-separated detectors
/// should produce a map with a clear peak well above the mean.
#[test]
fn tdoa_only_three_detectors_has_a_clear_peak() {
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007, -0.004];
    let s2_toas = vec![1e-6; 3];

    let map = sky_map_tdoa(192, 0.0, &locations, &toas, &s2_toas).unwrap();
    assert_is_normalized(&map);

    let max = map.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean: f64 = map.iter().sum::<f64>() / map.len() as f64;
    assert!(max >= 5.0 * mean, "peak ({max}) should be at least 5x the mean ({mean})");
}

/// Property 8: npix not of the form 12*N^2 is a shape error.
#[test]
fn bad_npix_is_rejected() {
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007, -0.004];
    let s2_toas = vec![1e-6; 3];
    assert!(sky_map_tdoa(100, 0.0, &locations, &toas, &s2_toas).is_err());
}

/// Scenario B: a single injection with a uniform-in-volume prior still
/// normalizes over a finer pixelization.
#[test]
fn single_injection_uniform_in_volume_normalizes() {
    let responses = vec![REFERENCE_RESPONSE; 3];
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007, -0.004];
    let snrs = vec![
        Complex64::new(10.0, 0.0),
        Complex64::new(8.0, 0.0),
        Complex64::new(9.0, 0.0),
    ];
    let s2_toas = vec![1e-6; 3];
    let horizons = vec![100.0, 100.0, 100.0];

    let map = sky_map_tdoa_snr(
        3072,
        0.0,
        &responses,
        &locations,
        &toas,
        &snrs,
        &s2_toas,
        &horizons,
        1.0,
        1000.0,
        Prior::UniformInVolume,
    )
    .unwrap();
    assert_is_normalized(&map);
}

/// Property 2: reordering detectors (with all their paired per-detector
/// inputs) leaves the output unchanged.
#[test]
fn reordering_detectors_is_invariant() {
    let responses = vec![REFERENCE_RESPONSE; 3];
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007, -0.004];
    let snrs = vec![
        Complex64::new(10.0, 0.0),
        Complex64::new(8.0, 0.0),
        Complex64::new(9.0, 0.0),
    ];
    let s2_toas = vec![1e-6; 3];
    let horizons = vec![100.0, 100.0, 100.0];

    let map_a = sky_map_tdoa_snr(
        192, 0.0, &responses, &locations, &toas, &snrs, &s2_toas, &horizons, 1.0, 1000.0,
        Prior::UniformInLogDistance,
    )
    .unwrap();

    let mut responses_r = responses.clone();
    let mut locations_r = locations.clone();
    let mut toas_r = toas.clone();
    let mut snrs_r = snrs.clone();
    let mut s2_toas_r = s2_toas.clone();
    let mut horizons_r = horizons.clone();
    responses_r.swap(0, 2);
    locations_r.swap(0, 2);
    toas_r.swap(0, 2);
    snrs_r.swap(0, 2);
    s2_toas_r.swap(0, 2);
    horizons_r.swap(0, 2);

    let map_b = sky_map_tdoa_snr(
        192, 0.0, &responses_r, &locations_r, &toas_r, &snrs_r, &s2_toas_r, &horizons_r, 1.0,
        1000.0, Prior::UniformInLogDistance,
    )
    .unwrap();

    for (a, b) in map_a.iter().zip(map_b.iter()) {
        assert!((a - b).abs() < 1e-6, "a={a} b={b}");
    }
}

/// Property 3: shifting all arrival times by a common constant leaves the
/// output unchanged.
#[test]
fn shifting_all_toas_is_invariant() {
    let responses = vec![REFERENCE_RESPONSE; 3];
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007, -0.004];
    let snrs = vec![Complex64::new(10.0, 0.0); 3];
    let s2_toas = vec![1e-6; 3];
    let horizons = vec![100.0, 100.0, 100.0];

    let map_a = sky_map_tdoa_snr(
        192, 0.0, &responses, &locations, &toas, &snrs, &s2_toas, &horizons, 1.0, 1000.0,
        Prior::UniformInLogDistance,
    )
    .unwrap();

    let shifted_toas: Vec<f64> = toas.iter().map(|t| t + 42.0).collect();
    let map_b = sky_map_tdoa_snr(
        192, 0.0, &responses, &locations, &shifted_toas, &snrs, &s2_toas, &horizons, 1.0, 1000.0,
        Prior::UniformInLogDistance,
    )
    .unwrap();

    for (a, b) in map_a.iter().zip(map_b.iter()) {
        assert!((a - b).abs() < 1e-6, "a={a} b={b}");
    }
}

/// Property 4: uniformly scaling all horizons and distance bounds by the
/// same positive factor leaves the output unchanged (internal rescaling
/// invariant).
#[test]
fn scaling_horizons_and_distances_is_invariant() {
    let responses = vec![REFERENCE_RESPONSE; 3];
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007, -0.004];
    let snrs = vec![Complex64::new(10.0, 0.0); 3];
    let s2_toas = vec![1e-6; 3];
    let horizons = vec![100.0, 100.0, 100.0];

    let map_a = sky_map_tdoa_snr(
        192, 0.0, &responses, &locations, &toas, &snrs, &s2_toas, &horizons, 1.0, 1000.0,
        Prior::UniformInLogDistance,
    )
    .unwrap();

    let factor = 7.0;
    let scaled_horizons: Vec<f64> = horizons.iter().map(|h| h * factor).collect();
    let map_b = sky_map_tdoa_snr(
        192,
        0.0,
        &responses,
        &locations,
        &toas,
        &snrs,
        &s2_toas,
        &scaled_horizons,
        1.0 * factor,
        1000.0 * factor,
        Prior::UniformInLogDistance,
    )
    .unwrap();

    for (a, b) in map_a.iter().zip(map_b.iter()) {
        assert!((a - b).abs() < 1e-6, "a={a} b={b}");
    }
}

/// Property 7: if min_distance == max_distance, both priors should give
/// identical outputs up to the integration tolerance.
#[test]
fn degenerate_distance_bounds_priors_agree() {
    let responses = vec![REFERENCE_RESPONSE];
    let locations = vec![[0.0, 0.0, 0.0]];
    let toas = vec![0.0];
    let snrs = vec![Complex64::new(10.0, 0.0)];
    let s2_toas = vec![1e-6];
    let horizons = vec![100.0];

    let map_log = sky_map_tdoa_snr(
        48, 0.1, &responses, &locations, &toas, &snrs, &s2_toas, &horizons, 50.0, 50.0,
        Prior::UniformInLogDistance,
    )
    .unwrap();
    let map_vol = sky_map_tdoa_snr(
        48, 0.1, &responses, &locations, &toas, &snrs, &s2_toas, &horizons, 50.0, 50.0,
        Prior::UniformInVolume,
    )
    .unwrap();

    for (a, b) in map_log.iter().zip(map_vol.iter()) {
        assert!((a - b).abs() < 1e-3, "a={a} b={b}");
    }
}

/// Property 6: with a single detector and uninformative amplitude (uniform
/// SNR), the output should be close to flat: TDOA alone carries no
/// information with one detector, and once polarization and inclination
/// are marginalized the amplitude factor has no preferred direction.
#[test]
fn single_detector_map_is_nearly_uniform() {
    let responses = vec![REFERENCE_RESPONSE];
    let locations = vec![[1_000_000.0, 2_000_000.0, 3_000_000.0]];
    let toas = vec![0.0];
    let snrs = vec![Complex64::new(10.0, 0.0)];
    let s2_toas = vec![1e-6];
    let horizons = vec![100.0];

    let map = sky_map_tdoa_snr(
        192, 0.0, &responses, &locations, &toas, &snrs, &s2_toas, &horizons, 1.0, 1000.0,
        Prior::UniformInVolume,
    )
    .unwrap();

    let max = map.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = map.iter().cloned().fold(f64::INFINITY, f64::min);
    let mean: f64 = map.iter().sum::<f64>() / map.len() as f64;
    // Loose bound: a flat map has max/mean == 1; allow some room for the
    // amplitude lattice's residual sky dependence without requiring exact
    // uniformity.
    assert!(max < 10.0 * mean, "max ({max}) should be close to mean ({mean})");
    assert!(min >= 0.0);
}

/// Boundary behavior around array-length validation: mismatched per-detector
/// slice lengths are rejected rather than panicking.
#[test]
fn mismatched_array_lengths_are_rejected() {
    let responses = vec![REFERENCE_RESPONSE; 3];
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007];
    let snrs = vec![Complex64::new(10.0, 0.0); 3];
    let s2_toas = vec![1e-6; 3];
    let horizons = vec![100.0, 100.0, 100.0];

    let result = sky_map_tdoa_snr(
        192, 0.0, &responses, &locations, &toas, &snrs, &s2_toas, &horizons, 1.0, 1000.0,
        Prior::UniformInLogDistance,
    );
    assert!(result.is_err());
}

/// Property 5: adding a constant to gmst rotates the output map in phi by
/// the same angle, up to interpolation onto the fixed grid. At the coarsest
/// resolution (npix = 12, N = 1) the equatorial ring's four pixel centers
/// sit at exactly phi = 90, 180, 270, 360 degrees, so a source whose
/// Earth-fixed direction is exactly on that ring lets a quarter-turn
/// (gmst += pi/2) be checked against an exact expected pixel, rather than
/// only approximately.
///
/// Two detectors are placed along orthogonal axes with arrival times chosen
/// so the time-delay residual is exactly zero (the global minimum of the
/// chi-squared) only for the Earth-fixed direction (0, 1, 0), which at
/// gmst = 0 maps to the pixel centered at (theta=90, phi=90) deg, and at
/// gmst = pi/2 maps to the pixel centered at (theta=90, phi=180) deg.
#[test]
fn rotating_gmst_rotates_the_peak_in_phi() {
    let speed_of_light = 299_792_458.0_f64;
    let baseline = 1.0e6_f64;

    let locations = vec![[0.0, 0.0, 0.0], [baseline, 0.0, 0.0], [0.0, baseline, 0.0]];
    let toas = vec![0.0, 0.0, -baseline / speed_of_light];
    let s2_toas = vec![1e-6; 3];

    let map_at_zero = sky_map_tdoa(12, 0.0, &locations, &toas, &s2_toas).unwrap();
    let map_at_quarter_turn =
        sky_map_tdoa(12, std::f64::consts::FRAC_PI_2, &locations, &toas, &s2_toas).unwrap();

    let argmax = |map: &[f64]| {
        map.iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    };

    // Pixel 4 is centered at (theta=90, phi=90) deg; pixel 5 at (theta=90,
    // phi=180) deg, exactly one ring-step (90 degrees) further in phi.
    assert_eq!(argmax(&map_at_zero), 4);
    assert_eq!(argmax(&map_at_quarter_turn), 5);
}

/// Scenario C: a two-detector TDOA map is degenerate along a ring of
/// constant time-delay-difference rather than peaked at a single pixel.
/// Expect the posterior mass concentrated on a minority band of pixels,
/// with most of the sky (in particular directions orthogonal to the
/// baseline, where the implied delay is never achieved) carrying
/// essentially zero density.
#[test]
fn two_detector_tdoa_is_a_ring_not_a_peak() {
    let speed_of_light = 299_792_458.0_f64;
    let baseline = 6.0e6_f64;
    // Just below the maximum geometric delay baseline/c for this pair.
    let delay = 0.9 * baseline / speed_of_light;

    let locations = vec![[0.0, 0.0, 0.0], [baseline, 0.0, 0.0]];
    let toas = vec![0.0, delay];
    let s2_toas = vec![1e-8; 2];

    let map = sky_map_tdoa(3072, 0.0, &locations, &toas, &s2_toas).unwrap();
    assert_is_normalized(&map);

    let npix = map.len();
    let mean: f64 = map.iter().sum::<f64>() / npix as f64;
    let max = map.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = map.iter().cloned().fold(f64::INFINITY, f64::min);

    // A single-pixel peak (like scenario A's three-detector case) would push
    // max/mean far higher, and a flat map (like the single-detector case)
    // would keep it near 1; a ring sits in between.
    assert!(max > 20.0 * mean, "max ({max}) should clear the mean by a wide margin");
    assert!(max < 1000.0 * mean, "max ({max}) should not collapse to a single-pixel spike");

    // Some pixels carry essentially none of the posterior mass: the ring
    // doesn't cover the whole sky.
    assert!(min < 1e-6 * mean, "min ({min}) should vanish off the ring");

    // The "on-ring" set is a genuine minority of the sky, not everything
    // above the mean by chance.
    let on_ring = map.iter().filter(|&&p| p > 10.0 * mean).count();
    assert!(on_ring > 0, "expected a nonempty ring");
    assert!(
        on_ring < npix / 4,
        "on-ring pixel count ({on_ring}/{npix}) should be a minority of the sky"
    );
}

/// Scenario D: when SNRs are far below any physical significance, the
/// amplitude evaluator's contribution is nearly constant across the sky (it
/// still depends on antenna response through the `A` coefficient, but that
/// dependence is weak once marginalized over polarization and inclination
/// and integrated over distance), so the full time-delay + amplitude map
/// should match the time-delay-only map up to normalization.
#[test]
fn negligible_snr_reduces_to_tdoa_only() {
    let responses = vec![REFERENCE_RESPONSE; 3];
    let locations = three_detector_locations();
    let toas = vec![0.0, 0.007, -0.004];
    let s2_toas = vec![1e-6; 3];
    let horizons = vec![100.0, 100.0, 100.0];
    // Far below any matched-filter detection threshold.
    let snrs = vec![Complex64::new(1e-6, 0.0); 3];

    let tdoa_only = sky_map_tdoa(192, 0.0, &locations, &toas, &s2_toas).unwrap();
    let tdoa_snr = sky_map_tdoa_snr(
        192,
        0.0,
        &responses,
        &locations,
        &toas,
        &snrs,
        &s2_toas,
        &horizons,
        1.0,
        1000.0,
        Prior::UniformInVolume,
    )
    .unwrap();

    assert_is_normalized(&tdoa_snr);
    for (a, b) in tdoa_only.iter().zip(tdoa_snr.iter()) {
        assert!((a - b).abs() < 0.01, "a={a} b={b}");
    }
}
