// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A one-dimensional globally-adaptive integrator with user-supplied
//! breakpoints. Each subinterval is evaluated with a
//! 21-point Gauss-Kronrod rule; the subinterval with the largest estimated
//! error is bisected until the target tolerance is met or the subdivision
//! budget is exhausted.

use thiserror::Error;

/// Error surfaced when the adaptive quadrature can't meet its target
/// tolerance within its subdivision budget.
#[derive(Error, Debug, Clone, Copy)]
pub enum QuadratureError {
    #[error("adaptive quadrature exceeded its subdivision budget of {limit} intervals")]
    SubdivisionLimitExceeded { limit: usize },
}

// 21-point Gauss-Kronrod abscissae and weights, and the embedded 10-point
// Gauss weights, as tabulated by QUADPACK (dqk21.f). `XGK[10]` is the
// central node shared by both rules; `XGK[1, 3, 5, 7, 9]` (the odd indices)
// are the 10-point Gauss nodes, also used by the 21-point Kronrod
// extension; `XGK[0, 2, 4, 6, 8]` are Kronrod-only nodes. All are given for
// the positive half of the symmetric interval `[-1, 1]`.
const XGK: [f64; 11] = [
    0.995_657_163_025_808_1,
    0.973_906_528_517_171_7,
    0.930_157_491_355_708_2,
    0.865_063_366_688_984_5,
    0.780_817_726_586_416_9,
    0.679_409_568_299_024_4,
    0.562_757_134_668_604_7,
    0.433_395_394_129_247_2,
    0.294_392_862_701_460_2,
    0.148_874_338_981_631_2,
    0.0,
];
const WGK: [f64; 11] = [
    0.011_694_638_867_371_874,
    0.032_558_162_307_964_725,
    0.054_755_896_574_351_99,
    0.075_039_674_810_919_95,
    0.093_125_454_583_697_61,
    0.109_387_158_802_297_64,
    0.123_491_976_262_065_85,
    0.134_709_217_311_473_33,
    0.142_775_938_577_060_08,
    0.147_739_104_901_338_49,
    0.149_445_554_002_916_9,
];
const WG: [f64; 5] = [
    0.066_671_344_308_688_14,
    0.149_451_349_150_580_59,
    0.219_086_362_515_982_04,
    0.269_266_719_309_996_35,
    0.295_524_224_714_752_87,
];

/// Evaluates a single subinterval `[a, b]` with the 21-point Gauss-Kronrod
/// rule, returning `(integral_estimate, absolute_error_estimate)`.
fn gauss_kronrod_21(f: &impl Fn(f64) -> f64, a: f64, b: f64) -> (f64, f64) {
    let half_length = 0.5 * (b - a);
    let center = 0.5 * (a + b);

    let fc = f(center);
    let mut resg = 0.0_f64;
    let mut resk = WGK[10] * fc;
    let mut resabs = resk.abs();

    let mut fv1 = [0.0_f64; 10];
    let mut fv2 = [0.0_f64; 10];

    // The 10-point Gauss nodes (odd indices into XGK/WGK).
    for j in 0..5 {
        let idx = 2 * j + 1;
        let absc = half_length * XGK[idx];
        let fval1 = f(center - absc);
        let fval2 = f(center + absc);
        fv1[idx] = fval1;
        fv2[idx] = fval2;
        let fsum = fval1 + fval2;
        resg += WG[j] * fsum;
        resk += WGK[idx] * fsum;
        resabs += WGK[idx] * (fval1.abs() + fval2.abs());
    }
    // The Kronrod-only nodes (even indices into XGK/WGK).
    for j in 0..5 {
        let idx = 2 * j;
        let absc = half_length * XGK[idx];
        let fval1 = f(center - absc);
        let fval2 = f(center + absc);
        fv1[idx] = fval1;
        fv2[idx] = fval2;
        let fsum = fval1 + fval2;
        resk += WGK[idx] * fsum;
        resabs += WGK[idx] * (fval1.abs() + fval2.abs());
    }

    let reskh = resk * 0.5;
    let mut resasc = WGK[10] * (fc - reskh).abs();
    for idx in 0..10 {
        resasc += WGK[idx] * ((fv1[idx] - reskh).abs() + (fv2[idx] - reskh).abs());
    }

    let result = resk * half_length;
    let resabs = resabs * half_length.abs();
    let resasc = resasc * half_length.abs();

    let mut abs_err = ((resk - resg) * half_length).abs();
    if resasc != 0.0 && abs_err != 0.0 {
        abs_err = resasc * (1.0_f64).min((200.0 * abs_err / resasc).powf(1.5));
    }
    let epmach = f64::EPSILON;
    let uflow = f64::MIN_POSITIVE;
    if resabs > uflow / (50.0 * epmach) {
        abs_err = abs_err.max(epmach * 50.0 * resabs);
    }
    (result, abs_err)
}

struct Interval {
    a: f64,
    b: f64,
    result: f64,
    err: f64,
}

/// Integrates `f` over the union of `[breakpoints[0], breakpoints.last()]`,
/// starting one Gauss-Kronrod subinterval per consecutive pair of
/// breakpoints, then repeatedly bisecting whichever subinterval has the
/// largest estimated error until the running total meets
/// `max(abs_tol, rel_tol * |result|)` or `max_intervals` is reached.
pub fn adaptive_integrate(
    f: impl Fn(f64) -> f64,
    breakpoints: &[f64],
    rel_tol: f64,
    abs_tol: f64,
    max_intervals: usize,
) -> Result<f64, QuadratureError> {
    debug_assert!(breakpoints.len() >= 2);
    debug_assert!(breakpoints.windows(2).all(|w| w[0] < w[1]));

    let mut intervals: Vec<Interval> = breakpoints
        .windows(2)
        .map(|w| {
            let (result, err) = gauss_kronrod_21(&f, w[0], w[1]);
            Interval {
                a: w[0],
                b: w[1],
                result,
                err,
            }
        })
        .collect();

    let mut total_result: f64 = intervals.iter().map(|i| i.result).sum();
    let mut total_err: f64 = intervals.iter().map(|i| i.err).sum();

    while total_err > abs_tol.max(rel_tol * total_result.abs()) {
        if intervals.len() >= max_intervals {
            return Err(QuadratureError::SubdivisionLimitExceeded {
                limit: max_intervals,
            });
        }

        let worst_idx = intervals
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.err.partial_cmp(&b.1.err).unwrap())
            .map(|(idx, _)| idx)
            .unwrap();
        let worst = intervals.swap_remove(worst_idx);
        let mid = 0.5 * (worst.a + worst.b);

        let (r1, e1) = gauss_kronrod_21(&f, worst.a, mid);
        let (r2, e2) = gauss_kronrod_21(&f, mid, worst.b);

        total_result += r1 + r2 - worst.result;
        total_err += e1 + e2 - worst.err;

        intervals.push(Interval {
            a: worst.a,
            b: mid,
            result: r1,
            err: e1,
        });
        intervals.push(Interval {
            a: mid,
            b: worst.b,
            result: r2,
            err: e2,
        });
    }

    Ok(total_result)
}
