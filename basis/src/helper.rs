use crate::error::BasisError;
use libm::erf;
use std::f64::consts::PI;

/// Arguments at or above this value use the closed form of `F_0` with upward
/// recurrence; below it the series for `F_nmax` with downward recurrence.
pub const BOYS_SWITCH: f64 = 30.0;

const BOYS_SERIES_TOL: f64 = 1.0e-16;
const BOYS_SERIES_MAX_TERMS: usize = 512;

/// Evaluates the Boys functions `F_0(x) .. F_nmax(x)` into `out[..=nmax]`.
///
/// `F_n(x) = \int_0^1 t^{2n} exp(-x t^2) dt`
pub fn boys_array(nmax: usize, x: f64, out: &mut [f64]) -> Result<(), BasisError> {
    if !x.is_finite() {
        return Err(BasisError::Numerical(format!(
            "Boys function argument is not finite: {}",
            x
        )));
    }
    if out.len() <= nmax {
        return Err(BasisError::Numerical(format!(
            "Boys buffer holds {} values, order {} requested",
            out.len(),
            nmax
        )));
    }
    // round-off in p |P - C|^2 can land a hair below zero
    let x = if x < 0.0 && x > -1.0e-12 { 0.0 } else { x };
    if x < 0.0 {
        return Err(BasisError::Numerical(format!(
            "Boys function argument is negative: {}",
            x
        )));
    }

    let emx = (-x).exp();
    if x >= BOYS_SWITCH {
        let sx = x.sqrt();
        out[0] = 0.5 * (PI / x).sqrt() * erf(sx);
        for n in 0..nmax {
            out[n + 1] = ((2 * n + 1) as f64 * out[n] - emx) / (2.0 * x);
        }
    } else {
        let denom0 = (2 * nmax + 1) as f64;
        let mut term = 1.0 / denom0;
        let mut sum = term;
        let mut converged = false;
        for k in 1..BOYS_SERIES_MAX_TERMS {
            term *= 2.0 * x / (denom0 + 2.0 * k as f64);
            sum += term;
            if term < BOYS_SERIES_TOL * sum {
                converged = true;
                break;
            }
        }
        if !converged && x > 0.0 {
            return Err(BasisError::Numerical(format!(
                "Boys series for F_{}({}) did not converge",
                nmax, x
            )));
        }
        out[nmax] = emx * sum;
        for n in (1..=nmax).rev() {
            out[n - 1] = (2.0 * x * out[n] + emx) / (2 * n - 1) as f64;
        }
    }

    if let Some(bad) = out[..=nmax].iter().position(|v| !v.is_finite()) {
        return Err(BasisError::Numerical(format!(
            "Boys function F_{}({}) is not finite",
            bad, x
        )));
    }
    Ok(())
}

/// Single Boys function value `F_n(x)`.
pub fn boys_function(n: usize, x: f64) -> Result<f64, BasisError> {
    let mut vals = vec![0.0; n + 1];
    boys_array(n, x, &mut vals)?;
    Ok(vals[n])
}

// Simpson's rule integration
#[cfg(test)]
pub(crate) fn simpson_integration<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += if i % 2 == 0 { 2.0 * f(x) } else { 4.0 * f(x) };
    }
    sum * h / 3.0
}
