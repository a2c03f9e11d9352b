//! Shapiro-Wilk W test
//!
//! Royston (1992) approximation of the Shapiro-Wilk coefficients and the
//! Royston (1995) normalising transform for the p-value.

use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

// Polynomial coefficients, lowest order first
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const GAMMA: [f64; 2] = [-2.273, 0.459];
const SMALL_MEAN: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SMALL_SIGMA: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const LARGE_MEAN: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const LARGE_SIGMA: [f64; 3] = [-0.4803, -0.082676, 0.0030302];

fn poly(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Coefficients `a_i` for the ordered sample, antisymmetric around the middle
fn coefficients(n: usize, normal: &Normal) -> Vec<f64> {
    if n == 3 {
        return vec![-FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2];
    }

    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2: f64 = m.iter().map(|v| v * v).sum();
    let ssumm2 = summ2.sqrt();
    let u = 1.0 / nf.sqrt();

    let an = poly(&C1, u) + m[n - 1] / ssumm2;
    let mut a = vec![0.0; n];

    if n > 5 {
        let an1 = poly(&C2, u) + m[n - 2] / ssumm2;
        let phi = (summ2 - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
            / (1.0 - 2.0 * an.powi(2) - 2.0 * an1.powi(2));
        let fac = phi.sqrt();
        for i in 2..n - 2 {
            a[i] = m[i] / fac;
        }
        a[1] = -an1;
        a[n - 2] = an1;
    } else {
        let phi = (summ2 - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * an.powi(2));
        let fac = phi.sqrt();
        for i in 1..n - 1 {
            a[i] = m[i] / fac;
        }
    }
    a[0] = -an;
    a[n - 1] = an;

    a
}

fn p_value(w: f64, n: usize, normal: &Normal) -> f64 {
    if n == 3 {
        let p = 6.0 / PI * (w.sqrt().asin() - 0.75f64.sqrt().asin());
        return p.clamp(0.0, 1.0);
    }
    if w >= 1.0 {
        return 1.0;
    }

    let nf = n as f64;
    let mut y = (1.0 - w).ln();

    let (mean, sigma) = if n <= 11 {
        let gamma = poly(&GAMMA, nf);
        if y >= gamma {
            return 0.0;
        }
        y = -(gamma - y).ln();
        (poly(&SMALL_MEAN, nf), poly(&SMALL_SIGMA, nf).exp())
    } else {
        let ln_n = nf.ln();
        (poly(&LARGE_MEAN, ln_n), poly(&LARGE_SIGMA, ln_n).exp())
    };

    // Upper tail of the standard normal
    normal.cdf(-(y - mean) / sigma)
}

/// Shapiro-Wilk W statistic and p-value for `data.len() >= 3`.
///
/// A sample with zero range is reported as `(1.0, 1.0)`.
pub fn shapiro_wilk(data: &[f64]) -> Option<(f64, f64)> {
    let n = data.len();
    if n < 3 {
        return None;
    }

    let normal = Normal::new(0.0, 1.0).ok()?;

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if ss == 0.0 {
        return Some((1.0, 1.0));
    }

    let a = coefficients(n, &normal);
    let numerator: f64 = a.iter().zip(x.iter()).map(|(ai, xi)| ai * xi).sum();
    let w = (numerator * numerator / ss).min(1.0);

    Some((w, p_value(w, n, &normal)))
}
