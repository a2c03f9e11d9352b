//! Jarque-Bera test

use super::moments;

/// Jarque-Bera statistic and chi-square(2) p-value.
///
/// Uses biased central moments. A sample with zero variance yields NaN.
pub fn jarque_bera(data: &[f64]) -> (f64, f64) {
    let n = data.len() as f64;
    let (_, m2, m3, m4) = moments(data);

    if m2 == 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let skewness = m3 / m2.powf(1.5);
    let excess_kurtosis = m4 / (m2 * m2) - 3.0;
    let statistic = n / 6.0 * (skewness.powi(2) + excess_kurtosis.powi(2) / 4.0);

    (statistic, chi2_survival(statistic, 2))
}

fn chi2_survival(x: f64, df: usize) -> f64 {
    use statrs::distribution::{ChiSquared, ContinuousCDF};

    if let Ok(chi2) = ChiSquared::new(df as f64) {
        1.0 - chi2.cdf(x)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_sequence() {
        let (stat, p) = jarque_bera(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_relative_eq!(stat, 0.352083333, epsilon = 1e-6);
        // chi2(2) survival is exp(-x / 2)
        assert_relative_eq!(p, (-stat / 2.0).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_constant_sample() {
        let (stat, p) = jarque_bera(&[3.0, 3.0, 3.0, 3.0]);
        assert!(stat.is_nan());
        assert!(p.is_nan());
    }
}
