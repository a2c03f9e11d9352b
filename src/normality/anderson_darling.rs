//! Anderson-Darling test for normality with estimated mean and variance

use statrs::distribution::{ContinuousCDF, Normal};

/// Stephens (1974) critical values for the normal case
const BASE_CRITICAL_VALUES: [f64; 5] = [0.576, 0.656, 0.787, 0.918, 1.092];

/// Significance levels (percent) matching `BASE_CRITICAL_VALUES`
pub const SIGNIFICANCE_LEVELS: [f64; 5] = [15.0, 10.0, 5.0, 2.5, 1.0];

/// Anderson-Darling result against the full critical value table
#[derive(Debug, Clone, PartialEq)]
pub struct AndersonDarling {
    pub statistic: f64,
    pub critical_values: [f64; 5],
}

impl AndersonDarling {
    /// Critical value at `SIGNIFICANCE_LEVELS[level]`
    pub fn critical_value(&self, level: usize) -> f64 {
        self.critical_values[level]
    }
}

/// Small-sample adjusted critical values, rounded to three decimals
pub fn critical_values(n: usize) -> [f64; 5] {
    let nf = n as f64;
    let scale = 1.0 + 4.0 / nf - 25.0 / (nf * nf);
    BASE_CRITICAL_VALUES.map(|v| (v / scale * 1000.0).round() / 1000.0)
}

/// A² statistic using the sample standard deviation (ddof = 1).
///
/// A sample with zero variance yields a NaN statistic.
pub fn anderson_darling(data: &[f64]) -> Option<AndersonDarling> {
    let n = data.len();
    if n < 2 {
        return None;
    }

    let normal = Normal::new(0.0, 1.0).ok()?;
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    let std = (data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (nf - 1.0)).sqrt();

    let statistic = if std == 0.0 {
        f64::NAN
    } else {
        let mut w: Vec<f64> = data.iter().map(|v| (v - mean) / std).collect();
        w.sort_by(|a, b| a.total_cmp(b));

        let sum: f64 = (1..=n)
            .map(|i| {
                let log_cdf = normal.cdf(w[i - 1]).ln();
                let log_sf = normal.cdf(-w[n - i]).ln();
                (2.0 * i as f64 - 1.0) / nf * (log_cdf + log_sf)
            })
            .sum();
        -nf - sum
    };

    Some(AndersonDarling {
        statistic,
        critical_values: critical_values(n),
    })
}
