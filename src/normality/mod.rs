//! Normality testing of per-event volume samples
//!
//! Three interchangeable tests, selected by name:
//!
//! - `Jarque-Bera` and `Shapiro-Wilk` reject when the p-value is below 0.05
//! - `Anderson-Darling` rejects when the statistic exceeds the 5% critical value

mod anderson_darling;
mod jarque_bera;
mod shapiro_wilk;

pub use anderson_darling::{anderson_darling, critical_values, AndersonDarling, SIGNIFICANCE_LEVELS};
pub use jarque_bera::jarque_bera;
pub use shapiro_wilk::shapiro_wilk;

use crate::data::Event;
use crate::error::{AnalysisError, Result};
use crate::join::EventActivity;
use csv::Writer;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Rejection threshold for p-value based tests
pub const P_VALUE_THRESHOLD: f64 = 0.05;

/// Index into the Anderson-Darling table (5% significance)
pub const ANDERSON_LEVEL_INDEX: usize = 2;

/// Samples must be strictly larger than this to be tested
pub const MIN_SAMPLE_SIZE: usize = 2;

/// Mean and biased central moments m2, m3, m4
pub(crate) fn moments(data: &[f64]) -> (f64, f64, f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;

    let (m2, m3, m4) = data.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), x| {
        let d = x - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });

    (mean, m2 / n, m3 / n, m4 / n)
}

/// Supported normality tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalityMethod {
    #[serde(rename = "Jarque-Bera")]
    JarqueBera,
    #[serde(rename = "Shapiro-Wilk")]
    ShapiroWilk,
    #[serde(rename = "Anderson-Darling")]
    AndersonDarling,
}

impl NormalityMethod {
    pub const ALL: [NormalityMethod; 3] = [
        NormalityMethod::JarqueBera,
        NormalityMethod::ShapiroWilk,
        NormalityMethod::AndersonDarling,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NormalityMethod::JarqueBera => "Jarque-Bera",
            NormalityMethod::ShapiroWilk => "Shapiro-Wilk",
            NormalityMethod::AndersonDarling => "Anderson-Darling",
        }
    }

    /// Whether the decision compares a statistic against a critical value
    pub fn uses_critical_value(&self) -> bool {
        matches!(self, NormalityMethod::AndersonDarling)
    }

    /// CSV header for this method's result file
    pub fn csv_header(&self) -> &'static [&'static str] {
        if self.uses_critical_value() {
            &[
                "trans_date",
                "permno",
                "test",
                "statistic",
                "critical_value",
                "significance_level",
                "reject",
            ]
        } else {
            &["trans_date", "permno", "test", "statistic", "p_value", "reject"]
        }
    }

    /// Result file name: `trading_activity_<method>.csv`
    pub fn file_name(&self) -> String {
        format!("trading_activity_{}.csv", self.name())
    }
}

impl fmt::Display for NormalityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for NormalityMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "jarquebera" | "jb" => Ok(NormalityMethod::JarqueBera),
            "shapirowilk" | "sw" => Ok(NormalityMethod::ShapiroWilk),
            "andersondarling" | "ad" => Ok(NormalityMethod::AndersonDarling),
            _ => Err(AnalysisError::InvalidInput(format!(
                "unknown normality test: {}",
                s
            ))),
        }
    }
}

/// How the reject decision was reached
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    PValue {
        p_value: f64,
    },
    CriticalValue {
        critical_value: f64,
        /// Percent, e.g. `5.0`
        significance_level: f64,
    },
}

/// Statistic, decision basis and reject flag for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub decision: Decision,
    pub reject: bool,
}

/// Normality test result for one event
#[derive(Debug, Clone, PartialEq)]
pub struct NormalityResult {
    pub event: Event,
    pub method: NormalityMethod,
    pub outcome: TestOutcome,
}

impl NormalityResult {
    fn csv_record(&self) -> Vec<String> {
        let mut record = vec![
            self.event.transaction_date.format("%Y-%m-%d").to_string(),
            self.event.security_id.to_string(),
            self.method.name().to_string(),
            self.outcome.statistic.to_string(),
        ];

        match self.outcome.decision {
            Decision::PValue { p_value } => record.push(p_value.to_string()),
            Decision::CriticalValue {
                critical_value,
                significance_level,
            } => {
                record.push(critical_value.to_string());
                record.push(format!("{:.1}", significance_level));
            }
        }

        record.push(if self.outcome.reject { "True" } else { "False" }.to_string());
        record
    }
}

/// Results of one test pass
#[derive(Debug, Clone, Default)]
pub struct NormalityReport {
    /// One row per tested event, in event-key order
    pub results: Vec<NormalityResult>,
    /// Events whose sample was too small to test
    pub skipped: Vec<Event>,
}

impl NormalityReport {
    pub fn rejected(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.reject).count()
    }
}

/// Runs one normality test over event volume samples
#[derive(Debug, Clone, Copy)]
pub struct NormalityTester {
    method: NormalityMethod,
}

impl NormalityTester {
    pub fn new(method: NormalityMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> NormalityMethod {
        self.method
    }

    /// Test a single sample; `None` when it holds two values or fewer
    pub fn test(&self, samples: &[f64]) -> Option<TestOutcome> {
        if samples.len() <= MIN_SAMPLE_SIZE {
            return None;
        }

        let outcome = match self.method {
            NormalityMethod::JarqueBera => {
                let (statistic, p_value) = jarque_bera(samples);
                TestOutcome {
                    statistic,
                    decision: Decision::PValue { p_value },
                    reject: p_value < P_VALUE_THRESHOLD,
                }
            }
            NormalityMethod::ShapiroWilk => {
                let (statistic, p_value) = shapiro_wilk(samples)?;
                TestOutcome {
                    statistic,
                    decision: Decision::PValue { p_value },
                    reject: p_value < P_VALUE_THRESHOLD,
                }
            }
            NormalityMethod::AndersonDarling => {
                let result = anderson_darling(samples)?;
                let critical_value = result.critical_value(ANDERSON_LEVEL_INDEX);
                TestOutcome {
                    statistic: result.statistic,
                    decision: Decision::CriticalValue {
                        critical_value,
                        significance_level: SIGNIFICANCE_LEVELS[ANDERSON_LEVEL_INDEX],
                    },
                    reject: result.statistic > critical_value,
                }
            }
        };

        Some(outcome)
    }

    /// Test every event's observed volumes, in the given order
    pub fn test_events(&self, activities: &[EventActivity]) -> NormalityReport {
        let pb = ProgressBar::new(activities.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Testing normality");

        let mut report = NormalityReport::default();

        for activity in activities {
            let volumes = activity.volumes();
            match self.test(&volumes) {
                Some(outcome) => report.results.push(NormalityResult {
                    event: activity.event,
                    method: self.method,
                    outcome,
                }),
                None => {
                    debug!(
                        "Skipping {} for {}: {} observations",
                        self.method,
                        activity.event,
                        volumes.len()
                    );
                    report.skipped.push(activity.event);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if !report.skipped.is_empty() {
            info!(
                "{}: {} events skipped with {} or fewer observations",
                self.method,
                report.skipped.len(),
                MIN_SAMPLE_SIZE
            );
        }

        report
    }

    /// Write the full result set to `<output_dir>/trading_activity_<method>.csv`
    pub fn write_csv(&self, results: &[NormalityResult], output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(self.method.file_name());
        let file = File::create(&path).map_err(|e| AnalysisError::output_write(&path, e))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(self.method.csv_header())?;
        for result in results {
            writer.write_record(result.csv_record())?;
        }

        writer
            .flush()
            .map_err(|e| AnalysisError::output_write(&path, e))?;

        info!("Wrote {} {} results to {:?}", results.len(), self.method, path);
        Ok(path)
    }
}
