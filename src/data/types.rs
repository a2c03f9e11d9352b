//! Core data types
//!
//! - Event: a transaction date for one security
//! - VolumeObservation: one daily volume record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Security identifier (CRSP PERMNO style integer)
pub type SecurityId = u64;

/// A transaction date for one security.
///
/// Ordered by `(transaction_date, security_id)`, which is the order every
/// per-event output follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "trans_date")]
    pub transaction_date: NaiveDate,
    #[serde(rename = "permno")]
    pub security_id: SecurityId,
}

impl Event {
    pub fn new(transaction_date: NaiveDate, security_id: SecurityId) -> Self {
        Self {
            transaction_date,
            security_id,
        }
    }

    /// File stem unique per event: `<securityId>_<YYYY-MM-DD>`
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}",
            self.security_id,
            self.transaction_date.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.security_id, self.transaction_date)
    }
}

/// Daily traded volume for one security
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeObservation {
    #[serde(rename = "permno")]
    pub security_id: SecurityId,
    pub date: NaiveDate,
    #[serde(rename = "vol")]
    pub volume: f64,
}

impl VolumeObservation {
    pub fn new(security_id: SecurityId, date: NaiveDate, volume: f64) -> Self {
        Self {
            security_id,
            date,
            volume,
        }
    }
}
