//! External data sources
//!
//! The calendar and volume sources are collaborators passed into the
//! analyzer at construction. CSV-backed sources read CRSP-style daily stock
//! file exports; the in-memory sources serve fixtures and tests.

use super::types::{SecurityId, VolumeObservation};
use crate::error::{AnalysisError, Result};
use chrono::{Datelike, NaiveDate};
use csv::Reader;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Yields the distinct trading session dates within a year range
pub trait CalendarSource {
    fn trading_days(&self, year_start: i32, year_end: i32) -> Result<Vec<NaiveDate>>;
}

/// Yields daily volume observations within a year range
pub trait VolumeSource {
    fn observations(&self, year_start: i32, year_end: i32) -> Result<Vec<VolumeObservation>>;
}

fn in_years(date: NaiveDate, year_start: i32, year_end: i32) -> bool {
    (year_start..=year_end).contains(&date.year())
}

/// Fixed list of trading days
#[derive(Debug, Clone, Default)]
pub struct InMemoryCalendar {
    days: Vec<NaiveDate>,
}

impl InMemoryCalendar {
    pub fn new(days: Vec<NaiveDate>) -> Self {
        Self { days }
    }
}

impl CalendarSource for InMemoryCalendar {
    fn trading_days(&self, year_start: i32, year_end: i32) -> Result<Vec<NaiveDate>> {
        Ok(self
            .days
            .iter()
            .copied()
            .filter(|d| in_years(*d, year_start, year_end))
            .collect())
    }
}

/// Fixed list of volume observations
#[derive(Debug, Clone, Default)]
pub struct InMemoryVolumes {
    observations: Vec<VolumeObservation>,
}

impl InMemoryVolumes {
    pub fn new(observations: Vec<VolumeObservation>) -> Self {
        Self { observations }
    }
}

impl VolumeSource for InMemoryVolumes {
    fn observations(&self, year_start: i32, year_end: i32) -> Result<Vec<VolumeObservation>> {
        Ok(self
            .observations
            .iter()
            .filter(|o| in_years(o.date, year_start, year_end))
            .cloned()
            .collect())
    }
}

/// Raw daily stock file row; `vol` is empty for missing volume
#[derive(Debug, Deserialize)]
struct DailyStockRecord {
    permno: SecurityId,
    date: NaiveDate,
    vol: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CalendarRecord {
    date: NaiveDate,
}

/// Daily stock file export with `permno,date,vol` columns.
///
/// Also serves as a calendar source: every date carrying at least one
/// observation is a trading day.
#[derive(Debug, Clone)]
pub struct CsvVolumeSource {
    path: PathBuf,
}

impl CsvVolumeSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_records(&self) -> std::result::Result<Vec<DailyStockRecord>, String> {
        let file = File::open(&self.path)
            .map_err(|e| format!("failed to open {:?}: {}", self.path, e))?;
        let mut reader = Reader::from_reader(file);

        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: DailyStockRecord =
                result.map_err(|e| format!("failed to parse {:?}: {}", self.path, e))?;
            records.push(record);
        }
        Ok(records)
    }
}

impl VolumeSource for CsvVolumeSource {
    fn observations(&self, year_start: i32, year_end: i32) -> Result<Vec<VolumeObservation>> {
        let records = self.read_records().map_err(AnalysisError::ObservationFetch)?;

        let mut missing = 0usize;
        let observations: Vec<VolumeObservation> = records
            .into_iter()
            .filter(|r| in_years(r.date, year_start, year_end))
            .filter_map(|r| match r.vol {
                Some(volume) => Some(VolumeObservation::new(r.permno, r.date, volume)),
                None => {
                    missing += 1;
                    None
                }
            })
            .collect();

        if missing > 0 {
            debug!("Skipped {} rows without volume in {:?}", missing, self.path);
        }

        Ok(observations)
    }
}

impl CalendarSource for CsvVolumeSource {
    fn trading_days(&self, year_start: i32, year_end: i32) -> Result<Vec<NaiveDate>> {
        let records = self.read_records().map_err(AnalysisError::CalendarFetch)?;
        let days: BTreeSet<NaiveDate> = records
            .into_iter()
            .map(|r| r.date)
            .filter(|d| in_years(*d, year_start, year_end))
            .collect();
        Ok(days.into_iter().collect())
    }
}

/// Calendar file with a single `date` column
#[derive(Debug, Clone)]
pub struct CsvCalendarSource {
    path: PathBuf,
}

impl CsvCalendarSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CalendarSource for CsvCalendarSource {
    fn trading_days(&self, year_start: i32, year_end: i32) -> Result<Vec<NaiveDate>> {
        let file = File::open(&self.path).map_err(|e| {
            AnalysisError::CalendarFetch(format!("failed to open {:?}: {}", self.path, e))
        })?;
        let mut reader = Reader::from_reader(file);

        let mut days = Vec::new();
        for result in reader.deserialize() {
            let record: CalendarRecord = result.map_err(|e| {
                AnalysisError::CalendarFetch(format!("failed to parse {:?}: {}", self.path, e))
            })?;
            if in_years(record.date, year_start, year_end) {
                days.push(record.date);
            }
        }
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_in_memory_filters_years() {
        let source = InMemoryCalendar::new(vec![day(2019, 12, 31), day(2020, 1, 2), day(2024, 1, 2)]);
        let days = source.trading_days(2020, 2023).unwrap();
        assert_eq!(days, vec![day(2020, 1, 2)]);
    }

    #[test]
    fn test_csv_volume_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dsf.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "permno,date,vol").unwrap();
        writeln!(file, "14593,2021-06-14,1500").unwrap();
        writeln!(file, "14593,2021-06-15,").unwrap();
        writeln!(file, "10107,2021-06-15,900.5").unwrap();
        writeln!(file, "10107,2019-06-15,1.0").unwrap();
        drop(file);

        let source = CsvVolumeSource::new(&path);
        let observations = source.observations(2020, 2023).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0], VolumeObservation::new(14593, day(2021, 6, 14), 1500.0));
        assert_eq!(observations[1].volume, 900.5);

        // Rows without volume still mark a trading session
        let days = source.trading_days(2020, 2023).unwrap();
        assert_eq!(days, vec![day(2021, 6, 14), day(2021, 6, 15)]);
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let source = CsvVolumeSource::new("/nonexistent/dsf.csv");
        assert!(matches!(
            source.observations(2020, 2023),
            Err(AnalysisError::ObservationFetch(_))
        ));
        assert!(matches!(
            CsvCalendarSource::new("/nonexistent/days.csv").trading_days(2020, 2023),
            Err(AnalysisError::CalendarFetch(_))
        ));
    }
}
