//! Data loading and saving utilities
//!
//! Loads the event list from CSV and exports joined event windows.

use super::types::Event;
use crate::error::{AnalysisError, Result};
use crate::join::EventActivity;
use csv::{Reader, Writer};
use std::fs::File;
use std::path::Path;

/// Data loader for CSV files
pub struct DataLoader;

impl DataLoader {
    /// Load events from a CSV file with `trans_date,permno` columns
    pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
        let file = File::open(&path).map_err(|e| {
            AnalysisError::InvalidInput(format!("failed to open {:?}: {}", path.as_ref(), e))
        })?;
        let mut reader = Reader::from_reader(file);

        let mut events = Vec::new();
        for result in reader.deserialize() {
            let event: Event = result?;
            events.push(event);
        }

        Ok(events)
    }

    /// Save events to a CSV file
    pub fn save_events<P: AsRef<Path>>(events: &[Event], path: P) -> Result<()> {
        let file = File::create(&path).map_err(|e| AnalysisError::output_write(path.as_ref(), e))?;
        let mut writer = Writer::from_writer(file);

        for event in events {
            writer.serialize(event)?;
        }

        writer
            .flush()
            .map_err(|e| AnalysisError::output_write(path.as_ref(), e))?;
        Ok(())
    }

    /// Save the joined event windows, one row per (event, relative position).
    ///
    /// Absent volumes are written as empty fields, never as zero.
    pub fn save_joined<P: AsRef<Path>>(activities: &[EventActivity], path: P) -> Result<()> {
        let file = File::create(&path).map_err(|e| AnalysisError::output_write(path.as_ref(), e))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(["trans_date", "permno", "timeline", "date", "vol"])?;

        for activity in activities {
            for row in &activity.rows {
                writer.write_record([
                    activity.event.transaction_date.format("%Y-%m-%d").to_string(),
                    activity.event.security_id.to_string(),
                    row.relative_position.to_string(),
                    row.date.format("%Y-%m-%d").to_string(),
                    row.volume.map(|v| v.to_string()).unwrap_or_default(),
                ])?;
            }
        }

        writer
            .flush()
            .map_err(|e| AnalysisError::output_write(path.as_ref(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::JoinedRow;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_save_and_load_events() {
        let events = vec![
            Event::new(day(2021, 6, 15), 14593),
            Event::new(day(2022, 1, 10), 10107),
        ];

        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");

        DataLoader::save_events(&events, &path).unwrap();
        let loaded = DataLoader::load_events(&path).unwrap();

        assert_eq!(loaded, events);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("trans_date,permno"));
    }

    #[test]
    fn test_save_joined_keeps_gaps() {
        let event = Event::new(day(2021, 6, 15), 14593);
        let activity = EventActivity {
            event,
            anchor: day(2021, 6, 15),
            rows: vec![
                JoinedRow {
                    relative_position: 0,
                    date: day(2021, 6, 15),
                    volume: Some(1200.0),
                },
                JoinedRow {
                    relative_position: 1,
                    date: day(2021, 6, 16),
                    volume: None,
                },
            ],
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("joined.csv");
        DataLoader::save_joined(&[activity], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "trans_date,permno,timeline,date,vol");
        assert_eq!(lines[1], "2021-06-15,14593,0,2021-06-15,1200");
        assert_eq!(lines[2], "2021-06-15,14593,1,2021-06-16,");
    }
}
