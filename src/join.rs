//! Volume join
//!
//! Attaches daily volume observations to event windows by exact
//! (security, date) match.

use crate::data::{Event, SecurityId, VolumeObservation};
use crate::window::EventWindow;
use chrono::NaiveDate;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Volume observations keyed by (security, date).
///
/// The first observation encountered for a key wins; later duplicates are
/// counted and dropped.
#[derive(Debug, Clone, Default)]
pub struct VolumeTable {
    volumes: HashMap<(SecurityId, NaiveDate), f64>,
    duplicates: usize,
}

impl VolumeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observation: &VolumeObservation) {
        match self.volumes.entry((observation.security_id, observation.date)) {
            Entry::Vacant(slot) => {
                slot.insert(observation.volume);
            }
            Entry::Occupied(_) => self.duplicates += 1,
        }
    }

    pub fn get(&self, security_id: SecurityId, date: NaiveDate) -> Option<f64> {
        self.volumes.get(&(security_id, date)).copied()
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Number of observations dropped as duplicates
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

impl<'a> FromIterator<&'a VolumeObservation> for VolumeTable {
    fn from_iter<I: IntoIterator<Item = &'a VolumeObservation>>(iter: I) -> Self {
        let mut table = VolumeTable::new();
        for observation in iter {
            table.insert(observation);
        }
        table
    }
}

impl FromIterator<VolumeObservation> for VolumeTable {
    fn from_iter<I: IntoIterator<Item = VolumeObservation>>(iter: I) -> Self {
        let mut table = VolumeTable::new();
        for observation in iter {
            table.insert(&observation);
        }
        table
    }
}

/// One (event, relative position) row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRow {
    pub relative_position: i32,
    pub date: NaiveDate,
    /// `None` when no observation exists; never coerced to zero
    pub volume: Option<f64>,
}

/// Joined rows for one event, ordered by relative position
#[derive(Debug, Clone, PartialEq)]
pub struct EventActivity {
    pub event: Event,
    pub anchor: NaiveDate,
    pub rows: Vec<JoinedRow>,
}

impl EventActivity {
    /// Observed volumes in timeline order, gaps dropped
    pub fn volumes(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.volume).collect()
    }

    /// Number of rows without an observation
    pub fn missing(&self) -> usize {
        self.rows.iter().filter(|r| r.volume.is_none()).count()
    }
}

/// Joins volume observations onto event windows
pub struct VolumeJoiner<'a> {
    table: &'a VolumeTable,
}

impl<'a> VolumeJoiner<'a> {
    pub fn new(table: &'a VolumeTable) -> Self {
        Self { table }
    }

    /// Join a single window; every window entry yields exactly one row
    pub fn join_window(&self, window: &EventWindow) -> EventActivity {
        let security_id = window.event.security_id;
        let rows = window
            .entries
            .iter()
            .map(|entry| JoinedRow {
                relative_position: entry.relative_position,
                date: entry.date,
                volume: self.table.get(security_id, entry.date),
            })
            .collect();

        EventActivity {
            event: window.event,
            anchor: window.anchor,
            rows,
        }
    }

    /// Join every window, preserving window order
    pub fn join(&self, windows: &[EventWindow]) -> Vec<EventActivity> {
        let activities: Vec<EventActivity> =
            windows.iter().map(|w| self.join_window(w)).collect();

        let missing: usize = activities.iter().map(EventActivity::missing).sum();
        debug!(
            "Joined {} windows, {} rows without volume",
            activities.len(),
            missing
        );

        activities
    }
}
