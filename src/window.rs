//! Event window construction
//!
//! Aligns each event's transaction date to its anchor session and tags the
//! surrounding trading days with their relative position.

use crate::calendar::TradingCalendar;
use crate::data::Event;
use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::warn;

/// One trading day of an event window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    pub relative_position: i32,
    pub date: NaiveDate,
}

/// Fixed-length run of trading days around an event's anchor day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWindow {
    pub event: Event,
    /// Trading day the transaction date resolves to
    pub anchor: NaiveDate,
    /// Ordered by relative position, contiguous from `period_start`
    pub entries: Vec<WindowEntry>,
}

impl EventWindow {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An event that could not be windowed
#[derive(Debug)]
pub struct EventFailure {
    pub event: Event,
    pub error: AnalysisError,
}

/// Windows for a batch of events plus the events that failed
#[derive(Debug, Default)]
pub struct WindowBatch {
    pub windows: Vec<EventWindow>,
    pub failures: Vec<EventFailure>,
}

/// Builds event windows from a trading calendar and an offset range
#[derive(Debug, Clone, Copy)]
pub struct EventWindowBuilder<'a> {
    calendar: &'a TradingCalendar,
    period_start: i32,
    period_end: i32,
}

impl<'a> EventWindowBuilder<'a> {
    pub fn new(calendar: &'a TradingCalendar, period_start: i32, period_end: i32) -> Result<Self> {
        if period_start >= period_end {
            return Err(AnalysisError::InvalidInput(format!(
                "period_start ({}) must be less than period_end ({})",
                period_start, period_end
            )));
        }

        Ok(Self {
            calendar,
            period_start,
            period_end,
        })
    }

    /// Build one event's window
    pub fn build(&self, event: &Event) -> Result<EventWindow> {
        let days = self
            .calendar
            .window_around(event.transaction_date, self.period_start, self.period_end)?;

        let entries: Vec<WindowEntry> = (self.period_start..self.period_end)
            .zip(days.iter().copied())
            .map(|(relative_position, date)| WindowEntry {
                relative_position,
                date,
            })
            .collect();

        Ok(EventWindow {
            event: *event,
            anchor: self.calendar.nearest_trading_day(event.transaction_date),
            entries,
        })
    }

    /// Build windows for every distinct event, in event-key order.
    ///
    /// Per-event failures are collected; they do not abort the batch.
    pub fn build_all(&self, events: &[Event]) -> WindowBatch {
        let distinct: BTreeSet<Event> = events.iter().copied().collect();
        let mut batch = WindowBatch::default();

        for event in distinct {
            match self.build(&event) {
                Ok(window) => batch.windows.push(window),
                Err(error) => {
                    warn!("Skipping event {}: {}", event, error);
                    batch.failures.push(EventFailure { event, error });
                }
            }
        }

        batch
    }
}
