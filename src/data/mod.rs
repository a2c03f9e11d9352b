//! Data structures, sources and CSV utilities

pub mod loader;
pub mod source;
pub mod types;

pub use loader::DataLoader;
pub use source::{
    CalendarSource, CsvCalendarSource, CsvVolumeSource, InMemoryCalendar, InMemoryVolumes,
    VolumeSource,
};
pub use types::{Event, SecurityId, VolumeObservation};
