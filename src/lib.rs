//! # Trading Activity
//!
//! Event-window analysis of daily trading volume around transaction dates.
//!
//! ## Pipeline
//!
//! - `calendar` - trading calendar with nearest-session resolution
//! - `window` - fixed-length event windows tagged with relative positions
//! - `join` - daily volumes attached to each window by (security, date)
//! - `normality` - Jarque-Bera, Shapiro-Wilk and Anderson-Darling tests
//! - `plot` - one PNG volume chart per event
//! - `analyzer` - batch driver over injected calendar and volume sources
//!
//! ## Example
//!
//! ```rust,no_run
//! use trading_activity::{
//!     AnalysisConfig, CsvVolumeSource, Event, NormalityMethod, TradingActivityAnalyzer,
//! };
//! use chrono::NaiveDate;
//!
//! fn main() -> trading_activity::Result<()> {
//!     let source = CsvVolumeSource::new("data/dsf.csv");
//!     let analyzer = TradingActivityAnalyzer::new(AnalysisConfig::default(), &source, &source)?;
//!
//!     let events = vec![Event::new(NaiveDate::from_ymd_opt(2021, 6, 15).unwrap(), 14593)];
//!     let report = analyzer.check_trading_activity(&events, Some(NormalityMethod::JarqueBera), true)?;
//!
//!     println!("{} events windowed", report.data.activities.len());
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod join;
pub mod normality;
pub mod plot;
pub mod window;

pub use analyzer::{ActivityData, AnalysisReport, TestRun, TradingActivityAnalyzer};
pub use calendar::TradingCalendar;
pub use config::{load_config, AnalysisConfig, ConfigError};
pub use data::{
    CalendarSource, CsvCalendarSource, CsvVolumeSource, DataLoader, Event, InMemoryCalendar,
    InMemoryVolumes, SecurityId, VolumeObservation, VolumeSource,
};
pub use error::{AnalysisError, Result};
pub use join::{EventActivity, JoinedRow, VolumeJoiner, VolumeTable};
pub use normality::{
    Decision, NormalityMethod, NormalityReport, NormalityResult, NormalityTester, TestOutcome,
};
pub use plot::{ActivityVisualizer, ChartConfig, RenderSummary};
pub use window::{EventFailure, EventWindow, EventWindowBuilder, WindowBatch, WindowEntry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the joined window export
pub const WINDOWS_FILE_NAME: &str = "trading_activity_windows.csv";
