//! Trading activity analyzer
//!
//! Drives the batch: fetch calendar and volumes, build and join event
//! windows, then optionally test normality and plot each event.

use crate::calendar::TradingCalendar;
use crate::config::AnalysisConfig;
use crate::data::{CalendarSource, DataLoader, Event, VolumeSource};
use crate::error::{AnalysisError, Result};
use crate::join::{EventActivity, VolumeJoiner, VolumeTable};
use crate::normality::{NormalityMethod, NormalityReport, NormalityTester};
use crate::plot::{ActivityVisualizer, RenderSummary};
use crate::window::{EventFailure, EventWindowBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Joined event windows plus the events that could not be windowed
#[derive(Debug, Default)]
pub struct ActivityData {
    pub activities: Vec<EventActivity>,
    pub failures: Vec<EventFailure>,
}

impl ActivityData {
    pub fn row_count(&self) -> usize {
        self.activities.iter().map(|a| a.rows.len()).sum()
    }
}

/// Result of a normality pass, with the file it was written to
#[derive(Debug)]
pub struct TestRun {
    pub method: NormalityMethod,
    pub report: NormalityReport,
    pub path: PathBuf,
}

/// Everything a full run produced
#[derive(Debug)]
pub struct AnalysisReport {
    pub data: ActivityData,
    pub test: Option<TestRun>,
    pub plots: Option<RenderSummary>,
}

/// Event-window volume analysis over injected data sources
pub struct TradingActivityAnalyzer<'a> {
    config: AnalysisConfig,
    calendar_source: &'a dyn CalendarSource,
    volume_source: &'a dyn VolumeSource,
}

impl<'a> TradingActivityAnalyzer<'a> {
    /// Validate the configuration and create the output directory
    pub fn new(
        config: AnalysisConfig,
        calendar_source: &'a dyn CalendarSource,
        volume_source: &'a dyn VolumeSource,
    ) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.output_dir)
            .map_err(|e| AnalysisError::output_write(&config.output_dir, e))?;

        Ok(Self {
            config,
            calendar_source,
            volume_source,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Fetch the calendar and volumes, then build and join every event window.
    ///
    /// Source failures abort; per-event window failures are collected.
    pub fn fetch_trading_data(&self, events: &[Event]) -> Result<ActivityData> {
        let cfg = &self.config;
        let calendar =
            TradingCalendar::from_source(self.calendar_source, cfg.year_start, cfg.year_end)?;

        let observations = self.volume_source.observations(cfg.year_start, cfg.year_end)?;
        let table: VolumeTable = observations.iter().collect();
        info!("Loaded {} volume observations", table.len());
        if table.duplicates() > 0 {
            warn!(
                "Dropped {} duplicate (security, date) observations, first kept",
                table.duplicates()
            );
        }

        let builder = EventWindowBuilder::new(&calendar, cfg.period_start, cfg.period_end)?;
        let batch = builder.build_all(events);
        let activities = VolumeJoiner::new(&table).join(&batch.windows);

        info!(
            "Built {} event windows, {} events failed",
            activities.len(),
            batch.failures.len()
        );

        Ok(ActivityData {
            activities,
            failures: batch.failures,
        })
    }

    /// Run one normality test over every event and write its CSV
    pub fn test_activity_normality(
        &self,
        data: &ActivityData,
        method: NormalityMethod,
    ) -> Result<TestRun> {
        let tester = NormalityTester::new(method);
        let report = tester.test_events(&data.activities);
        let path = tester.write_csv(&report.results, self.output_dir())?;

        Ok(TestRun {
            method,
            report,
            path,
        })
    }

    /// Render one chart per event under `<output_dir>/images/`
    pub fn plot_trading_activity(&self, data: &ActivityData) -> Result<RenderSummary> {
        ActivityVisualizer::new(self.output_dir()).render_all(&data.activities)
    }

    /// Export the joined windows to `<output_dir>/trading_activity_windows.csv`
    pub fn export_windows(&self, data: &ActivityData) -> Result<PathBuf> {
        let path = self.output_dir().join(crate::WINDOWS_FILE_NAME);
        DataLoader::save_joined(&data.activities, &path)?;
        info!("Wrote {} joined rows to {:?}", data.row_count(), path);
        Ok(path)
    }

    /// Fetch, then optionally test and plot
    pub fn check_trading_activity(
        &self,
        events: &[Event],
        test: Option<NormalityMethod>,
        plot: bool,
    ) -> Result<AnalysisReport> {
        let data = self.fetch_trading_data(events)?;

        let test = match test {
            Some(method) => Some(self.test_activity_normality(&data, method)?),
            None => None,
        };

        let plots = if plot {
            Some(self.plot_trading_activity(&data)?)
        } else {
            None
        };

        Ok(AnalysisReport { data, test, plots })
    }

    /// Run with the test and plot options from the configuration
    pub fn run(&self, events: &[Event]) -> Result<AnalysisReport> {
        self.check_trading_activity(events, self.config.test, self.config.plot)
    }
}
