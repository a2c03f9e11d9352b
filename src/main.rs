//! Trading Activity CLI
//!
//! Builds event windows around transaction dates, joins daily volume, and
//! optionally tests normality and plots each event.
//!
//! ```bash
//! trading_activity analyze --events events.csv --volumes dsf.csv --test Jarque-Bera --plot
//! trading_activity windows --events events.csv --volumes dsf.csv
//! trading_activity calendar --start 2021-01-01 --end 2021-12-31 --output days.csv
//! ```

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use csv::Writer;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use trading_activity::{
    load_config, AnalysisConfig, AnalysisReport, CalendarSource, CsvCalendarSource,
    CsvVolumeSource, DataLoader, NormalityMethod, TradingActivityAnalyzer, TradingCalendar,
};

#[derive(Parser)]
#[command(name = "trading_activity")]
#[command(about = "Event-window trading volume analysis")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build windows, run a normality test and/or plot every event
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Normality test (Jarque-Bera, Shapiro-Wilk, Anderson-Darling)
        #[arg(short, long)]
        test: Option<String>,

        /// Render one volume chart per event
        #[arg(short, long)]
        plot: bool,
    },

    /// Build windows and export the joined table only
    Windows {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write a Monday-Friday trading calendar CSV
    Calendar {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// CSV with a `date` column of market holidays
        #[arg(long)]
        holidays: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct InputArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Events CSV (`trans_date,permno`)
    #[arg(short, long)]
    events: PathBuf,

    /// Daily stock file CSV (`permno,date,vol`)
    #[arg(long)]
    volumes: PathBuf,

    /// Trading calendar CSV (`date`); defaults to the dates in --volumes
    #[arg(long)]
    calendar: Option<PathBuf>,

    /// Inclusive lower relative offset
    #[arg(long, allow_hyphen_values = true)]
    period_start: Option<i32>,

    /// Exclusive upper relative offset
    #[arg(long, allow_hyphen_values = true)]
    period_end: Option<i32>,

    /// First calendar year to fetch
    #[arg(long)]
    year_start: Option<i32>,

    /// Last calendar year to fetch
    #[arg(long)]
    year_end: Option<i32>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl InputArgs {
    fn resolve_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => AnalysisConfig::default(),
        };

        if let Some(v) = self.period_start {
            config.period_start = v;
        }
        if let Some(v) = self.period_end {
            config.period_end = v;
        }
        if let Some(v) = self.year_start {
            config.year_start = v;
        }
        if let Some(v) = self.year_end {
            config.year_end = v;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }

        Ok(config)
    }
}

fn print_summary(report: &AnalysisReport) {
    println!("\n{}", "Trading Activity Summary".bold().blue());
    println!("{}", "=".repeat(40).blue());
    println!(
        "{:<24} {}",
        "Events windowed:",
        report.data.activities.len().to_string().green()
    );
    println!("{:<24} {}", "Joined rows:", report.data.row_count());

    if !report.data.failures.is_empty() {
        println!(
            "{:<24} {}",
            "Events failed:",
            report.data.failures.len().to_string().red()
        );
        for failure in &report.data.failures {
            println!("  {} {}", failure.event, failure.error.to_string().dimmed());
        }
    }

    if let Some(run) = &report.test {
        println!(
            "{:<24} {} tested, {} rejected, {} skipped",
            format!("{}:", run.method),
            run.report.results.len(),
            run.report.rejected().to_string().yellow(),
            run.report.skipped.len()
        );
        println!("{:<24} {}", "Results file:", run.path.display());
    }

    if let Some(plots) = &report.plots {
        println!(
            "{:<24} {} succeeded, {} failed",
            "Plots:",
            plots.succeeded().to_string().green(),
            plots.failed.len()
        );
    }
}

fn run_analysis(input: &InputArgs, test: Option<NormalityMethod>, plot: bool) -> Result<AnalysisReport> {
    let config = input.resolve_config()?;
    let events = DataLoader::load_events(&input.events)
        .with_context(|| format!("Failed to load events from {:?}", input.events))?;
    info!("Loaded {} events", events.len());

    let volume_source = CsvVolumeSource::new(&input.volumes);
    let calendar_file = input.calendar.as_ref().map(CsvCalendarSource::new);
    let calendar_source: &dyn CalendarSource = match &calendar_file {
        Some(source) => source,
        None => &volume_source,
    };

    let test = test.or(config.test);
    let plot = plot || config.plot;
    let analyzer = TradingActivityAnalyzer::new(config, calendar_source, &volume_source)?;
    let report = analyzer.check_trading_activity(&events, test, plot)?;

    Ok(report)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Commands::Analyze { input, test, plot } => {
            let test = test
                .map(|name| name.parse::<NormalityMethod>())
                .transpose()?;
            let report = run_analysis(&input, test, plot)?;
            print_summary(&report);
        }

        Commands::Windows { input } => {
            let config = input.resolve_config()?;
            let events = DataLoader::load_events(&input.events)?;

            let volume_source = CsvVolumeSource::new(&input.volumes);
            let calendar_file = input.calendar.as_ref().map(CsvCalendarSource::new);
            let calendar_source: &dyn CalendarSource = match &calendar_file {
                Some(source) => source,
                None => &volume_source,
            };

            let analyzer = TradingActivityAnalyzer::new(config, calendar_source, &volume_source)?;
            let data = analyzer.fetch_trading_data(&events)?;
            let path = analyzer.export_windows(&data)?;

            println!(
                "{} {} rows for {} events to {}",
                "Saved".green(),
                data.row_count(),
                data.activities.len(),
                path.display()
            );
            if !data.failures.is_empty() {
                println!("{} {} events", "Failed:".red(), data.failures.len());
            }
        }

        Commands::Calendar {
            start,
            end,
            holidays,
            output,
        } => {
            let holidays = match holidays {
                Some(path) => CsvCalendarSource::new(&path)
                    .trading_days(start.year(), end.year())
                    .with_context(|| format!("Failed to load holidays from {:?}", path))?,
                None => Vec::new(),
            };

            let calendar = TradingCalendar::weekdays(start, end, &holidays)?;

            let mut writer = Writer::from_path(&output)
                .with_context(|| format!("Failed to create {:?}", output))?;
            writer.write_record(["date"])?;
            for day in calendar.days() {
                writer.write_record([day.format("%Y-%m-%d").to_string()])?;
            }
            writer.flush()?;

            println!(
                "{} {} trading days to {}",
                "Saved".green(),
                calendar.len(),
                output.display()
            );
        }
    }

    Ok(())
}
