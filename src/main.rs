//! CLI entry point for the wunderground scrape tool.
//!
//! Provides subcommands for scraping hourly weather observations into a CSV
//! file and for averaging such a file per calendar hour.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use wu_scrape::{
    average,
    collect::{self, OnConflict, ScrapeConfig},
};

#[derive(Parser)]
#[command(name = "wu-scrape")]
#[command(about = "Scrape and average hourly weather history from wunderground.com", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape hourly observations for a date range into a CSV file
    Scrape {
        /// Location slug as used by wunderground.com, e.g. "brussels"
        location: String,

        /// First date to scrape
        #[arg(short, long, value_name = "YYYY-MM-DD")]
        start: NaiveDate,

        /// Last date to scrape, inclusive; defaults to today
        #[arg(short, long, value_name = "YYYY-MM-DD", conflicts_with = "days")]
        end: Option<NaiveDate>,

        /// Number of days to scrape starting at --start, instead of --end
        #[arg(short, long)]
        days: Option<u32>,

        /// Output CSV path; defaults to <location>_<start>_<end>.csv
        #[arg(short, long)]
        output: Option<String>,

        /// What to do when the output file already exists
        #[arg(long, value_enum, default_value_t = OnConflict::Fail)]
        on_conflict: OnConflict,

        /// Country code used in wunderground URLs
        #[arg(long, default_value = "be")]
        country: String,

        /// WebDriver endpoint to drive the browser through;
        /// falls back to the WEBDRIVER_URL environment variable
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Per-page load timeout in seconds
        #[arg(long, default_value_t = 30)]
        page_timeout: u64,

        /// Run the browser with a visible window instead of headless
        #[arg(long, default_value_t = false)]
        headed: bool,
    },
    /// Average an observation CSV into one row per calendar hour
    Average {
        /// Raw observation CSV produced by the scrape subcommand
        filename: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/wu_scrape.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("wu_scrape.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            location,
            start,
            end,
            days,
            output,
            on_conflict,
            country,
            webdriver_url,
            page_timeout,
            headed,
        } => {
            let webdriver_url = webdriver_url
                .or_else(|| std::env::var("WEBDRIVER_URL").ok())
                .unwrap_or_else(|| "http://localhost:4444".to_string());

            let config = ScrapeConfig::new(
                location,
                country,
                start,
                end,
                days,
                output,
                on_conflict,
                webdriver_url,
                Duration::from_secs(page_timeout),
                !headed,
            )?;
            collect::run(&config).await?;
        }
        Commands::Average { filename } => {
            average::run(&filename)?;
        }
    }

    Ok(())
}
