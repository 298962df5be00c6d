//! Collector pipeline: drive a browser through a range of daily-history
//! pages, repair day-boundary dates, append rows to a CSV file.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::{Days, Local, NaiveDate};
use clap::ValueEnum;
use csv::WriterBuilder;
use tracing::{info, warn};

use crate::driver::{PageDriver, WebDriverClient, load_page};
use crate::meridiem::repair_dates;
use crate::page::{self, day_observations, station_name};
use crate::record::Observation;

const BASE_URL: &str = "https://www.wunderground.com";

/// What to do when the output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    /// Truncate the file and start over.
    Overwrite,
    /// Keep existing rows and append new ones after them.
    Append,
    /// Refuse to touch the file.
    Fail,
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub location: String,
    pub country: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub output: PathBuf,
    pub on_conflict: OnConflict,
    pub webdriver_url: String,
    pub page_timeout: Duration,
    pub headless: bool,
}

impl ScrapeConfig {
    /// Validates the date range and resolves the output path.
    ///
    /// `end` defaults to today; `days` is an alternative way to give the end
    /// date (`--days 1` scrapes only the start date). A default output name
    /// is derived from the location and range; an explicit name without an
    /// extension gets `.csv` appended.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        location: String,
        country: String,
        start: NaiveDate,
        end: Option<NaiveDate>,
        days: Option<u32>,
        output: Option<String>,
        on_conflict: OnConflict,
        webdriver_url: String,
        page_timeout: Duration,
        headless: bool,
    ) -> Result<Self> {
        let end = match (end, days) {
            (Some(_), Some(_)) => bail!("--end and --days cannot be combined"),
            (Some(end), None) => end,
            (None, Some(0)) => bail!("--days must be at least 1"),
            (None, Some(days)) => start
                .checked_add_days(Days::new(u64::from(days) - 1))
                .context("date range out of bounds")?,
            (None, None) => Local::now().date_naive(),
        };
        if start > end {
            bail!("start date {start} is after end date {end}");
        }

        let output = match output {
            Some(name) => {
                let mut path = PathBuf::from(name);
                if path.extension().is_none() {
                    path.set_extension("csv");
                }
                path
            }
            None => PathBuf::from(format!("{location}_{start}_{end}.csv")),
        };

        Ok(Self {
            location,
            country,
            start,
            end,
            output,
            on_conflict,
            webdriver_url,
            page_timeout,
            headless,
        })
    }
}

/// Runs the collector end to end: resolve conflicts, open a browser session,
/// scrape the range, and close the session on every exit path.
pub async fn run(config: &ScrapeConfig) -> Result<()> {
    prepare_output(&config.output, config.on_conflict)?;

    info!(url = %config.webdriver_url, "Connecting to WebDriver");
    let driver = WebDriverClient::connect(&config.webdriver_url, config.headless).await?;

    let result = scrape_range(&driver, config).await;

    if let Err(e) = driver.close().await {
        warn!(error = %e, "Failed to close WebDriver session");
    }
    result
}

/// Scrapes every date in the configured range through `driver`, appending
/// each day's rows to the output file as it goes.
pub async fn scrape_range<D: PageDriver>(driver: &D, config: &ScrapeConfig) -> Result<()> {
    let started = Instant::now();

    let station = resolve_station(driver, config).await?;
    info!(station = %station, location = %config.location, "Station resolved");

    let total_days = (config.end - config.start).num_days() + 1;
    let mut scraped = 0i64;
    let mut date = config.start;
    while date <= config.end {
        info!(%date, day = scraped + 1, total_days, "Scraping day");

        let url = format!(
            "{BASE_URL}/history/daily/{}/{}/{}/date/{}",
            config.country, config.location, station, date
        );
        let html = load_page(
            driver,
            &url,
            |source| !source.contains(page::NO_DATA_PLACEHOLDER),
            config.page_timeout,
        )
        .await?;

        let mut rows = day_observations(&html, date)?;
        if repair_dates(&mut rows) {
            info!(%date, rows = rows.len(), "Repaired day-boundary dates");
        }
        append_day(&config.output, &rows)?;

        scraped += 1;
        date = date.succ_opt().context("date range out of bounds")?;
    }

    info!(
        days = scraped,
        elapsed_secs = started.elapsed().as_secs(),
        output = %config.output.display(),
        "Scrape complete"
    );
    Ok(())
}

/// Navigates to the location's forecast page and reads the station code out
/// of its almanac block.
async fn resolve_station<D: PageDriver>(driver: &D, config: &ScrapeConfig) -> Result<String> {
    let url = format!("{BASE_URL}/weather/{}/{}", config.country, config.location);
    let html = load_page(
        driver,
        &url,
        |source| source.contains(page::STATION_READY),
        config.page_timeout,
    )
    .await?;
    station_name(&html)
}

/// Applies the conflict policy before any scraping starts. Existing files
/// are never clobbered unless explicitly asked for.
fn prepare_output(path: &Path, on_conflict: OnConflict) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    match on_conflict {
        OnConflict::Fail => bail!(
            "output file {} already exists (use --on-conflict append or overwrite)",
            path.display()
        ),
        OnConflict::Append => {
            info!(path = %path.display(), "Appending to existing output file");
            Ok(())
        }
        OnConflict::Overwrite => {
            info!(path = %path.display(), "Overwriting existing output file");
            // Removing it lets append_day recreate it with a fresh header.
            std::fs::remove_file(path)
                .with_context(|| format!("removing {}", path.display()))?;
            Ok(())
        }
    }
}

/// Appends one day's rows to the CSV file, writing the header only when the
/// file is first created.
pub fn append_day(path: &Path, rows: &[Observation]) -> Result<()> {
    let file_exists = path.exists();

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
