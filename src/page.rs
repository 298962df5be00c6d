//! HTML extraction for wunderground.com pages.
//!
//! Works on the fully rendered markup handed over by the browser driver:
//! the station label on a location's forecast page, and the hourly
//! observation table on a daily-history page.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveTime};
use scraper::{ElementRef, Html, Selector};

use crate::record::{Observation, fahrenheit_to_celsius, inch_to_mm, mph_to_kph};

/// Present on the location page once the almanac block has rendered.
pub const STATION_READY: &str = "city-almanac";
/// Present on a daily-history page until the observation table has rendered.
pub const NO_DATA_PLACEHOLDER: &str = "No Data Recorded";

fn sel(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e}"))
}

/// Pulls the station code out of the location page's almanac header.
///
/// The header element carries the station label as its first direct text
/// node, before any nested markup.
pub fn station_name(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    let header = doc
        .select(&sel(".city-almanac .module-header")?)
        .next()
        .context("city almanac header not found on location page")?;

    let label = header
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .context("station label not found in almanac header")?;
    Ok(label.to_string())
}

/// Extracts the hourly observation rows from a rendered daily-history page,
/// labeling every row with `date` (repaired later if the page crosses a day
/// boundary) and normalizing units to metric.
pub fn day_observations(html: &str, date: NaiveDate) -> Result<Vec<Observation>> {
    let doc = Html::parse_document(html);
    let row_sel = sel("tr.mat-row.cdk-row.ng-star-inserted")?;
    let cell_sel = sel("td[role=\"gridcell\"]")?;
    let value_sel = sel("span.wu-value.wu-value-to")?;
    let text_sel = sel("span.ng-star-inserted")?;

    let mut rows = Vec::new();
    for tr in doc.select(&row_sel) {
        let cells: Vec<ElementRef> = tr.select(&cell_sel).collect();
        if cells.len() < 10 {
            bail!(
                "observation row has {} cells, expected at least 10",
                cells.len()
            );
        }

        rows.push(Observation {
            date,
            time: parse_clock(&text_of(cells[0], &text_sel)?)?,
            temperature: fahrenheit_to_celsius(value_of(cells[1], &value_sel, "temperature")?),
            dew_point: fahrenheit_to_celsius(value_of(cells[2], &value_sel, "dew_point")?),
            humidity: int_of(cells[3], &value_sel, "humidity")?,
            wind: text_of(cells[4], &text_sel)?,
            wind_speed: mph_to_kph(value_of(cells[5], &value_sel, "wind_speed")?),
            wind_gust: mph_to_kph(value_of(cells[6], &value_sel, "wind_gust")?),
            pressure: value_of(cells[7], &value_sel, "pressure")?,
            precipitation: inch_to_mm(value_of(cells[8], &value_sel, "precipitation")?),
            condition: text_of(cells[9], &text_sel)?,
        });
    }
    Ok(rows)
}

/// 12-hour clock label as shown in the table, e.g. "12:20 AM".
fn parse_clock(label: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(label, "%I:%M %p")
        .with_context(|| format!("bad clock label {label:?}"))
}

fn text_of(cell: ElementRef, text_sel: &Selector) -> Result<String> {
    let span = cell
        .select(text_sel)
        .next()
        .context("missing text span in table cell")?;
    Ok(span.text().collect::<String>().trim().to_string())
}

fn raw_value(cell: ElementRef, value_sel: &Selector, column: &str) -> Result<String> {
    let span = cell
        .select(value_sel)
        .next()
        .with_context(|| format!("missing value span in {column} cell"))?;
    Ok(span.text().collect::<String>().trim().to_string())
}

fn value_of(cell: ElementRef, value_sel: &Selector, column: &str) -> Result<f64> {
    let raw = raw_value(cell, value_sel, column)?;
    raw.parse()
        .with_context(|| format!("{column} value {raw:?} is not a number"))
}

fn int_of(cell: ElementRef, value_sel: &Selector, column: &str) -> Result<u32> {
    let raw = raw_value(cell, value_sel, column)?;
    raw.parse()
        .with_context(|| format!("{column} value {raw:?} is not an integer"))
}
