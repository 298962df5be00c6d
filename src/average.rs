//! Aggregator pipeline: read a raw observation CSV, bucket the rows by
//! calendar hour, write one averaged row per non-empty bucket.
//!
//! Buckets are keyed by the full date plus hour, built in a single pass
//! over the input. Keeping the year in the key means multi-year input
//! produces separate rows per year rather than quietly merging the same
//! calendar hour across years; the `MM-DD` output label is unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Timelike};
use tracing::info;

use crate::record::{HourlyAverage, Observation, round3};

/// Derives the output path from the input: same directory, stem suffixed
/// with `_avg_hour`, `.csv` extension.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{stem}_avg_hour.csv"))
}

/// Reads `input`, averages it per calendar hour, and writes the result next
/// to it. Returns the output path.
pub fn run(input: &Path) -> Result<PathBuf> {
    info!(input = %input.display(), "Reading observations");
    let rows = read_observations(input)?;

    info!(rows = rows.len(), "Averaging by calendar hour");
    let averages = hourly_averages(&rows);

    let output = output_path(input);
    write_averages(&output, &averages)?;
    info!(rows = averages.len(), output = %output.display(), "Averages written");
    Ok(output)
}

pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result.with_context(|| format!("reading {}", path.display()))?);
    }
    Ok(rows)
}

/// Averages the rows into one [`HourlyAverage`] per non-empty hour bucket,
/// in chronological bucket order. Minutes are ignored by the bucketing, so
/// minute-level jitter within an hour is tolerated.
pub fn hourly_averages(rows: &[Observation]) -> Vec<HourlyAverage> {
    let mut buckets: BTreeMap<(NaiveDate, u32), Vec<&Observation>> = BTreeMap::new();
    for row in rows {
        buckets
            .entry((row.date, row.time.hour()))
            .or_default()
            .push(row);
    }

    buckets
        .into_iter()
        .map(|((date, hour), bucket)| average_bucket(date, hour, &bucket))
        .collect()
}

fn average_bucket(date: NaiveDate, hour: u32, bucket: &[&Observation]) -> HourlyAverage {
    let count = bucket.len() as f64;
    let mean = |column: fn(&Observation) -> f64| {
        round3(bucket.iter().map(|row| column(row)).sum::<f64>() / count)
    };

    HourlyAverage {
        date: date.format("%m-%d").to_string(),
        time: format!("{hour:02}:00"),
        temperature: mean(|r| r.temperature),
        dew_point: mean(|r| r.dew_point),
        humidity: mean(|r| f64::from(r.humidity)),
        wind_speed: mean(|r| r.wind_speed),
        wind_gust: mean(|r| r.wind_gust),
        pressure: mean(|r| r.pressure),
        precipitation: mean(|r| r.precipitation),
    }
}

fn write_averages(path: &Path, rows: &[HourlyAverage]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(date: &str, time: &str, temperature: f64) -> Observation {
        Observation {
            date: date.parse().unwrap(),
            time: time.parse().unwrap(),
            temperature,
            dew_point: temperature - 2.0,
            humidity: 60,
            wind: "N".to_string(),
            wind_speed: 10.0,
            wind_gust: 15.0,
            pressure: 29.92,
            precipitation: 0.0,
            condition: "Fair".to_string(),
        }
    }

    #[test]
    fn test_two_rows_in_one_hour_average() {
        let rows = vec![
            observation("2023-01-01", "23:50:00", 10.0),
            observation("2023-01-01", "23:55:00", 12.0),
        ];

        let averages = hourly_averages(&rows);
        assert_eq!(averages.len(), 1);

        let avg = &averages[0];
        assert_eq!(avg.date, "01-01");
        assert_eq!(avg.time, "23:00");
        assert_eq!(avg.temperature, 11.0);
        assert_eq!(avg.dew_point, 9.0);
        assert_eq!(avg.humidity, 60.0);
        assert_eq!(avg.pressure, 29.92);
    }

    #[test]
    fn test_mean_rounds_to_three_decimals() {
        let rows = vec![
            observation("2023-01-01", "10:00:00", 10.0),
            observation("2023-01-01", "10:20:00", 11.0),
            observation("2023-01-01", "10:40:00", 12.5),
        ];
        let averages = hourly_averages(&rows);
        // (10 + 11 + 12.5) / 3 = 11.1666...
        assert_eq!(averages[0].temperature, 11.167);
    }

    #[test]
    fn test_empty_hours_emit_no_rows() {
        let rows = vec![
            observation("2023-01-01", "00:10:00", 1.0),
            observation("2023-01-01", "05:10:00", 2.0),
        ];
        let averages = hourly_averages(&rows);
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].time, "00:00");
        assert_eq!(averages[1].time, "05:00");
    }

    #[test]
    fn test_single_row_per_hour_full_day() {
        let rows: Vec<Observation> = (0..24)
            .map(|h| observation("2023-06-15", &format!("{h:02}:30:00"), h as f64))
            .collect();

        let averages = hourly_averages(&rows);
        assert_eq!(averages.len(), 24);
        for (h, avg) in averages.iter().enumerate() {
            assert_eq!(avg.date, "06-15");
            assert_eq!(avg.time, format!("{h:02}:00"));
            // Mean of a single value is that value.
            assert_eq!(avg.temperature, h as f64);
        }
    }

    #[test]
    fn test_cross_year_hours_stay_separate() {
        let rows = vec![
            observation("2022-03-01", "12:10:00", 0.0),
            observation("2023-03-01", "12:10:00", 10.0),
        ];

        let averages = hourly_averages(&rows);
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].date, "03-01");
        assert_eq!(averages[1].date, "03-01");
        assert_eq!(averages[0].temperature, 0.0);
        assert_eq!(averages[1].temperature, 10.0);
    }

    #[test]
    fn test_buckets_sorted_chronologically() {
        let rows = vec![
            observation("2023-01-02", "03:10:00", 3.0),
            observation("2023-01-01", "22:10:00", 1.0),
            observation("2023-01-02", "01:10:00", 2.0),
        ];
        let averages = hourly_averages(&rows);
        let temps: Vec<f64> = averages.iter().map(|a| a.temperature).collect();
        assert_eq!(temps, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_output_path_derivation() {
        assert_eq!(
            output_path(Path::new("brussels_2023.csv")),
            PathBuf::from("brussels_2023_avg_hour.csv")
        );
        assert_eq!(
            output_path(Path::new("data/brussels.csv")),
            PathBuf::from("data/brussels_avg_hour.csv")
        );
        assert_eq!(
            output_path(Path::new("brussels")),
            PathBuf::from("brussels_avg_hour.csv")
        );
    }

    #[test]
    fn test_run_reads_and_writes_files() {
        let dir = std::env::temp_dir();
        let input = dir.join("wu_scrape_test_avg_input.csv");
        let expected_output = dir.join("wu_scrape_test_avg_input_avg_hour.csv");
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&expected_output);

        let rows = vec![
            observation("2023-01-01", "23:50:00", 10.0),
            observation("2023-01-01", "23:55:00", 12.0),
        ];
        let mut writer = csv::Writer::from_path(&input).unwrap();
        for row in &rows {
            writer.serialize(row).unwrap();
        }
        writer.flush().unwrap();
        drop(writer);

        let output = run(&input).unwrap();
        assert_eq!(output, expected_output);

        let content = std::fs::read_to_string(&output).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,time,temperature,dew_point,humidity,wind_speed,wind_gust,pressure,precipitation"
        );
        assert_eq!(lines.next().unwrap(), "01-01,23:00,11.0,9.0,60.0,10.0,15.0,29.92,0.0");

        std::fs::remove_file(&input).unwrap();
        std::fs::remove_file(&output).unwrap();
    }
}
