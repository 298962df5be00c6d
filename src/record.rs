//! Record types shared by the scrape and average pipelines, plus the unit
//! conversions applied while scraping.
//!
//! The CSV formats are fixed: raw observations carry 11 columns with
//! `YYYY-MM-DD` dates and `H:MM:SS` times (hour not zero-padded), averaged
//! rows carry 9 columns with `MM-DD` dates and `HH:MM` times.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One scraped measurement, in the column order of the raw CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub time: NaiveTime,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Degrees Celsius.
    pub dew_point: f64,
    /// Relative humidity, percent.
    pub humidity: u32,
    /// Direction label as shown on the page, e.g. "WSW".
    pub wind: String,
    /// Kilometers per hour.
    pub wind_speed: f64,
    /// Kilometers per hour.
    pub wind_gust: f64,
    /// Inches of mercury, passed through as scraped.
    pub pressure: f64,
    /// Millimeters.
    pub precipitation: f64,
    /// Free-text condition label, e.g. "Partly Cloudy".
    pub condition: String,
}

/// One averaged row, labeled with its hour bucket's month-day and hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyAverage {
    /// `MM-DD`.
    pub date: String,
    /// `HH:00`.
    pub time: String,
    pub temperature: f64,
    pub dew_point: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub pressure: f64,
    pub precipitation: f64,
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    round2((fahrenheit - 32.0) * 5.0 / 9.0)
}

pub fn mph_to_kph(miles: f64) -> f64 {
    round2(miles * 1.609344)
}

pub fn inch_to_mm(inch: f64) -> f64 {
    round2(inch * 25.4)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

mod date_format {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

mod time_format {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        // Legacy files carry the hour without a leading zero ("0:20:00").
        serializer.collect_str(&time.format("%-H:%M:%S"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        // %H accepts one or two digits, so both "0:20:00" and "00:20:00" parse.
        NaiveTime::parse_from_str(&s, "%H:%M:%S").map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn observation(date: &str, time: &str, temperature: f64) -> Observation {
        Observation {
            date: date.parse().unwrap(),
            time: time.parse().unwrap(),
            temperature,
            dew_point: temperature - 2.0,
            humidity: 60,
            wind: "WSW".to_string(),
            wind_speed: 10.0,
            wind_gust: 15.0,
            pressure: 29.92,
            precipitation: 0.0,
            condition: "Fair".to_string(),
        }
    }

    #[test]
    fn test_fahrenheit_to_celsius() {
        assert_eq!(fahrenheit_to_celsius(32.0), 0.0);
        assert_eq!(fahrenheit_to_celsius(212.0), 100.0);
        assert_eq!(fahrenheit_to_celsius(50.5), 10.28);
    }

    #[test]
    fn test_mph_to_kph() {
        assert_eq!(mph_to_kph(1.0), 1.61);
        assert_eq!(mph_to_kph(10.0), 16.09);
    }

    #[test]
    fn test_inch_to_mm() {
        assert_eq!(inch_to_mm(1.0), 25.4);
        assert_eq!(inch_to_mm(0.01), 0.25);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(11.0 / 3.0), 3.667);
        assert_eq!(round3(2.0), 2.0);
    }

    #[test]
    fn test_raw_csv_round_trip() {
        let row = observation("2023-01-01", "00:20:00", 5.5);

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&row).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,time,temperature,dew_point,humidity,wind,wind_speed,wind_gust,pressure,precipitation,condition"
        );
        // Hour is written without a leading zero, as in the legacy files.
        assert!(lines.next().unwrap().starts_with("2023-01-01,0:20:00,"));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let back: Observation = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_average_csv_header() {
        let row = HourlyAverage {
            date: "01-01".to_string(),
            time: "23:00".to_string(),
            temperature: 11.0,
            dew_point: 9.0,
            humidity: 60.0,
            wind_speed: 10.0,
            wind_gust: 15.0,
            pressure: 29.92,
            precipitation: 0.0,
        };

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&row).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(
            text.lines().next().unwrap(),
            "date,time,temperature,dew_point,humidity,wind_speed,wind_gust,pressure,precipitation"
        );
    }
}
