use std::{fs::File, io::Read, path::Path};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{core::series::Series, prelude::*};

/// Value column of an input CSV.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Column {
    Production,
    Consumption,
    Price,
}

impl Column {
    /// Accepted header names, in the order of preference.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Production => &[
                "production_kwh",
                "production_kw",
                "pv_kwh",
                "pv_kw",
                "generation_kwh",
                "generation_kw",
                "production",
                "value",
            ],
            Self::Consumption => &["consumption_kwh", "load_kwh", "consumption", "load", "value"],
            Self::Price => {
                &["price_eur_kwh", "price_eur_per_kwh", "price_eur_mwh", "price", "value"]
            }
        }
    }

    /// Convert a raw cell into kilowatt-hours or euro per kilowatt-hour.
    fn normalize(self, header: &str, value: f64) -> f64 {
        match self {
            // `_kw` columns are hourly averages, numerically equal to the energy:
            Self::Production | Self::Consumption => value.max(0.0),
            Self::Price if header.ends_with("_mwh") => value / 1000.0,
            Self::Price => value,
        }
    }
}

const TIMESTAMP_HEADERS: [&str; 2] = ["datetime", "timestamp"];

const NAIVE_FORMATS: [&str; 4] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.to_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|timestamp| timestamp.and_utc())
        .with_context(|| format!("unrecognized timestamp `{text}`"))
}

fn find_header(headers: &csv::StringRecord, candidates: &[&str]) -> Option<(usize, String)> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(candidate))
            .map(|index| (index, (*candidate).to_owned()))
    })
}

#[instrument(skip_all, fields(path = %path.display(), column = ?column))]
pub fn read_column(path: &Path, column: Column) -> Result<Series<DateTime<Utc>, f64>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    parse_column(file, column).with_context(|| format!("failed to read `{}`", path.display()))
}

/// Parse a single timestamped value column out of a CSV.
///
/// Rows with an empty value cell are skipped.
pub fn parse_column<R: Read>(reader: R, column: Column) -> Result<Series<DateTime<Utc>, f64>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("failed to read the CSV header")?.clone();
    let (timestamp_index, _) = find_header(&headers, &TIMESTAMP_HEADERS)
        .context("the CSV has neither a `datetime` nor a `timestamp` column")?;
    let (value_index, value_header) = find_header(&headers, column.aliases())
        .with_context(|| format!("no {column:?} column, expected one of {:?}", column.aliases()))?;
    debug!(%value_header, "resolved");

    let mut series = Vec::new();
    let mut n_skipped = 0_usize;
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read CSV record #{}", i + 1))?;
        let value = record.get(value_index).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            n_skipped += 1;
            continue;
        }
        let timestamp = parse_timestamp(record.get(timestamp_index).unwrap_or_default())
            .with_context(|| format!("invalid timestamp in CSV record #{}", i + 1))?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("invalid {value_header} `{value}` in CSV record #{}", i + 1))?;
        ensure!(value.is_finite(), "non-finite {value_header} in CSV record #{}", i + 1);
        series.push((timestamp, column.normalize(&value_header, value)));
    }
    if n_skipped != 0 {
        warn!(n_skipped, %value_header, "skipped empty values");
    }
    Ok(series)
}
