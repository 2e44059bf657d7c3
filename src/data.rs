use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::ForecastError;

const DATE_COLUMNS: [&str; 2] = ["datum", "ds"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One cell of the wide dataset in long form.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub series_id: String,
    pub value: Option<f64>,
}

/// Wide-format weekly sales table: one date column plus one column per series.
#[derive(Debug, Clone, Default)]
pub struct SalesFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl SalesFrame {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ForecastError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ForecastError> {
        Self::from_reader(bytes)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ForecastError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| ForecastError::Validation(format!("Unreadable CSV header: {e}")))?
            .clone();

        let date_idx = DATE_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h == *name))
            .ok_or_else(|| {
                ForecastError::Validation("CSV must contain a 'datum' column with dates".into())
            })?;

        let mut columns: Vec<(usize, String, Vec<Option<f64>>)> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != date_idx && !h.is_empty())
            .map(|(i, h)| (i, h.to_string(), Vec::new()))
            .collect();
        let mut dates = Vec::new();

        for (row, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| ForecastError::Validation(format!("Malformed CSV row {}: {e}", row + 1)))?;
            let raw = record.get(date_idx).unwrap_or("");
            let date = parse_date(raw).ok_or_else(|| {
                ForecastError::Validation(format!(
                    "Invalid date format in 'datum' column: '{raw}' (row {})",
                    row + 1
                ))
            })?;
            dates.push(date);

            for (idx, _, values) in columns.iter_mut() {
                values.push(record.get(*idx).and_then(parse_value));
            }
        }

        Ok(Self {
            dates,
            columns: columns.into_iter().map(|(_, name, values)| (name, values)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn series_ids(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn has_series(&self, id: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == id)
    }

    /// Earliest and latest date in the table.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.dates.iter().min()?;
        let max = self.dates.iter().max()?;
        Some((*min, *max))
    }

    /// Melts the table into one observation per (date, series) cell.
    pub fn observations(&self) -> Vec<Observation> {
        let mut out = Vec::with_capacity(self.dates.len() * self.columns.len());
        for (name, values) in &self.columns {
            for (date, value) in self.dates.iter().zip(values) {
                out.push(Observation {
                    date: *date,
                    series_id: name.clone(),
                    value: *value,
                });
            }
        }
        out
    }

    /// Builds a frame from already-typed columns.
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<Option<f64>>)>) -> Self {
        Self { dates, columns }
    }

    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["datum".to_string()];
        header.extend(self.series_ids());
        wtr.write_record(&header)?;

        for (row, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            for (_, values) in &self.columns {
                record.push(values.get(row).copied().flatten().map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Cleaned (date, value) pairs of one series, sorted by date, missing values dropped.
pub fn series_points(observations: &[Observation], series_id: &str) -> Vec<(NaiveDate, f64)> {
    let mut points: Vec<(NaiveDate, f64)> = observations
        .iter()
        .filter(|o| o.series_id == series_id)
        .filter_map(|o| o.value.map(|v| (o.date, v)))
        .collect();
    points.sort_by_key(|(d, _)| *d);
    points
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_value(raw: &str) -> Option<f64> {
    match raw.trim() {
        "" | "NaN" | "nan" | "NA" | "null" => None,
        s => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}
