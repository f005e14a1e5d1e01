/// Data preparation: loads the marketplace CSV once and derives the
/// time-differenced columns the dashboard charts are built from.
use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::info;
use polars::prelude::*;

use crate::error::DashError;
use crate::schema::*;

/// Naive layouts tried after RFC 3339. Naive values are read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// The enriched, read-only working set held for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct MarketData {
    enriched: DataFrame,
    locations: Vec<String>,
    symbols: Vec<String>,
}

impl MarketData {
    /// Enriched observations in source order, derived columns included.
    pub fn enriched(&self) -> &DataFrame {
        &self.enriched
    }

    /// Distinct locations in first-occurrence order.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Distinct goods symbols in first-occurrence order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.enriched.height()
    }

    pub fn is_empty(&self) -> bool {
        self.enriched.height() == 0
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Load the marketplace CSV and build the enriched table.
///
/// Required columns: location, symbol, quantityavailable, priceperunit, timestamp.
/// Any other columns are ignored. Every failure here is meant to stop startup.
pub fn prepare(path: impl AsRef<Path>) -> Result<MarketData, DashError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DashError::DataFileNotFound(path.display().to_string()));
    }

    let raw = read_csv_as_strings(path)?;
    info!(
        "Read {} rows x {} columns from {}",
        raw.height(),
        raw.width(),
        path.display()
    );

    let data = prepare_frame(raw)?;
    info!(
        "Prepared {} enriched rows ({} locations, {} symbols)",
        data.len(),
        data.locations.len(),
        data.symbols.len()
    );
    Ok(data)
}

/// Build the enriched table from an all-string frame.
///
/// - `timestamp` = parsed into `Datetime(Microseconds)`, UTC wall time
/// - `goods` = location + "-" + symbol
/// - `time` = timestamp as fractional unix seconds
/// - `time_diff` = consecutive `time` difference within each (location, symbol)
///   group, in the group's existing row order
/// - `q_diff` / `price_diff` = consecutive difference over the whole table,
///   ignoring groups
///
/// Rows where `goods` or any of the three diffs is undefined are dropped.
pub fn prepare_frame(raw: DataFrame) -> Result<MarketData, DashError> {
    require_columns(&raw, &observation::REQUIRED)?;
    let mut df = raw.select(observation::REQUIRED)?;

    let micros = parse_epoch_micros(&df)?;
    df.with_column(
        Column::new(observation::TIMESTAMP.into(), micros)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?,
    )?;

    // time_diff is per group; q_diff and price_diff span the whole table.
    let enriched = df
        .lazy()
        .with_columns([
            col(observation::QUANTITY_AVAILABLE)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Float64),
            col(observation::PRICE_PER_UNIT)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Float64),
            (col(observation::TIMESTAMP)
                .cast(DataType::Int64)
                .cast(DataType::Float64)
                / lit(1_000_000.0))
            .alias(derived::EPOCH_SECONDS),
        ])
        .with_columns([
            concat_str(
                [col(observation::LOCATION), col(observation::SYMBOL)],
                derived::GOODS_SEPARATOR,
                false,
            )
            .alias(derived::GOODS),
            (col(derived::EPOCH_SECONDS)
                - col(derived::EPOCH_SECONDS)
                    .shift(lit(1))
                    .over([col(observation::LOCATION), col(observation::SYMBOL)]))
            .alias(derived::TIME_DIFF),
            (col(observation::QUANTITY_AVAILABLE)
                - col(observation::QUANTITY_AVAILABLE).shift(lit(1)))
            .alias(derived::QUANTITY_DIFF),
            (col(observation::PRICE_PER_UNIT) - col(observation::PRICE_PER_UNIT).shift(lit(1)))
                .alias(derived::PRICE_DIFF),
        ])
        .filter(
            col(derived::GOODS)
                .is_not_null()
                .and(col(derived::TIME_DIFF).is_not_null())
                .and(col(derived::QUANTITY_DIFF).is_not_null())
                .and(col(derived::PRICE_DIFF).is_not_null()),
        )
        .select(
            enriched::COLUMNS
                .iter()
                .map(|c| col(*c))
                .collect::<Vec<_>>(),
        )
        .collect()?;

    let locations = distinct_in_order(&enriched, observation::LOCATION)?;
    let symbols = distinct_in_order(&enriched, observation::SYMBOL)?;

    Ok(MarketData {
        enriched,
        locations,
        symbols,
    })
}

// ── Timestamps ──────────────────────────────────────────────────────────────

/// Parse a marketplace timestamp into naive UTC.
///
/// Accepts RFC 3339 with any offset, `YYYY-MM-DD[ T]HH:MM:SS[.fff]` and a bare
/// `YYYY-MM-DD` date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_epoch_micros(df: &DataFrame) -> Result<Vec<i64>, DashError> {
    let timestamps = df.column(observation::TIMESTAMP)?.str()?;
    timestamps
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.unwrap_or("");
            parse_timestamp(value)
                .map(|dt| dt.and_utc().timestamp_micros())
                .ok_or_else(|| DashError::InvalidTimestamp {
                    row,
                    value: value.to_string(),
                })
        })
        .collect()
}

// ── Private helpers ─────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame, DashError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), DashError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(DashError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

fn distinct_in_order(df: &DataFrame, column: &str) -> Result<Vec<String>, DashError> {
    let values = df.column(column)?.str()?;
    let mut seen = HashSet::new();
    Ok(values
        .into_iter()
        .flatten()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect())
}
