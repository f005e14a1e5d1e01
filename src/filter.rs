/// Row filtering by the location and symbol filter-table selections.
use log::warn;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::DashError;
use crate::prepare::MarketData;
use crate::schema::{observation, selection};

/// Values picked in the location and symbol filter tables.
///
/// `None` means the table has not reported a selection yet. `None` and an
/// empty list both filter on the fallback value for that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub locations: Option<Vec<String>>,
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
}

impl FilterSelection {
    pub fn new(locations: Vec<String>, symbols: Vec<String>) -> Self {
        Self {
            locations: Some(locations),
            symbols: Some(symbols),
        }
    }

    /// Map selected filter-table rows to their values.
    ///
    /// Row indices point into `MarketData::locations` / `MarketData::symbols`.
    /// Indices past the end are skipped.
    pub fn from_rows(
        data: &MarketData,
        location_rows: Option<&[usize]>,
        symbol_rows: Option<&[usize]>,
    ) -> Self {
        Self {
            locations: location_rows
                .map(|rows| values_at(data.locations(), rows, observation::LOCATION)),
            symbols: symbol_rows.map(|rows| values_at(data.symbols(), rows, observation::SYMBOL)),
        }
    }

    /// Locations actually filtered on, after the fallback is applied.
    pub fn effective_locations(&self) -> Vec<String> {
        with_fallback(self.locations.as_deref(), selection::DEFAULT_LOCATION)
    }

    /// Symbols actually filtered on, after the fallback is applied.
    pub fn effective_symbols(&self) -> Vec<String> {
        with_fallback(self.symbols.as_deref(), selection::DEFAULT_SYMBOL)
    }
}

/// Keep rows whose location AND symbol are both selected.
///
/// Row order is preserved. A selection that matches nothing yields an empty
/// frame with the full enriched schema.
pub fn filter_observations(
    table: &DataFrame,
    selection: &FilterSelection,
) -> Result<DataFrame, DashError> {
    let locations = Series::new("locations".into(), selection.effective_locations());
    let symbols = Series::new("symbols".into(), selection.effective_symbols());

    let df = table
        .clone()
        .lazy()
        .filter(
            col(observation::LOCATION)
                .is_in(lit(locations), false)
                .and(col(observation::SYMBOL).is_in(lit(symbols), false)),
        )
        .collect()?;

    Ok(df)
}

fn with_fallback(values: Option<&[String]>, fallback: &str) -> Vec<String> {
    match values {
        Some(values) if !values.is_empty() => values.to_vec(),
        _ => vec![fallback.to_string()],
    }
}

fn values_at(values: &[String], rows: &[usize], column: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|&row| {
            let value = values.get(row);
            if value.is_none() {
                warn!(
                    "Ignoring {} filter row {} (only {} rows)",
                    column,
                    row,
                    values.len()
                );
            }
            value.cloned()
        })
        .collect()
}
