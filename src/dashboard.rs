/// Selection handling: one filter-table change in, the filtered rows and all
/// three redrawn figures out.
use log::debug;
use polars::prelude::DataFrame;

use crate::charts::FigureSet;
use crate::error::DashError;
use crate::filter::{filter_observations, FilterSelection};
use crate::prepare::MarketData;

/// Result of one selection change: the matching rows and the redrawn charts.
#[derive(Debug, Clone)]
pub struct SelectionUpdate {
    pub filtered: DataFrame,
    pub figures: FigureSet,
}

/// Handle a filter-table selection change.
///
/// Pure in its inputs; the enriched table is only read.
pub fn on_selection_change(
    data: &MarketData,
    selection: &FilterSelection,
) -> Result<SelectionUpdate, DashError> {
    let filtered = filter_observations(data.enriched(), selection)?;
    debug!(
        "Selection {:?} x {:?} matched {} of {} rows",
        selection.effective_locations(),
        selection.effective_symbols(),
        filtered.height(),
        data.len()
    );
    let figures = FigureSet::build(&filtered)?;
    Ok(SelectionUpdate { filtered, figures })
}
