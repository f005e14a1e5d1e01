use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::dashboard::on_selection_change;
use crate::error::DashError;
use crate::filter::{filter_observations, FilterSelection};
use crate::prepare::{prepare, prepare_frame, MarketData};
use crate::schema::*;

/// The prepared marketplace table, for notebook use.
#[pyclass(name = "MarketDashboard")]
pub struct PyMarketDashboard {
    data: MarketData,
}

#[pymethods]
impl PyMarketDashboard {
    /// Load and enrich a marketplace CSV.
    #[new]
    fn new(path: &str) -> PyResult<Self> {
        Ok(Self {
            data: prepare(path)?,
        })
    }

    /// Enrich an all-string DataFrame that is already in memory.
    #[staticmethod]
    fn from_frame(raw: PyDataFrame) -> PyResult<Self> {
        Ok(Self {
            data: prepare_frame(raw.0)?,
        })
    }

    #[getter]
    fn enriched_df(&self) -> PyDataFrame {
        PyDataFrame(self.data.enriched().clone())
    }

    #[getter]
    fn locations(&self) -> Vec<String> {
        self.data.locations().to_vec()
    }

    #[getter]
    fn symbols(&self) -> Vec<String> {
        self.data.symbols().to_vec()
    }

    /// Rows matching the selection. `None` or `[]` falls back to the defaults.
    #[pyo3(signature = (locations=None, symbols=None))]
    fn filter(
        &self,
        locations: Option<Vec<String>>,
        symbols: Option<Vec<String>>,
    ) -> PyResult<PyDataFrame> {
        let selection = FilterSelection { locations, symbols };
        let df = filter_observations(self.data.enriched(), &selection)?;
        Ok(PyDataFrame(df))
    }

    /// Plotly figure JSON for the three charts, keyed by chart name.
    #[pyo3(signature = (locations=None, symbols=None))]
    fn figures_json(
        &self,
        locations: Option<Vec<String>>,
        symbols: Option<Vec<String>>,
    ) -> PyResult<String> {
        let selection = FilterSelection { locations, symbols };
        let update = on_selection_change(&self.data, &selection)?;
        let json = serde_json::to_string(&update.figures).map_err(DashError::from)?;
        Ok(json)
    }
}

/// Export column-name constants as a Python submodule.
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let columns = PyModule::new(m.py(), "columns")?;
    for name in enriched::COLUMNS {
        columns.add(name.to_uppercase().as_str(), name)?;
    }
    m.add_submodule(&columns)?;

    let defaults = PyModule::new(m.py(), "defaults")?;
    defaults.add("LOCATION", selection::DEFAULT_LOCATION)?;
    defaults.add("SYMBOL", selection::DEFAULT_SYMBOL)?;
    m.add_submodule(&defaults)?;

    Ok(())
}

#[pymodule]
fn market_dash(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMarketDashboard>()?;
    add_schema_exports(m)?;
    Ok(())
}
