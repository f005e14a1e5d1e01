/// Page shell for the dashboard.
///
/// Emits one self-contained HTML document. The filter tables and chart
/// refreshes are driven client-side by dashboard.js, which is inlined; chart
/// drawing is done by plotly.js.
use serde_json::json;

use crate::error::DashError;
use crate::prepare::MarketData;
use crate::schema::observation;

const DASHBOARD_JS: &str = include_str!("dashboard.js");
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Rows shown per filter-table page.
pub const FILTER_PAGE_SIZE: usize = 10;

/// Render the dashboard page with the filter values embedded.
pub fn render_index(data: &MarketData) -> Result<String, DashError> {
    let filters = json!({
        "locations": data.locations(),
        "symbols": data.symbols(),
    });
    let filters_json = script_safe(&serde_json::to_string(&filters)?);

    let html = format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>SpaceTrader Market Data Exploration</title>
  <script src="{plotly_cdn}"></script>
  <style>
    body {{ font-family: sans-serif; margin: 0; color: #212529; }}
    header {{ text-align: center; }}
    .row {{ display: flex; align-items: flex-start; }}
    .charts {{ flex: 8; margin-left: 4%; font-size: 1.5em; }}
    .filters {{ flex: 3; margin-left: 4%; margin-right: 2%; font-size: 1.5em; }}
    .chart {{ width: 100%; height: 480px; }}
    .filter-table {{ padding-top: 25px; padding-bottom: 25px; font-size: 0.7em; }}
    .filter-table table {{ border-collapse: collapse; width: 100%; }}
    .filter-table th, .filter-table td {{ border: 1px solid #dee2e6; padding: 2px 8px; }}
    .filter-table th {{ cursor: pointer; background: #f8f9fa; }}
    .filter-table input[type=text] {{ width: 100%; box-sizing: border-box; }}
    .pager {{ display: flex; gap: 8px; align-items: center; margin-top: 4px; }}
  </style>
</head>
<body>
  <header>
    <h1>SpaceTrader Market Data Exploration</h1>
    <hr>
  </header>
  <div class="row">
    <div class="charts">
      <div>
        <h3>Quantity Available vs Price Per Unit</h3>
        <div>The price of the goods seems to depend on the quantity at a location</div>
        <div id="q_vs_price_plot" class="chart"></div>
      </div>
      <div>
        <h3>Quantity Available vs Change in Quantity</h3>
        <div>Here are the changes in quantity (q_diff) between market data thats within 10 seconds. Did not apply any filter</div>
        <div id="q_vs_q_diff_fig" class="chart"></div>
      </div>
      <div>
        <h3>Change in Quantity Distribution</h3>
        <div>Here are the changes in quantity (q_diff) between market data thats within 10 seconds. Did not apply any filter</div>
        <div id="q_diff_dist_fig" class="chart"></div>
      </div>
    </div>
    <div class="filters">
      <h3>Location Filter</h3>
      <div>Select Locations to include data</div>
      <div id="location_filter" class="filter-table"></div>
      <h3>Symbol Filter</h3>
      <div>Select Symbols to include data</div>
      <div id="symbol_filter" class="filter-table"></div>
    </div>
  </div>
<script>
{dashboard_js}
MarketDash.create({{
  filters: {filters_json},
  pageSize: {page_size},
  locationColumn: "{location_col}",
  symbolColumn: "{symbol_col}",
  figuresUrl: "/api/figures",
  charts: {{
    quantity_vs_price: "q_vs_price_plot",
    quantity_vs_quantity_diff: "q_vs_q_diff_fig",
    quantity_diff_distribution: "q_diff_dist_fig"
  }}
}});
</script>
</body>
</html>
"##,
        plotly_cdn = PLOTLY_CDN,
        dashboard_js = DASHBOARD_JS,
        filters_json = filters_json,
        page_size = FILTER_PAGE_SIZE,
        location_col = observation::LOCATION,
        symbol_col = observation::SYMBOL,
    );

    Ok(html)
}

/// Keep embedded JSON from closing the surrounding script element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}
