/// Chart construction: turns a filtered observation frame into Plotly figure
/// specs.
///
/// Every builder is a pure function of the frame. Traces are split by the
/// `goods` column in first-occurrence order and colored from a fixed palette,
/// so a goods key keeps its color across the three charts.
use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::DashError;
use crate::schema::*;

const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

const EMPTY_MESSAGE: &str = "No data for the current selection";

/// A Plotly figure: `Plotly.react(div, figure.data, figure.layout)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Figure {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The three dashboard charts for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureSet {
    pub quantity_vs_price: Figure,
    pub quantity_vs_quantity_diff: Figure,
    pub quantity_diff_distribution: Figure,
}

impl FigureSet {
    pub fn build(df: &DataFrame) -> Result<Self, DashError> {
        Ok(Self {
            quantity_vs_price: quantity_vs_price(df)?,
            quantity_vs_quantity_diff: quantity_vs_quantity_diff(df)?,
            quantity_diff_distribution: quantity_diff_distribution(df)?,
        })
    }
}

// ── Trendline ───────────────────────────────────────────────────────────────

/// Ordinary least squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// `None` when every y is identical.
    pub r_squared: Option<f64>,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through the points. Needs two points and some spread in x.
pub fn fit_ols(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 {
        None
    } else {
        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| {
                let r = yi - (slope * xi + intercept);
                r * r
            })
            .sum();
        Some(1.0 - ss_res / syy)
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

// ── Data extraction ─────────────────────────────────────────────────────────

struct GoodsPoints {
    goods: String,
    x: Vec<f64>,
    y: Vec<f64>,
    timestamps: Vec<String>,
}

/// Split (x, y) pairs by goods. Rows with a null in either column are skipped.
fn points_by_goods(df: &DataFrame, x_col: &str, y_col: &str) -> Result<Vec<GoodsPoints>, DashError> {
    let goods = df.column(derived::GOODS)?.str()?;
    let xs = df.column(x_col)?.f64()?;
    let ys = df.column(y_col)?.f64()?;
    // Hover text only; the enriched table stores a Datetime column.
    let timestamps = df.column(observation::TIMESTAMP)?.cast(&DataType::String)?;
    let timestamps = timestamps.str()?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GoodsPoints> = Vec::new();
    for i in 0..df.height() {
        let (Some(g), Some(x), Some(y)) = (goods.get(i), xs.get(i), ys.get(i)) else {
            continue;
        };
        let slot = *index.entry(g.to_string()).or_insert_with(|| {
            groups.push(GoodsPoints {
                goods: g.to_string(),
                x: Vec::new(),
                y: Vec::new(),
                timestamps: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.x.push(x);
        group.y.push(y);
        group
            .timestamps
            .push(timestamps.get(i).unwrap_or("").to_string());
    }
    Ok(groups)
}

fn color(slot: usize) -> &'static str {
    PALETTE[slot % PALETTE.len()]
}

// ── Layout ──────────────────────────────────────────────────────────────────

fn base_layout(x_title: &str, y_title: &str) -> Value {
    json!({
        "xaxis": { "title": { "text": x_title } },
        "yaxis": { "title": { "text": y_title } },
        "legend": {
            "title": { "text": derived::GOODS },
            "orientation": "h",
            "yanchor": "bottom",
            "y": 1.02,
            "xanchor": "left",
            "x": 0
        },
        "margin": { "t": 60 }
    })
}

fn empty_figure(x_title: &str, y_title: &str) -> Figure {
    let mut layout = base_layout(x_title, y_title);
    layout["annotations"] = json!([{
        "text": EMPTY_MESSAGE,
        "xref": "paper",
        "yref": "paper",
        "x": 0.5,
        "y": 0.5,
        "showarrow": false
    }]);
    Figure {
        data: Vec::new(),
        layout,
    }
}

// ── Scatter charts ──────────────────────────────────────────────────────────

fn scatter_with_trendlines(df: &DataFrame, x_col: &str, y_col: &str) -> Result<Figure, DashError> {
    let groups = points_by_goods(df, x_col, y_col)?;
    if groups.is_empty() {
        return Ok(empty_figure(x_col, y_col));
    }

    let mut data = Vec::with_capacity(groups.len() * 2);
    for (slot, group) in groups.iter().enumerate() {
        data.push(json!({
            "type": "scatter",
            "mode": "markers",
            "name": group.goods,
            "legendgroup": group.goods,
            "x": group.x,
            "y": group.y,
            "customdata": group.timestamps,
            "marker": { "color": color(slot) },
            "hovertemplate": format!(
                "goods={}<br>{}=%{{x}}<br>{}=%{{y}}<br>timestamp=%{{customdata}}<extra></extra>",
                group.goods, x_col, y_col
            ),
        }));

        if let Some(trend) = trendline_trace(group, slot, x_col, y_col) {
            data.push(trend);
        }
    }

    Ok(Figure {
        data,
        layout: base_layout(x_col, y_col),
    })
}

fn trendline_trace(group: &GoodsPoints, slot: usize, x_col: &str, y_col: &str) -> Option<Value> {
    let fit = fit_ols(&group.x, &group.y)?;

    let mut xs = group.x.clone();
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    let ys: Vec<f64> = xs.iter().map(|&x| fit.predict(x)).collect();

    let r_squared = fit
        .r_squared
        .map(|r| format!("{r:.6}"))
        .unwrap_or_else(|| "n/a".to_string());

    Some(json!({
        "type": "scatter",
        "mode": "lines",
        "name": group.goods,
        "legendgroup": group.goods,
        "showlegend": false,
        "x": xs,
        "y": ys,
        "line": { "color": color(slot) },
        "hovertemplate": format!(
            "<b>OLS trendline</b><br>{y_col} = {:.6} * {x_col} + {:.6}<br>R<sup>2</sup>={r_squared}<br><br>goods={}<br>{x_col}=%{{x}}<br>{y_col}=%{{y}} <b>(trend)</b><extra></extra>",
            fit.slope, fit.intercept, group.goods
        ),
    }))
}

/// Quantity available vs price per unit, one series and trendline per goods.
pub fn quantity_vs_price(df: &DataFrame) -> Result<Figure, DashError> {
    scatter_with_trendlines(df, observation::QUANTITY_AVAILABLE, observation::PRICE_PER_UNIT)
}

/// Quantity available vs change in quantity, one series and trendline per goods.
pub fn quantity_vs_quantity_diff(df: &DataFrame) -> Result<Figure, DashError> {
    scatter_with_trendlines(df, observation::QUANTITY_AVAILABLE, derived::QUANTITY_DIFF)
}

// ── Distribution chart ──────────────────────────────────────────────────────

/// Distribution of quantity changes: a horizontal histogram per goods with a
/// box-plot marginal on the right sharing the y axis.
pub fn quantity_diff_distribution(df: &DataFrame) -> Result<Figure, DashError> {
    let groups = points_by_goods(df, derived::QUANTITY_DIFF, derived::QUANTITY_DIFF)?;
    if groups.is_empty() {
        return Ok(empty_figure("count", derived::QUANTITY_DIFF));
    }

    let mut data = Vec::with_capacity(groups.len() * 2);
    for (slot, group) in groups.iter().enumerate() {
        data.push(json!({
            "type": "histogram",
            "orientation": "h",
            "name": group.goods,
            "legendgroup": group.goods,
            "y": group.y,
            "xaxis": "x",
            "yaxis": "y",
            "marker": { "color": color(slot) },
            "hovertemplate": format!(
                "goods={}<br>{}=%{{y}}<br>count=%{{x}}<extra></extra>",
                group.goods,
                derived::QUANTITY_DIFF
            ),
        }));
        data.push(json!({
            "type": "box",
            "name": group.goods,
            "legendgroup": group.goods,
            "showlegend": false,
            "y": group.y,
            "xaxis": "x2",
            "yaxis": "y",
            "marker": { "color": color(slot) },
            "hovertemplate": format!(
                "goods={}<br>{}=%{{y}}<extra></extra>",
                group.goods,
                derived::QUANTITY_DIFF
            ),
        }));
    }

    let mut layout = base_layout("count", derived::QUANTITY_DIFF);
    layout["barmode"] = json!("relative");
    layout["xaxis"]["domain"] = json!([0.0, 0.8]);
    layout["xaxis2"] = json!({
        "domain": [0.82, 1.0],
        "showticklabels": false,
        "showgrid": false
    });

    Ok(Figure { data, layout })
}
