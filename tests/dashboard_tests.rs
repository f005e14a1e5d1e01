use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::{body::Body, Method, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use market_dash::{
    handle_request, on_selection_change, prepare, run, AppState, FilterSelection, MarketData,
};

const MARKET_CSV: &str = "\
location,symbol,quantityavailable,priceperunit,timestamp
OE-PM-TR,FUEL,100,2,2021-05-02T19:00:00.000Z
OE-PM-TR,METALS,50,10,2021-05-02T19:00:01.000Z
OE-PM,FUEL,80,3,2021-05-02T19:00:02.000Z
OE-PM-TR,FUEL,90,3,2021-05-02T19:00:10.000Z
OE-PM-TR,METALS,55,9,2021-05-02T19:00:11.000Z
OE-PM,FUEL,70,4,2021-05-02T19:00:12.000Z
OE-PM-TR,FUEL,95,2,2021-05-02T19:00:20.000Z
OE-PM,FUEL,60,5,2021-05-02T19:00:22.000Z
";

fn write_market(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("spacebot_public_marketplace.csv");
    fs::write(&path, MARKET_CSV).unwrap();
    path
}

fn market() -> MarketData {
    let dir = TempDir::new().unwrap();
    prepare(write_market(&dir)).unwrap()
}

fn state() -> Arc<AppState> {
    Arc::new(AppState::new(market()).unwrap())
}

async fn send(state: Arc<AppState>, method: Method, path: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = handle_request(req, state).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, bytes.to_vec())
}

#[test]
fn test_prepare_then_filter_then_figures() {
    let data = market();
    // First row of each of the 3 groups is dropped.
    assert_eq!(data.len(), 5);
    assert_eq!(data.locations(), &["OE-PM-TR".to_string(), "OE-PM".to_string()]);
    assert_eq!(data.symbols(), &["FUEL".to_string(), "METALS".to_string()]);

    let update = on_selection_change(&data, &FilterSelection::default()).unwrap();
    assert_eq!(update.filtered.height(), 2);
    let scatter = &update.figures.quantity_vs_price;
    assert_eq!(scatter.data[0]["name"], "OE-PM-TR-FUEL");
    assert_eq!(scatter.data[0]["x"], serde_json::json!([90.0, 95.0]));
}

#[test]
fn test_selection_by_rows_matches_selection_by_values() {
    let data = market();
    let by_rows = FilterSelection::from_rows(&data, Some(&[0, 1][..]), Some(&[0][..]));
    let by_values = FilterSelection::new(
        vec!["OE-PM-TR".to_string(), "OE-PM".to_string()],
        vec!["FUEL".to_string()],
    );
    assert_eq!(by_rows, by_values);

    let update = on_selection_change(&data, &by_rows).unwrap();
    assert_eq!(update.filtered.height(), 4);
    // Two goods keys, each with a marker trace and a trendline.
    assert_eq!(update.figures.quantity_vs_quantity_diff.data.len(), 4);
}

#[test]
fn test_empty_selection_result_renders_placeholders() {
    let data = market();
    let selection = FilterSelection::new(vec!["OE-PM".to_string()], vec!["METALS".to_string()]);
    let update = on_selection_change(&data, &selection).unwrap();
    assert_eq!(update.filtered.height(), 0);
    assert!(update.figures.quantity_vs_price.is_empty());
    assert!(update.figures.quantity_vs_quantity_diff.is_empty());
    assert!(update.figures.quantity_diff_distribution.is_empty());
}

#[tokio::test]
async fn test_index_page() {
    let (status, body) = send(state(), Method::GET, "/", "").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("SpaceTrader Market Data Exploration"));
    assert!(html.contains("Location Filter"));
    assert!(html.contains("Symbol Filter"));
}

#[tokio::test]
async fn test_filters_endpoint() {
    let (status, body) = send(state(), Method::GET, "/api/filters", "").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["locations"], serde_json::json!(["OE-PM-TR", "OE-PM"]));
    assert_eq!(value["symbols"], serde_json::json!(["FUEL", "METALS"]));
}

#[tokio::test]
async fn test_figures_endpoint_uses_fallbacks_for_empty_body() {
    let (status, body) = send(state(), Method::POST, "/api/figures", "").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["row_count"], 2);
    assert_eq!(value["locations"], serde_json::json!(["OE-PM-TR"]));
    assert_eq!(value["symbols"], serde_json::json!(["FUEL"]));
    for chart in [
        "quantity_vs_price",
        "quantity_vs_quantity_diff",
        "quantity_diff_distribution",
    ] {
        assert!(value["figures"][chart]["data"].is_array(), "{chart}");
    }
}

#[tokio::test]
async fn test_figures_endpoint_with_selection() {
    let (status, body) = send(
        state(),
        Method::POST,
        "/api/figures",
        r#"{"locations": ["OE-PM"], "symbols": ["FUEL", "METALS"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["row_count"], 2);
    assert_eq!(value["symbols"], serde_json::json!(["FUEL", "METALS"]));
}

#[tokio::test]
async fn test_figures_endpoint_with_row_selection() {
    // Rows index the lists from /api/filters: OE-PM and METALS.
    let (status, body) = send(
        state(),
        Method::POST,
        "/api/figures",
        r#"{"location_rows": [1], "symbol_rows": [0, 1, 7]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["row_count"], 2);
    assert_eq!(value["locations"], serde_json::json!(["OE-PM"]));
    assert_eq!(value["symbols"], serde_json::json!(["FUEL", "METALS"]));
}

#[tokio::test]
async fn test_figures_endpoint_rows_take_precedence_over_values() {
    let (status, body) = send(
        state(),
        Method::POST,
        "/api/figures",
        r#"{"locations": ["OE-PM"], "location_rows": [0], "symbols": ["METALS"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["locations"], serde_json::json!(["OE-PM-TR"]));
    assert_eq!(value["symbols"], serde_json::json!(["METALS"]));
    assert_eq!(value["row_count"], 1);
}

#[tokio::test]
async fn test_figures_endpoint_rejects_malformed_body() {
    let (status, body) = send(state(), Method::POST, "/api/figures", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert!(value["error"].as_str().unwrap().starts_with("invalid selection"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = send(state(), Method::GET, "/api/nothing", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(state(), Method::GET, "/api/figures", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_answers_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(run(listener, state()));

    let client = hyper::Client::new();
    let uri: hyper::Uri = format!("http://{addr}/api/filters").parse().unwrap();
    let response = client.get(uri).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["symbols"][1], "METALS");

    server.abort();
}
