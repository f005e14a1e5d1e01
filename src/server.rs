// HTTP front end: serves the page, the filter lists and figure updates.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::{
    body::Body, header, header::HeaderValue, server::conn::Http, service::service_fn, Method,
    Request, Response, StatusCode,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::charts::FigureSet;
use crate::dashboard::on_selection_change;
use crate::error::DashError;
use crate::filter::FilterSelection;
use crate::page::render_index;
use crate::prepare::MarketData;

/// Everything a request handler reads. Built once at startup, never mutated.
pub struct AppState {
    data: MarketData,
    index_html: String,
}

impl AppState {
    pub fn new(data: MarketData) -> Result<Self, DashError> {
        let index_html = render_index(&data)?;
        Ok(Self { data, index_html })
    }

    pub fn data(&self) -> &MarketData {
        &self.data
    }
}

#[derive(Serialize)]
struct FiltersResponse<'a> {
    locations: &'a [String],
    symbols: &'a [String],
}

/// Body of a `/api/figures` request.
///
/// Selections come either as values or as row indices into the filter lists
/// from `/api/filters`. Row indices win when both are given for one column.
#[derive(Debug, Default, Deserialize)]
struct FiguresRequest {
    #[serde(flatten)]
    values: FilterSelection,
    #[serde(default)]
    location_rows: Option<Vec<usize>>,
    #[serde(default)]
    symbol_rows: Option<Vec<usize>>,
}

impl FiguresRequest {
    fn into_selection(self, data: &MarketData) -> FilterSelection {
        let by_rows = FilterSelection::from_rows(
            data,
            self.location_rows.as_deref(),
            self.symbol_rows.as_deref(),
        );
        FilterSelection {
            locations: by_rows.locations.or(self.values.locations),
            symbols: by_rows.symbols.or(self.values.symbols),
        }
    }
}

/// Body of a successful `/api/figures` reply. `locations` and `symbols` echo
/// the selection after fallbacks.
#[derive(Serialize)]
struct FiguresResponse {
    row_count: usize,
    locations: Vec<String>,
    symbols: Vec<String>,
    figures: FigureSet,
}

/// Top-level service function, one call per request.
pub async fn handle_request(
    req: Request<Body>,
    state: Arc<AppState>,
) -> Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => html_response(state.index_html.clone()),
        (&Method::GET, "/api/filters") => json_response(
            StatusCode::OK,
            &FiltersResponse {
                locations: state.data.locations(),
                symbols: state.data.symbols(),
            },
        ),
        (&Method::POST, "/api/figures") => handle_figures_request(req, &state).await,
        _ => json_response(StatusCode::NOT_FOUND, &json!({ "error": "not found" })),
    };
    Ok(response)
}

async fn handle_figures_request(req: Request<Body>, state: &AppState) -> Response<Body> {
    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read figure request body: {e}");
            return json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": "unreadable request body" }),
            );
        }
    };

    // An empty body is the initial render: nothing selected yet.
    let request: FiguresRequest = if body.iter().all(u8::is_ascii_whitespace) {
        FiguresRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    &json!({ "error": format!("invalid selection: {e}") }),
                );
            }
        }
    };
    let selection = request.into_selection(&state.data);

    match on_selection_change(&state.data, &selection) {
        Ok(update) => json_response(
            StatusCode::OK,
            &FiguresResponse {
                row_count: update.filtered.height(),
                locations: selection.effective_locations(),
                symbols: selection.effective_symbols(),
                figures: update.figures,
            },
        ),
        Err(e) => {
            error!("Failed to build figures for {selection:?}: {e}");
            internal_error()
        }
    }
}

// ── Responses ───────────────────────────────────────────────────────────────

fn html_response(html: String) -> Response<Body> {
    response_with(StatusCode::OK, "text/html; charset=utf-8", Body::from(html))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    match serde_json::to_vec(body) {
        Ok(bytes) => response_with(status, "application/json", Body::from(bytes)),
        Err(e) => {
            error!("Failed to serialize response: {e}");
            internal_error()
        }
    }
}

fn internal_error() -> Response<Body> {
    response_with(
        StatusCode::INTERNAL_SERVER_ERROR,
        "application/json",
        Body::from(r#"{"error":"internal error"}"#),
    )
}

fn response_with(status: StatusCode, content_type: &'static str, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

// ── Server loop ─────────────────────────────────────────────────────────────

/// Bind `addr` and serve until the listener fails.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), DashError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    run(listener, state).await
}

/// Serve connections from an already bound listener, one task per connection.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> Result<(), DashError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true).ok();

        let state = state.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = Http::new().serve_connection(stream, service).await {
                warn!("Error serving connection from {peer}: {e}");
            }
        });
    }
}
