use std::convert::Infallible;
use std::sync::Arc;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::Html,
    response::Json,
    routing::get,
    Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use log::{warn, error};

use crate::board::message::{BoardEvent, BoardMessage};
use crate::board::{NotificationHub, QuoteStore};
use crate::config::parse_ticker_list;

const PAGE_SHELL: &str = include_str!("../../static/index.html");

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<QuoteStore>,
    pub hub: Arc<NotificationHub>,
}

#[derive(Debug, Deserialize)]
pub struct PushParams {
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetParams {
    pub tickers: Option<String>,
}

// GET / - static page shell, no state interaction
pub async fn index() -> Html<&'static str> {
    Html(PAGE_SHELL)
}

// GET /events - long-lived server-sent event stream
pub async fn stream_events(
    State(state): State<ApiState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, &'static str)> {
    let payloads = client_stream(&state).map_err(|e| {
        error!("Could not open event stream: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Stream unavailable")
    })?;

    let events = payloads.map(|payload| Ok(Event::default().data(payload)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Builds the per-client payload sequence: exactly one snapshot (or an
/// info placeholder while the table is still empty), then every message
/// the dispatcher delivers, in order. The client is registered before
/// the snapshot is read so nothing published in between is missed.
fn client_stream(state: &ApiState) -> Result<impl Stream<Item = String>, String> {
    let (_client_id, rx) = state.hub.register()?;

    let snapshot = match state.store.snapshot()? {
        Some(quotes) => BoardMessage::Event(BoardEvent::Snapshot { quotes }),
        None => BoardMessage::info("no quotes yet"),
    };

    let stream = stream::once(async move { snapshot })
        .chain(ReceiverStream::new(rx))
        .filter_map(|message| async move {
            match message.to_payload() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    error!("Could not serialize board message: {}", e);
                    None
                }
            }
        });

    Ok(stream)
}

// GET /push?msg=<text> - enqueue an ad hoc text line
pub async fn push_message(
    State(state): State<ApiState>,
    Query(params): Query<PushParams>,
) -> (StatusCode, &'static str) {
    let text = params.msg.unwrap_or_default();
    let text = text.trim();

    if text.is_empty() {
        warn!("Rejected push with empty message");
        return (StatusCode::BAD_REQUEST, "Empty");
    }

    state.hub.publish(BoardMessage::text_line(text));
    (StatusCode::OK, "OK")
}

// GET /set?tickers=<comma-separated> - replace the symbol set
pub async fn set_tickers(
    State(state): State<ApiState>,
    Query(params): Query<SetParams>,
) -> (StatusCode, &'static str) {
    let symbols = parse_ticker_list(params.tickers.as_deref().unwrap_or(""));

    if symbols.is_empty() {
        warn!("Rejected ticker update with no symbols");
        return (StatusCode::BAD_REQUEST, "No symbols");
    }

    match state.store.replace_symbols(symbols) {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!("Could not replace symbol set: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Store unavailable")
        }
    }
}

// GET /api/health - health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "quote_board",
        "timestamp": chrono::Utc::now()
    }))
}

// Create the router with the full ingress surface
pub fn create_router(state: ApiState) -> Router {
    let api_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .route("/", get(index))
        .route("/events", get(stream_events))
        .route("/push", get(push_message))
        .route("/set", get(set_tickers))
        .nest("/api", api_routes)
        .with_state(state)
}
