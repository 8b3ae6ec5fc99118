//! Server-Sent Events for adapter notifications

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams catalog load and song resolution events.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    kpa_common::sse::create_event_sse_stream("kpa-adapter", state.adapter.event_bus())
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}
