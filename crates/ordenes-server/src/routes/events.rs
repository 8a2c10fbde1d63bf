use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /eventos: SSE stream that emits `update` whenever orders change.
///
/// The stream ends when the server starts shutting down, so graceful
/// shutdown is not held open by connected clients.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let updates = BroadcastStream::new(app.event_tx.subscribe())
        .filter_map(|msg| msg.ok().map(|_| Some(Event::default().event("update").data("update"))));
    // `None` marks the end; WatchStream yields the current value first.
    let stop = WatchStream::new(app.shutdown.subscribe())
        .filter(|stopping| *stopping)
        .map(|_| None::<Event>);
    let stream = updates
        .merge(stop)
        .map_while(|event| event)
        .map(Ok::<Event, Infallible>);
    Sse::new(stream).keep_alive(KeepAlive::default())
}
