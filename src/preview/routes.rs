//! Route definitions for the preview server.
//!
//! ## Routes
//!
//! - `GET /` - The journal page, rendered from the current snapshot
//! - `GET /events` - Server-sent reload notifications (live reload only)

use super::state::AppState;
use crate::constants::{CONNECTED_MESSAGE, EVENTS_ROUTE, RELOAD_MESSAGE};
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::trace::TraceLayer;
use tracing::{debug, Level};

/// Builds the preview router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new().route("/", get(index_page));
    if state.live_reload {
        router = router.route(EVENTS_ROUTE, get(reload_events));
    }
    router
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}

/// Renders the journal page from whatever snapshot is current.
async fn index_page(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.entries.snapshot();
    let page = state.site.render_index(&snapshot.entries, state.live_reload);
    ([(header::CACHE_CONTROL, "no-cache")], Html(page))
}

/// Streams one `connected` event, then a `reload` event per completed reload.
///
/// A client that falls behind the broadcast buffer still gets a `reload`
/// for the missed updates. The stream ends when the server shuts down.
async fn reload_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("live-reload client connected");
    let updates = BroadcastStream::new(state.reloads.subscribe())
        .map(|_| Ok(Event::default().data(RELOAD_MESSAGE)));
    let events = stream::once(async { Ok(Event::default().data(CONNECTED_MESSAGE)) })
        .chain(updates)
        .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::default())
}
