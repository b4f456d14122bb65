// ABOUTME: Server-Sent Events stream of cache invalidations
// ABOUTME: Clients refetch the named resources whenever a mutation commits

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::DbState;

/// GET /api/v1/events
pub async fn invalidation_events(
    State(db): State<DbState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    debug!("Invalidation stream subscriber connected");
    let rx = db.bus.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(invalidation) => {
            let json = serde_json::to_string(&invalidation).unwrap_or_default();
            Some(Ok(Event::default().event("invalidate").data(json)))
        }
        Err(e) => {
            warn!("Invalidation stream lagged: {}", e);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
