//! Server-Sent Events (SSE) utilities
//!
//! Renders a session [`Subscription`] as an SSE response: each logged event
//! becomes a record named after its `type` tag with the JSON payload as data,
//! and idle periods become `: heartbeat` comment lines.

use crate::events::{SessionEvent, StreamItem, Subscription};
use axum::response::sse::{Event, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, warn};

/// Convert one session event into an SSE record
///
/// Returns `None` if the payload cannot be serialized.
pub fn session_event_to_sse(event: &SessionEvent) -> Option<Event> {
    let event_type = event.event_type();
    match serde_json::to_string(event) {
        Ok(event_json) => Some(Event::default().event(event_type).data(event_json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
            None
        }
    }
}

/// Heartbeat comment record
pub fn heartbeat() -> Event {
    Event::default().comment("heartbeat")
}

/// Create the SSE response for one session subscription
///
/// The stream replays the log, follows the live feed, and closes after the
/// terminal event. Dropping the response (client disconnect) only releases
/// this subscriber.
pub fn session_sse_stream(
    subscription: Subscription,
    keep_alive: Duration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = subscription
        .into_stream(keep_alive)
        .filter_map(|item| async move {
            match item {
                StreamItem::Event(event) => {
                    debug!("SSE: Sending session event: {}", event.event_type());
                    session_event_to_sse(&event).map(Ok)
                }
                StreamItem::KeepAlive => {
                    debug!("SSE: Sending heartbeat");
                    Some(Ok(heartbeat()))
                }
            }
        });

    Sse::new(stream)
}
