//! SSE framing (§6): each event serialises as `{type, data, timestamp, seq}`
//! on a single `data:` line; heartbeats keep idle connections alive.
use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;

use super::SharedRealtimeBus;

const HEARTBEAT_INTERVAL_SECS: u64 = 30;

// user_id is taken from the path rather than a session/token extractor;
// authentication is out of scope for this service.
pub async fn stream_events(
    State(bus): State<SharedRealtimeBus>,
    Path(user_id): Path<i32>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (channel_id, mut receiver) = bus.subscribe(user_id).await;

    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Some(event) => match serde_json::to_string(&event) {
                    Ok(data) => yield Ok(Event::default().data(data)),
                    Err(err) => tracing::error!(?err, "failed to serialize realtime event"),
                },
                None => {
                    bus.unsubscribe(user_id, channel_id).await;
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS)).text("heartbeat"))
}
