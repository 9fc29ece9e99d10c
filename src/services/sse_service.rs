use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    cache::ResourceType,
    dto::sse::{Handshake, InvalidationEvent, ServerEvent, SystemStatus},
    state::SharedState,
};

const INVALIDATED_EVENT: &str = "invalidated";
const RESYNC_EVENT: &str = "resync";
const STATUS_EVENT: &str = "system_status";
const HANDSHAKE_EVENT: &str = "handshake";

/// Stream cache invalidations and degraded-mode changes to a client.
///
/// A client that falls behind receives a `resync` event and should refetch
/// everything it displays.
pub fn invalidation_stream(
    state: &SharedState,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let mut invalidations = state.cache().subscribe();
    let mut degraded = state.degraded_watcher();
    let handshake = ServerEvent::json(
        Some(HANDSHAKE_EVENT.to_owned()),
        &Handshake {
            message: "invalidation stream connected".into(),
            degraded: *degraded.borrow_and_update(),
            resources: ResourceType::ALL.to_vec(),
        },
    );

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // Forwarder: ends when the client disconnects or the sources close.
    tokio::spawn(async move {
        if let Some(event) = to_event(handshake) {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            let payload = tokio::select! {
                _ = tx.closed() => break,
                received = invalidations.recv() => match received {
                    Ok(resource) => invalidated(resource),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "invalidation subscriber lagged; asking for resync");
                        ServerEvent::json(Some(RESYNC_EVENT.to_owned()), &skipped)
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = degraded.changed() => match changed {
                    Ok(()) => {
                        let value = *degraded.borrow_and_update();
                        ServerEvent::json(Some(STATUS_EVENT.to_owned()), &SystemStatus { degraded: value })
                    }
                    Err(_) => break,
                },
            };

            if let Some(event) = to_event(payload) {
                if tx.send(Ok(event)).await.is_err() {
                    break;
                }
            }
        }
        info!("invalidation SSE stream closed");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn invalidated(resource: ResourceType) -> serde_json::Result<ServerEvent> {
    ServerEvent::json(
        Some(INVALIDATED_EVENT.to_owned()),
        &InvalidationEvent { resource },
    )
}

fn to_event(payload: serde_json::Result<ServerEvent>) -> Option<Event> {
    match payload {
        Ok(payload) => {
            let mut event = Event::default().data(payload.data);
            if let Some(name) = payload.event {
                event = event.event(name);
            }
            Some(event)
        }
        Err(err) => {
            warn!(error = %err, "failed to serialise SSE payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_payload_names_the_resource() {
        let payload = invalidated(ResourceType::PlayoffMatches).unwrap();
        assert_eq!(payload.event.as_deref(), Some("invalidated"));
        assert_eq!(payload.data, r#"{"resource":"playoffMatches"}"#);
    }
}
