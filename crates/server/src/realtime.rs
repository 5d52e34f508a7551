//! Per-family realtime fan-out.
//!
//! Every mutating handler publishes a named event to its family's room after
//! the engine write succeeds; clients follow along over SSE. Rooms are plain
//! broadcast channels, created lazily and kept for the process lifetime.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Mutex;

use axum::{
    Extension,
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{Identity, ServerError, server::ServerState};

const ROOM_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
pub struct RealtimeEvent {
    pub name: String,
    pub payload: String,
}

#[derive(Default)]
pub struct RealtimeHub {
    rooms: Mutex<HashMap<String, broadcast::Sender<RealtimeEvent>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, family_id: &str) -> broadcast::Receiver<RealtimeEvent> {
        self.sender(family_id).subscribe()
    }

    /// Publishes `payload` under `name` to the family's room. Slow or absent
    /// subscribers never block the caller.
    pub fn emit<T: Serialize>(&self, family_id: &str, name: &str, payload: &T) {
        let payload = match serde_json::to_string(payload) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!("failed to serialize realtime payload: {err}");
                return;
            }
        };

        let _ = self.sender(family_id).send(RealtimeEvent {
            name: name.to_string(),
            payload,
        });
    }

    fn sender(&self, family_id: &str) -> broadcast::Sender<RealtimeEvent> {
        let mut rooms = self.rooms.lock().expect("realtime room lock poisoned");
        rooms
            .entry(family_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone()
    }
}

/// `GET /families/{family_id}/stream`
pub async fn stream(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ServerError> {
    // Membership gate; non-members get the usual 403/404.
    state.engine.family(&family_id, &identity.user_id).await?;

    let rx = state.hub.subscribe(&family_id);
    let stream = BroadcastStream::new(rx).filter_map(|item| async move {
        match item {
            Ok(event) => Some(Ok(SseEvent::default().event(event.name).data(event.payload))),
            // A lagged receiver drops missed events and keeps going.
            Err(_) => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rooms_are_isolated_per_family() {
        let hub = RealtimeHub::new();
        let mut rossi = hub.subscribe("rossi");
        let mut bianchi = hub.subscribe("bianchi");

        hub.emit("rossi", "event:created", &serde_json::json!({"id": 1}));

        let event = rossi.recv().await.unwrap();
        assert_eq!(event.name, "event:created");
        assert!(bianchi.try_recv().is_err());
    }

    #[test]
    fn emitting_without_subscribers_is_a_no_op() {
        let hub = RealtimeHub::new();
        hub.emit("rossi", "task:created", &serde_json::json!({}));
    }
}
