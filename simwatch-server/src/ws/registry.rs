use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use simwatch_core::{JobEvent, JobEventSink};

use crate::ws::messages::ServerMessage;

/// Outbound channels of the currently connected job sockets.
///
/// One WebSocket connection owns one session id and one sender; the writer
/// task on the other end serializes queued messages onto the socket.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    channels: Arc<DashMap<Uuid, mpsc::Sender<ServerMessage>>>,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("connected", &self.channels.len())
            .finish()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session_id: Uuid, sender: mpsc::Sender<ServerMessage>) {
        self.channels.insert(session_id, sender);
    }

    pub fn unregister(&self, session_id: &Uuid) {
        self.channels.remove(session_id);
    }

    pub fn connected(&self) -> usize {
        self.channels.len()
    }

    /// Deliver a message to a session if it is still connected.
    ///
    /// Messages for departed sessions are dropped; a running job keeps
    /// producing events after its client disconnects and they all land here.
    pub async fn send(&self, session_id: Uuid, message: ServerMessage) {
        // Clone the sender out so no map guard is held across the await
        let Some(sender) = self
            .channels
            .get(&session_id)
            .map(|entry| entry.value().clone())
        else {
            debug!(%session_id, "dropping message for disconnected session");
            return;
        };

        if sender.send(message).await.is_err() {
            debug!(%session_id, "dropping message for closed session channel");
        }
    }
}

/// Bridges supervisor events onto the owning session's socket channel.
#[derive(Debug, Clone)]
pub struct RelaySink {
    registry: Arc<SessionRegistry>,
}

impl RelaySink {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl JobEventSink for RelaySink {
    async fn emit(&self, session_id: Uuid, event: JobEvent) {
        let message = ServerMessage::from_event(session_id, event);
        self.registry.send(session_id, message).await;
    }
}
