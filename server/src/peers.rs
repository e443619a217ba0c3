use std::fmt;

use dashmap::DashMap;
use inkroom_shared::ServerMessage;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outbound queue of every live connection.
///
/// Sends never block. A peer whose receiving half is gone is pruned on the
/// first failed send and simply misses the message.
#[derive(Default)]
pub struct PeerTable {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl PeerTable {
    pub fn register(&self, id: ConnectionId) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.insert(id, tx);
        rx
    }

    pub fn unregister(&self, id: ConnectionId) {
        self.peers.remove(&id);
    }

    pub fn send(&self, id: ConnectionId, message: ServerMessage) -> bool {
        let Some(tx) = self.peers.get(&id).map(|entry| entry.value().clone()) else {
            return false;
        };
        if tx.send(message).is_ok() {
            return true;
        }
        debug!(conn = %id, "dropping message for closed peer");
        self.peers.remove(&id);
        false
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
