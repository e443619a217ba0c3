//! Protocol handler: applies client events to the session store and fans the
//! result out to the session's members.
//!
//! Every mutating command takes its session's write lock, applies the change
//! and enqueues the resulting broadcast before releasing it, so all members
//! observe mutations of one session in the order they were applied.
//! Cursor, chat and tool-preview events bypass the store entirely.

use std::time::{Duration, Instant};

use inkroom_shared::{ClientMessage, Point, ServerMessage, SessionId, Snapshot, Stroke, Tool};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SessionLimits;
use crate::error::CommandError;
use crate::logic::{self, Audience, Broadcast, HistoryKind};
use crate::membership::{Departure, MembershipRegistry};
use crate::peers::{ConnectionId, PeerTable};
use crate::sessions::{SessionState, SessionStore};

pub struct SyncEngine {
    store: SessionStore,
    members: MembershipRegistry,
    peers: PeerTable,
    limits: SessionLimits,
}

impl SyncEngine {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            store: SessionStore::default(),
            members: MembershipRegistry::default(),
            peers: PeerTable::default(),
            limits,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn members(&self) -> &MembershipRegistry {
        &self.members
    }

    /// Registers a new connection and greets it with its identifier.
    pub fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let connection = ConnectionId::new();
        let rx = self.peers.register(connection);
        self.peers.send(
            connection,
            ServerMessage::Connected {
                connection_id: connection.to_string(),
            },
        );
        (connection, rx)
    }

    /// Forgets the connection. Other members are not notified.
    pub async fn disconnect(&self, connection: ConnectionId) {
        self.peers.unregister(connection);
        if let Some(departure) = self.members.leave(connection) {
            self.vacate(departure, connection).await;
        }
    }

    pub async fn handle(
        &self,
        connection: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), CommandError> {
        match message {
            ClientMessage::JoinSession(session_id) => {
                self.join(&session_id, connection).await;
                Ok(())
            }
            ClientMessage::RequestState(session_id) => {
                self.request_state(&session_id, connection).await;
                Ok(())
            }
            ClientMessage::DrawingData { session_id, line } => {
                self.append_stroke(&session_id, connection, line).await
            }
            ClientMessage::StrokeExtend { session_id, points } => {
                self.extend_stroke(&session_id, connection, points).await
            }
            ClientMessage::DrawingComplete { session_id } => {
                self.complete_stroke(&session_id, connection).await
            }
            ClientMessage::UndoAction(update) => {
                self.undo(&update.session_id, connection, update.state).await
            }
            ClientMessage::RedoAction(update) => {
                self.redo(&update.session_id, connection, update.state).await
            }
            ClientMessage::ClearCanvas(session_id) => self.clear(&session_id, connection).await,
            ClientMessage::CursorUpdate {
                session_id,
                x,
                y,
                user_id,
                color,
            } => self.cursor_update(&session_id, connection, Point { x, y }, user_id, color),
            ClientMessage::ChatMessage {
                session_id,
                user_id,
                message,
            } => self.chat_message(&session_id, connection, user_id, message),
            ClientMessage::ToolChange {
                session_id,
                user_id,
                tool,
                color,
                size,
            } => self.tool_change(session_id.as_ref(), connection, user_id, tool, color, size),
        }
    }

    pub async fn join(&self, session_id: &SessionId, connection: ConnectionId) {
        if let Some(departure) = self.members.join(session_id, connection) {
            self.vacate(departure, connection).await;
        }
        let session = self.store.create_if_absent(session_id);
        session.write().await.vacated_at = None;
        info!(
            session = %session_id,
            conn = %connection,
            peers = self.members.member_count(session_id),
            "joined session"
        );
    }

    /// Pushes the full snapshot to the requester only.
    pub async fn request_state(&self, session_id: &SessionId, connection: ConnectionId) {
        let session = self.store.create_if_absent(session_id);
        let state = session.read().await;
        debug!(
            session = %session_id,
            conn = %connection,
            strokes = state.committed.len(),
            "sending state"
        );
        self.deliver(session_id, logic::snapshot_for(&state, connection));
    }

    pub async fn append_stroke(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        stroke: Stroke,
    ) -> Result<(), CommandError> {
        self.mutate(session_id, |state| {
            logic::append_stroke(state, connection, stroke, &self.limits)
        })
        .await
    }

    pub async fn extend_stroke(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        points: Vec<Point>,
    ) -> Result<(), CommandError> {
        self.mutate(session_id, |state| {
            logic::extend_stroke(state, connection, points, &self.limits)
        })
        .await
    }

    pub async fn complete_stroke(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
    ) -> Result<(), CommandError> {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| CommandError::UnknownSession(session_id.clone()))?;
        let mut state = session.write().await;
        logic::complete_stroke(&mut state, connection)
    }

    pub async fn undo(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        state: Snapshot,
    ) -> Result<(), CommandError> {
        self.replace_history(session_id, connection, state, HistoryKind::Undo)
            .await
    }

    pub async fn redo(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        state: Snapshot,
    ) -> Result<(), CommandError> {
        self.replace_history(session_id, connection, state, HistoryKind::Redo)
            .await
    }

    pub async fn clear(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
    ) -> Result<(), CommandError> {
        debug!(session = %session_id, conn = %connection, "clearing canvas");
        self.mutate(session_id, |state| Ok(logic::clear(state)))
            .await
    }

    pub fn cursor_update(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        position: Point,
        user_id: Option<String>,
        color: String,
    ) -> Result<(), CommandError> {
        self.ensure_exists(session_id)?;
        if !position.is_finite() {
            return Err(CommandError::InvalidCursor);
        }
        let message = ServerMessage::CursorUpdate {
            x: position.x,
            y: position.y,
            user_id: user_id.unwrap_or_else(|| connection.to_string()),
            color,
        };
        self.deliver(
            session_id,
            Broadcast {
                audience: Audience::Others(connection),
                message,
            },
        );
        Ok(())
    }

    pub fn chat_message(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        user_id: Option<String>,
        message: String,
    ) -> Result<(), CommandError> {
        self.ensure_exists(session_id)?;
        let max = self.limits.max_chat_len;
        if message.trim().is_empty() || message.len() > max {
            return Err(CommandError::InvalidChat { max });
        }
        let message = ServerMessage::ChatMessage {
            user_id: user_id.unwrap_or_else(|| connection.to_string()),
            message,
        };
        self.deliver(
            session_id,
            Broadcast {
                audience: Audience::Everyone,
                message,
            },
        );
        Ok(())
    }

    /// Tool previews go to the named session, or to the one the sender joined.
    pub fn tool_change(
        &self,
        session_id: Option<&SessionId>,
        connection: ConnectionId,
        user_id: Option<String>,
        tool: Tool,
        color: String,
        size: f64,
    ) -> Result<(), CommandError> {
        let session_id = match session_id {
            Some(session_id) => session_id.clone(),
            None => self
                .members
                .session_of(connection)
                .ok_or(CommandError::NotJoined)?,
        };
        self.ensure_exists(&session_id)?;
        if !size.is_finite() || size <= 0.0 {
            return Err(CommandError::InvalidToolPreview(size));
        }
        let message = ServerMessage::ToolChange {
            user_id: user_id.unwrap_or_else(|| connection.to_string()),
            tool,
            color,
            size,
        };
        self.deliver(
            &session_id,
            Broadcast {
                audience: Audience::Others(connection),
                message,
            },
        );
        Ok(())
    }

    /// Removes sessions that have been without members for at least `ttl`.
    pub fn reap_idle(&self, ttl: Duration, now: Instant) -> Vec<SessionId> {
        let reaped = self.store.remove_idle(ttl, now, |session_id| {
            self.members.member_count(session_id) > 0
        });
        for session_id in &reaped {
            info!(session = %session_id, "reclaimed idle session");
        }
        reaped
    }

    async fn replace_history(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        state: Snapshot,
        kind: HistoryKind,
    ) -> Result<(), CommandError> {
        debug!(
            session = %session_id,
            conn = %connection,
            ?kind,
            strokes = state.lines.len(),
            redo = state.redo_stack.len(),
            "replacing history"
        );
        self.mutate(session_id, |current| {
            logic::replace_history(current, state, kind, &self.limits)
        })
        .await
    }

    async fn mutate<F>(&self, session_id: &SessionId, apply: F) -> Result<(), CommandError>
    where
        F: FnOnce(&mut SessionState) -> Result<Broadcast, CommandError>,
    {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| CommandError::UnknownSession(session_id.clone()))?;
        let mut state = session.write().await;
        let broadcast = apply(&mut state)?;
        self.deliver(session_id, broadcast);
        Ok(())
    }

    async fn vacate(&self, departure: Departure, connection: ConnectionId) {
        let Some(session) = self.store.get(&departure.session_id) else {
            return;
        };
        let mut state = session.write().await;
        state.open_strokes.remove(&connection);
        if departure.now_empty {
            state.vacated_at = Some(Instant::now());
        }
        info!(
            session = %departure.session_id,
            conn = %connection,
            peers = self.members.member_count(&departure.session_id),
            "left session"
        );
    }

    fn ensure_exists(&self, session_id: &SessionId) -> Result<(), CommandError> {
        if self.store.contains(session_id) {
            Ok(())
        } else {
            Err(CommandError::UnknownSession(session_id.clone()))
        }
    }

    fn deliver(&self, session_id: &SessionId, broadcast: Broadcast) {
        let Broadcast { audience, message } = broadcast;
        match audience {
            Audience::Only(connection) => {
                self.peers.send(connection, message);
            }
            Audience::Everyone => {
                for member in self.members.members_of(session_id) {
                    self.peers.send(member, message.clone());
                }
            }
            Audience::Others(sender) => {
                for member in self.members.members_of(session_id) {
                    if member != sender {
                        self.peers.send(member, message.clone());
                    }
                }
            }
        }
    }
}
