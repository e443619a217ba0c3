use inkroom_shared::stroke::validate_points;
use inkroom_shared::{Point, ServerMessage, Snapshot, Stroke};

use crate::config::SessionLimits;
use crate::error::CommandError;
use crate::peers::ConnectionId;
use crate::sessions::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Others(ConnectionId),
    Only(ConnectionId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Broadcast {
    fn new(audience: Audience, message: ServerMessage) -> Self {
        Self { audience, message }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Undo,
    Redo,
}

pub fn snapshot_for(session: &SessionState, requester: ConnectionId) -> Broadcast {
    Broadcast::new(
        Audience::Only(requester),
        ServerMessage::CurrentState(session.snapshot()),
    )
}

/// Appends `stroke` as a new entry and opens it for further extension by
/// `sender`. Any fresh stroke invalidates the redo buffer.
pub fn append_stroke(
    session: &mut SessionState,
    sender: ConnectionId,
    stroke: Stroke,
    limits: &SessionLimits,
) -> Result<Broadcast, CommandError> {
    stroke.validate(&limits.stroke)?;
    if session.committed.len() >= limits.max_strokes {
        return Err(CommandError::TooManyStrokes {
            max: limits.max_strokes,
        });
    }
    session.committed.push(stroke.clone());
    session.redo.clear();
    session
        .open_strokes
        .insert(sender, session.committed.len() - 1);
    Ok(Broadcast::new(
        Audience::Others(sender),
        ServerMessage::DrawingData { line: stroke },
    ))
}

pub fn extend_stroke(
    session: &mut SessionState,
    sender: ConnectionId,
    points: Vec<Point>,
    limits: &SessionLimits,
) -> Result<Broadcast, CommandError> {
    let index = *session
        .open_strokes
        .get(&sender)
        .ok_or(CommandError::NoOpenStroke)?;
    let Some(stroke) = session.committed.get_mut(index) else {
        session.open_strokes.remove(&sender);
        return Err(CommandError::NoOpenStroke);
    };
    validate_points(&points, stroke.points.len(), &limits.stroke)?;
    stroke.points.extend_from_slice(&points);
    Ok(Broadcast::new(
        Audience::Others(sender),
        ServerMessage::StrokeExtend { index, points },
    ))
}

pub fn complete_stroke(
    session: &mut SessionState,
    sender: ConnectionId,
) -> Result<(), CommandError> {
    session
        .open_strokes
        .remove(&sender)
        .map(|_| ())
        .ok_or(CommandError::NoOpenStroke)
}

/// Commits a client-computed undo/redo result verbatim after checking that
/// every stroke in it is well formed.
pub fn replace_history(
    session: &mut SessionState,
    state: Snapshot,
    kind: HistoryKind,
    limits: &SessionLimits,
) -> Result<Broadcast, CommandError> {
    for stroke in state.lines.iter().chain(&state.redo_stack) {
        stroke.validate(&limits.stroke)?;
    }
    if state.lines.len() > limits.max_strokes || state.redo_stack.len() > limits.max_strokes {
        return Err(CommandError::TooManyStrokes {
            max: limits.max_strokes,
        });
    }
    session.committed = state.lines.clone();
    session.redo = state.redo_stack.clone();
    session.open_strokes.clear();
    let message = match kind {
        HistoryKind::Undo => ServerMessage::UndoAction(state),
        HistoryKind::Redo => ServerMessage::RedoAction(state),
    };
    Ok(Broadcast::new(Audience::Everyone, message))
}

pub fn clear(session: &mut SessionState) -> Broadcast {
    session.committed.clear();
    session.redo.clear();
    session.open_strokes.clear();
    Broadcast::new(Audience::Everyone, ServerMessage::ClearCanvas)
}
