use inkroom_shared::{SessionId, StrokeError};
use thiserror::Error;

/// Why a client event was dropped. Never reported back to the client.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("session {0} does not exist")]
    UnknownSession(SessionId),
    #[error("invalid stroke: {0}")]
    InvalidStroke(#[from] StrokeError),
    #[error("connection has not joined a session")]
    NotJoined,
    #[error("connection has no open stroke")]
    NoOpenStroke,
    #[error("session already holds the maximum of {max} strokes")]
    TooManyStrokes { max: usize },
    #[error("cursor position is not finite")]
    InvalidCursor,
    #[error("chat message is empty or longer than {max} bytes")]
    InvalidChat { max: usize },
    #[error("tool preview size {0} is not a positive number")]
    InvalidToolPreview(f64),
}
