pub mod protocol;
pub mod session_id;
pub mod stroke;

pub use protocol::{ClientMessage, HistoryUpdate, ServerMessage, Snapshot};
pub use session_id::{SessionId, SessionIdError};
pub use stroke::{Point, Stroke, StrokeError, StrokeLimits, Tool};
