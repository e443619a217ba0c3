use serde::{Deserialize, Serialize};

use crate::stroke::{points_format, Point, Stroke, Tool};
use crate::SessionId;

/// Committed history plus redo buffer, as supplied by an undoing/redoing
/// client or pushed back to members.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub lines: Vec<Stroke>,
    pub redo_stack: Vec<Stroke>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryUpdate {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub state: Snapshot,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinSession(SessionId),
    RequestState(SessionId),
    #[serde(rename_all = "camelCase")]
    DrawingData {
        session_id: SessionId,
        line: Stroke,
    },
    #[serde(rename_all = "camelCase")]
    StrokeExtend {
        session_id: SessionId,
        #[serde(with = "points_format")]
        points: Vec<Point>,
    },
    #[serde(rename_all = "camelCase")]
    DrawingComplete { session_id: SessionId },
    UndoAction(HistoryUpdate),
    RedoAction(HistoryUpdate),
    ClearCanvas(SessionId),
    #[serde(rename_all = "camelCase")]
    CursorUpdate {
        session_id: SessionId,
        x: f64,
        y: f64,
        #[serde(default)]
        user_id: Option<String>,
        color: String,
    },
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        session_id: SessionId,
        #[serde(default)]
        user_id: Option<String>,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolChange {
        #[serde(default)]
        session_id: Option<SessionId>,
        #[serde(default)]
        user_id: Option<String>,
        tool: Tool,
        color: String,
        size: f64,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: String },
    CurrentState(Snapshot),
    DrawingData { line: Stroke },
    StrokeExtend {
        index: usize,
        #[serde(with = "points_format")]
        points: Vec<Point>,
    },
    UndoAction(Snapshot),
    RedoAction(Snapshot),
    ClearCanvas,
    #[serde(rename_all = "camelCase")]
    CursorUpdate {
        x: f64,
        y: f64,
        user_id: String,
        color: String,
    },
    #[serde(rename_all = "camelCase")]
    ChatMessage { user_id: String, message: String },
    #[serde(rename_all = "camelCase")]
    ToolChange {
        user_id: String,
        tool: Tool,
        color: String,
        size: f64,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_client_events() {
        let join: ClientMessage =
            serde_json::from_value(json!({"event": "join-session", "data": "s1"})).unwrap();
        assert_eq!(
            join,
            ClientMessage::JoinSession(SessionId::parse("s1").unwrap())
        );

        let drawing: ClientMessage = serde_json::from_value(json!({
            "event": "drawing-data",
            "data": {
                "sessionId": "s1",
                "line": {"tool": "pen", "points": [0, 0, 5, 5], "stroke": "#000", "strokeWidth": 3}
            }
        }))
        .unwrap();
        match drawing {
            ClientMessage::DrawingData { session_id, line } => {
                assert_eq!(session_id.as_str(), "s1");
                assert_eq!(line.points.len(), 2);
            }
            other => panic!("unexpected message {other:?}"),
        }

        let undo: ClientMessage = serde_json::from_value(json!({
            "event": "undo-action",
            "data": {"sessionId": "s1", "lines": [], "redoStack": []}
        }))
        .unwrap();
        assert!(matches!(undo, ClientMessage::UndoAction(update) if update.state == Snapshot::default()));

        let tool: ClientMessage = serde_json::from_value(json!({
            "event": "tool-change",
            "data": {"tool": "eraser", "color": "#fff", "size": 12}
        }))
        .unwrap();
        assert!(matches!(
            tool,
            ClientMessage::ToolChange {
                session_id: None,
                user_id: None,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_events_and_bad_session_ids() {
        assert!(serde_json::from_value::<ClientMessage>(json!({"event": "drawing-complete-all"})).is_err());
        assert!(
            serde_json::from_value::<ClientMessage>(json!({"event": "clear-canvas", "data": ""}))
                .is_err()
        );
    }

    #[test]
    fn server_events_use_wire_names() {
        assert_eq!(
            serde_json::to_value(ServerMessage::ClearCanvas).unwrap(),
            json!({"event": "clear-canvas"})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::CurrentState(Snapshot::default())).unwrap(),
            json!({"event": "current-state", "data": {"lines": [], "redoStack": []}})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::ChatMessage {
                user_id: "u1".into(),
                message: "hi".into(),
            })
            .unwrap(),
            json!({"event": "chat-message", "data": {"userId": "u1", "message": "hi"}})
        );
    }
}
