//! Wire frames for the phased streaming protocol
//!
//! Each frame goes out as a named SSE event whose JSON payload repeats the
//! name in its `type` field. Frames are immutable once built and are written
//! exactly once, in emission order.

use serde::{Deserialize, Serialize};

/// One discrete protocol message emitted to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    SessionStart {
        session_id: String,
    },
    ThinkingStart,
    ThinkingDelta {
        content: String,
    },
    ThinkingEnd,
    ToolCallStart {
        tool_id: String,
        tool_name: String,
        /// JSON-encoded argument payload
        arguments: String,
    },
    ToolCallEnd {
        tool_id: String,
        tool_name: String,
        /// Truncated at the configured cap with a `"... (truncated)"` suffix
        result: String,
        success: bool,
    },
    ResponseStart,
    ResponseDelta {
        content: String,
    },
    ResponseEnd,
    Error {
        message: String,
        code: String,
    },
    Complete,
}

impl StreamFrame {
    /// SSE event name; always matches the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            StreamFrame::SessionStart { .. } => "session_start",
            StreamFrame::ThinkingStart => "thinking_start",
            StreamFrame::ThinkingDelta { .. } => "thinking_delta",
            StreamFrame::ThinkingEnd => "thinking_end",
            StreamFrame::ToolCallStart { .. } => "tool_call_start",
            StreamFrame::ToolCallEnd { .. } => "tool_call_end",
            StreamFrame::ResponseStart => "response_start",
            StreamFrame::ResponseDelta { .. } => "response_delta",
            StreamFrame::ResponseEnd => "response_end",
            StreamFrame::Error { .. } => "error",
            StreamFrame::Complete => "complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_matches_name() {
        let frames = vec![
            StreamFrame::SessionStart {
                session_id: "session-1".to_string(),
            },
            StreamFrame::ThinkingStart,
            StreamFrame::ThinkingDelta {
                content: "x".to_string(),
            },
            StreamFrame::ThinkingEnd,
            StreamFrame::ToolCallStart {
                tool_id: "tool_1".to_string(),
                tool_name: "search".to_string(),
                arguments: "{}".to_string(),
            },
            StreamFrame::ToolCallEnd {
                tool_id: "tool_1".to_string(),
                tool_name: "search".to_string(),
                result: "ok".to_string(),
                success: true,
            },
            StreamFrame::ResponseStart,
            StreamFrame::ResponseDelta {
                content: "y".to_string(),
            },
            StreamFrame::ResponseEnd,
            StreamFrame::Error {
                message: "boom".to_string(),
                code: "STREAM_ERROR".to_string(),
            },
            StreamFrame::Complete,
        ];

        for frame in frames {
            let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
            assert_eq!(json["type"], frame.name());
        }
    }

    #[test]
    fn test_session_start_payload() {
        let frame = StreamFrame::SessionStart {
            session_id: "session-42".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"session_start","session_id":"session-42"}"#);
    }

    #[test]
    fn test_tool_call_end_payload() {
        let frame = StreamFrame::ToolCallEnd {
            tool_id: "tool_3".to_string(),
            tool_name: "search".to_string(),
            result: "found it".to_string(),
            success: true,
        };
        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["tool_id"], "tool_3");
        assert_eq!(json["tool_name"], "search");
        assert_eq!(json["result"], "found it");
        assert_eq!(json["success"], true);
    }
}
