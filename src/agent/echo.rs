//! Built-in demo agent
//!
//! Lets the binary run end to end without an external model: streams a short
//! thinking phase as cumulative snapshots, performs one `clock` tool
//! round-trip, then echoes the message back as the answer.

use super::{AgentEvent, AgentEventStream, ChatAgent, ToolCallRequest, ToolResult};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct EchoAgent;

impl EchoAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatAgent for EchoAgent {
    async fn open_session(&self, session_id: &str) -> Result<()> {
        debug!(session_id, "echo session opened");
        Ok(())
    }

    async fn close_session(&self, session_id: &str) -> Result<()> {
        debug!(session_id, "echo session closed");
        Ok(())
    }

    async fn stream_turn(&self, _session_id: &str, message: &str) -> Result<AgentEventStream> {
        let (tx, rx) = mpsc::channel(16);
        let message = message.to_string();

        tokio::spawn(async move {
            // Cumulative snapshots, the common upstream chunking behavior
            let thinking = format!("Considering \"{message}\"");
            let mut snapshot = String::new();
            for word in thinking.split_inclusive(' ') {
                snapshot.push_str(word);
                if tx
                    .send(Ok(AgentEvent::Thought {
                        text: snapshot.clone(),
                    }))
                    .await
                    .is_err()
                {
                    return;
                }
            }

            let call = ToolCallRequest {
                name: "clock".to_string(),
                arguments: serde_json::json!({}),
            };
            if tx
                .send(Ok(AgentEvent::ToolCalls { calls: vec![call] }))
                .await
                .is_err()
            {
                return;
            }

            let result = ToolResult {
                name: "clock".to_string(),
                output: Utc::now().to_rfc3339(),
                success: true,
            };
            if tx
                .send(Ok(AgentEvent::ToolResults {
                    results: vec![result],
                }))
                .await
                .is_err()
            {
                return;
            }

            let answer = format!("You said: {message}");
            let mut snapshot = String::new();
            for word in answer.split_inclusive(' ') {
                snapshot.push_str(word);
                if tx
                    .send(Ok(AgentEvent::Answer {
                        text: snapshot.clone(),
                    }))
                    .await
                    .is_err()
                {
                    return;
                }
            }

            let _ = tx.send(Ok(AgentEvent::TurnComplete)).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_turn_ends_with_turn_complete() {
        let agent = EchoAgent::new();
        let mut rx = agent.stream_turn("s1", "hello").await.unwrap();

        let mut events = Vec::new();
        while let Some(item) = rx.recv().await {
            events.push(item.unwrap());
        }

        assert!(matches!(events.first(), Some(AgentEvent::Thought { .. })));
        assert!(matches!(events.last(), Some(AgentEvent::TurnComplete)));
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::ToolCalls { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::ToolResults { .. })));
    }
}
