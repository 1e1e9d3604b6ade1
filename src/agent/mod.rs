//! Boundary types for the external conversational agent
//!
//! The agent's reasoning and tool implementations live outside this crate.
//! What crosses the boundary is a closed tagged union of event shapes,
//! constructed once where raw upstream events are received, plus a trait the
//! server drives. Each streaming turn is delivered over its own channel and
//! drained by the request task.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub mod echo;
pub mod scripted;

pub use echo::EchoAgent;
pub use scripted::ScriptedAgent;

/// A tool invocation requested by the agent within a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    /// Arguments as the agent supplied them
    pub arguments: serde_json::Value,
}

/// The outcome of a tool invocation. The upstream protocol identifies
/// results by tool name only, never by invocation id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub name: String,
    pub output: String,
    pub success: bool,
}

/// One raw event from the agent's stream for a single turn.
///
/// Text-bearing events carry snapshots, not deltas: the common upstream
/// behavior is cumulative snapshots, but restarts happen and the translator
/// diffs them either way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Partial text produced while the agent reasons
    Thought { text: String },
    /// Tool invocations the agent wants executed
    ToolCalls { calls: Vec<ToolCallRequest> },
    /// Results for previously requested invocations, keyed by name
    ToolResults { results: Vec<ToolResult> },
    /// Snapshot of the user-visible answer so far
    Answer { text: String },
    /// The agent finished its turn
    TurnComplete,
}

/// Stream of events for one conversational turn. An `Err` item means the
/// upstream source itself failed; the stream must not be drained further.
pub type AgentEventStream = mpsc::Receiver<Result<AgentEvent>>;

/// The external agent collaborator.
///
/// Conversation state is owned entirely by the implementation; the server
/// only holds session ids and forwards them here.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Create conversation state for a new session id.
    async fn open_session(&self, session_id: &str) -> Result<()>;

    /// Drop conversation state for a session id. Must tolerate unknown ids.
    async fn close_session(&self, session_id: &str) -> Result<()>;

    /// Start one conversational turn and return its event stream.
    async fn stream_turn(&self, session_id: &str, message: &str) -> Result<AgentEventStream>;
}
