//! Phase state machine translating agent events into wire frames
//!
//! One translator exists per streaming request and is owned by that
//! request's task; it is a pure synchronous function over each received
//! event plus local accumulator state. Thinking, tool-calling and
//! responding phases are each re-enterable within a turn; `Complete` and
//! `Error` are terminal.

use super::delta::DeltaTracker;
use super::frame::StreamFrame;
use super::tools::ToolCallTracker;
use crate::agent::{AgentEvent, ToolResult};
use crate::error::{ColloquyError, Result};
use crate::utils::text::truncate_with_marker;
use tracing::debug;

/// Error code for a recoverable per-event translation failure.
pub const CODE_STREAM_ERROR: &str = "STREAM_ERROR";
/// Error code for an unrecoverable upstream source failure.
pub const CODE_PROCESSING_ERROR: &str = "PROCESSING_ERROR";

/// Logical stage a conversational turn is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Thinking,
    ToolCalling,
    Responding,
    Complete,
    Error,
}

/// Drives phase transitions for one streaming request.
pub struct StreamTranslator {
    session_id: String,
    tool_result_max_chars: usize,
    phase: StreamPhase,
    thinking: DeltaTracker,
    response: DeltaTracker,
    tools: ToolCallTracker,
    /// ThinkingStart emitted without a matching ThinkingEnd yet
    thinking_open: bool,
    /// Any thinking delta emitted so far in this request; never reset, so a
    /// tools transition after re-entering thinking still closes the phase
    thinking_delta_emitted: bool,
    response_started: bool,
    response_ended: bool,
}

impl StreamTranslator {
    pub fn new(session_id: impl Into<String>, tool_result_max_chars: usize) -> Self {
        Self {
            session_id: session_id.into(),
            tool_result_max_chars,
            phase: StreamPhase::Idle,
            thinking: DeltaTracker::new(),
            response: DeltaTracker::new(),
            tools: ToolCallTracker::new(),
            thinking_open: false,
            thinking_delta_emitted: false,
            response_started: false,
            response_ended: false,
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Translate one upstream event into zero or more wire frames.
    ///
    /// An error here is recoverable: the caller surfaces it as an `error`
    /// frame with [`CODE_STREAM_ERROR`] and keeps draining the stream.
    pub fn handle(&mut self, event: &AgentEvent) -> Result<Vec<StreamFrame>> {
        let mut frames = Vec::new();

        match event {
            AgentEvent::Thought { text } => {
                if text.is_empty() {
                    return Ok(frames);
                }
                if !self.thinking_open {
                    self.thinking_open = true;
                    self.phase = StreamPhase::Thinking;
                    frames.push(StreamFrame::ThinkingStart);
                }
                let delta = self.thinking.push(text);
                if !delta.is_empty() {
                    self.thinking_delta_emitted = true;
                    frames.push(StreamFrame::ThinkingDelta { content: delta });
                }
            }

            AgentEvent::ToolCalls { calls } => {
                if calls.is_empty() {
                    return Ok(frames);
                }
                // Results correlate by name, so a nameless call could never
                // be resolved. Rejected before any state changes.
                if calls.iter().any(|call| call.name.is_empty()) {
                    return Err(ColloquyError::MalformedEvent(
                        "tool call with an empty name".to_string(),
                    ));
                }
                if self.thinking_open && self.thinking_delta_emitted {
                    self.thinking_open = false;
                    frames.push(StreamFrame::ThinkingEnd);
                }
                self.phase = StreamPhase::ToolCalling;
                for call in calls {
                    let tool_id = self.tools.begin(&call.name);
                    let arguments = serde_json::to_string(&call.arguments)?;
                    frames.push(StreamFrame::ToolCallStart {
                        tool_id,
                        tool_name: call.name.clone(),
                        arguments,
                    });
                }
            }

            AgentEvent::ToolResults { results } => {
                for result in results {
                    frames.extend(self.correlate_result(result));
                }
            }

            AgentEvent::Answer { text } => {
                if text.is_empty() {
                    return Ok(frames);
                }
                if self.thinking_open {
                    self.thinking_open = false;
                    frames.push(StreamFrame::ThinkingEnd);
                }
                if !self.response_started {
                    self.response_started = true;
                    frames.push(StreamFrame::ResponseStart);
                }
                self.phase = StreamPhase::Responding;
                let delta = self.response.push(text);
                if !delta.is_empty() {
                    frames.push(StreamFrame::ResponseDelta { content: delta });
                }
            }

            AgentEvent::TurnComplete => {
                if self.thinking_open {
                    self.thinking_open = false;
                    frames.push(StreamFrame::ThinkingEnd);
                }
                if self.response_started && !self.response_ended {
                    self.response_ended = true;
                    frames.push(StreamFrame::ResponseEnd);
                }
            }
        }

        Ok(frames)
    }

    fn correlate_result(&mut self, result: &ToolResult) -> Option<StreamFrame> {
        match self.tools.resolve(&result.name) {
            Some(tool_id) => Some(StreamFrame::ToolCallEnd {
                tool_id,
                tool_name: result.name.clone(),
                result: truncate_with_marker(&result.output, self.tool_result_max_chars),
                success: result.success,
            }),
            None => {
                // Results carry no invocation id upstream; with nothing
                // pending under this name the result is dropped.
                debug!(
                    session_id = %self.session_id,
                    tool = %result.name,
                    "dropping tool result with no pending invocation"
                );
                None
            }
        }
    }

    /// Flush open phases at end of stream and finish the turn. Terminal.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if self.thinking_open {
            self.thinking_open = false;
            frames.push(StreamFrame::ThinkingEnd);
        }
        if self.response_started && !self.response_ended {
            self.response_ended = true;
            frames.push(StreamFrame::ResponseEnd);
        }
        self.phase = StreamPhase::Complete;
        frames.push(StreamFrame::Complete);
        frames
    }

    /// Record an unrecoverable fault and build its `error` frame. Terminal.
    pub fn fail(&mut self, message: &str, code: &str) -> StreamFrame {
        self.phase = StreamPhase::Error;
        StreamFrame::Error {
            message: message.to_string(),
            code: code.to_string(),
        }
    }
}
