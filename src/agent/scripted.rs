//! Scripted playback agent for tests
//!
//! Replays a fixed event sequence for every turn, optionally failing the
//! stream afterwards to exercise upstream-source error handling. Records
//! the session lifecycle calls and turn messages it receives so tests can
//! assert on them.

use super::{AgentEvent, AgentEventStream, ChatAgent};
use crate::error::{ColloquyError, Result};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
pub struct ScriptedAgent {
    script: Vec<AgentEvent>,
    /// When set, an `Err` item with this message follows the script
    fail_with: Option<String>,
    opened: Mutex<Vec<String>>,
    closed: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<AgentEvent>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    /// A script that ends with an upstream source failure.
    pub fn failing(script: Vec<AgentEvent>, message: impl Into<String>) -> Self {
        Self {
            script,
            fail_with: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn opened_sessions(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn closed_sessions(&self) -> Vec<String> {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages received across all turns, in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChatAgent for ScriptedAgent {
    async fn open_session(&self, session_id: &str) -> Result<()> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session_id.to_string());
        Ok(())
    }

    async fn close_session(&self, session_id: &str) -> Result<()> {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session_id.to_string());
        Ok(())
    }

    async fn stream_turn(&self, _session_id: &str, message: &str) -> Result<AgentEventStream> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());

        let (tx, rx) = mpsc::channel(16);
        let script = self.script.clone();
        let fail_with = self.fail_with.clone();

        tokio::spawn(async move {
            for event in script {
                if tx.send(Ok(event)).await.is_err() {
                    return;
                }
            }
            if let Some(message) = fail_with {
                let _ = tx.send(Err(ColloquyError::Agent(message))).await;
            }
        });

        Ok(rx)
    }
}
