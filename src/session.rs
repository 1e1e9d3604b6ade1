//! Session registry mapping client session ids to agent-held conversations
//!
//! The registry owns only the lookup keys; conversation state lives in the
//! agent collaborator. Sessions are created on first use, read many times,
//! and removed only by explicit delete or process shutdown. There is no TTL
//! eviction; long-lived processes accumulate idle entries, a known
//! limitation of this design.

use crate::agent::ChatAgent;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Registry-side view of one session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Concurrent map of known sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the client-supplied id, or mint `"session-" + unix_millis`.
    pub fn resolve_id(supplied: Option<String>) -> String {
        match supplied {
            Some(id) if !id.is_empty() => id,
            _ => format!("session-{}", Utc::now().timestamp_millis()),
        }
    }

    /// Create-if-absent. The write lock is held across the collaborator
    /// call, so two near-simultaneous requests for a new id cannot create
    /// divergent conversation state.
    pub async fn ensure(&self, agent: &dyn ChatAgent, id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(id) {
            agent.open_session(id).await?;
            sessions.insert(
                id.to_string(),
                SessionEntry {
                    id: id.to_string(),
                    created_at: Utc::now(),
                },
            );
            debug!(session_id = id, "session created");
        }
        Ok(())
    }

    /// Remove a session. Idempotent; unknown ids are a no-op returning
    /// `false`. A collaborator failure while dropping its state is logged
    /// but does not fail the delete, since the registry entry is gone.
    pub async fn remove(&self, agent: &dyn ChatAgent, id: &str) -> bool {
        let existed = self.sessions.write().await.remove(id).is_some();
        if existed {
            if let Err(e) = agent.close_session(id).await {
                warn!(session_id = id, error = %e, "agent failed to drop session state");
            }
            debug!(session_id = id, "session removed");
        }
        existed
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ScriptedAgent;

    #[test]
    fn test_resolve_id_prefers_supplied() {
        assert_eq!(
            SessionRegistry::resolve_id(Some("abc".to_string())),
            "abc"
        );
    }

    #[test]
    fn test_resolve_id_generates_when_absent() {
        let id = SessionRegistry::resolve_id(None);
        assert!(id.starts_with("session-"));
        let id = SessionRegistry::resolve_id(Some(String::new()));
        assert!(id.starts_with("session-"));
    }

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let registry = SessionRegistry::new();
        let agent = ScriptedAgent::new(vec![]);

        registry.ensure(&agent, "s1").await.unwrap();
        registry.ensure(&agent, "s1").await.unwrap();

        assert!(registry.contains("s1").await);
        assert_eq!(registry.len().await, 1);
        // The collaborator saw exactly one open call
        assert_eq!(agent.opened_sessions(), vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let agent = ScriptedAgent::new(vec![]);

        // Deleting a never-created id succeeds quietly
        assert!(!registry.remove(&agent, "ghost").await);

        registry.ensure(&agent, "s1").await.unwrap();
        assert!(registry.remove(&agent, "s1").await);
        assert!(!registry.remove(&agent, "s1").await);
        assert!(registry.is_empty().await);

        // The collaborator was told to drop state exactly once
        assert_eq!(agent.closed_sessions(), vec!["s1".to_string()]);
    }
}
