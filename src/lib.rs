//! Colloquy - Streamed Conversational Chat Server
//!
//! Serves model-generated conversational turns to browser clients over
//! long-lived SSE connections. Two subsystems carry the interesting
//! invariants:
//! - **Admission**: four sliding-window rate-limit scopes decide whether a
//!   turn may start, before any session or agent work happens
//! - **Stream translation**: a per-request phase state machine turns the
//!   agent's partially-ordered event sequence (text snapshots, tool calls,
//!   tool results, turn completion) into a phased wire protocol with
//!   incremental deltas and correlated tool frames
//!
//! # Architecture
//!
//! - **ratelimit**: sliding-window counters and the admission controller
//! - **stream**: delta computation, tool correlation, phase machine, frames
//! - **session**: session id registry backed by the agent collaborator
//! - **agent**: boundary types and trait for the external agent
//! - **api**: axum HTTP surface (SSE streaming, session delete, health)
//!
//! # Example
//!
//! ```ignore
//! use colloquy::{agent::EchoAgent, api::ChatServer, ColloquyConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ColloquyConfig::load(None)?;
//!     ChatServer::new(config, Arc::new(EchoAgent::new())).serve().await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod session;
pub mod stream;
pub mod utils;

// Re-export commonly used types
pub use agent::{AgentEvent, ChatAgent};
pub use api::ChatServer;
pub use config::ColloquyConfig;
pub use error::{ColloquyError, Result};
pub use ratelimit::{RateLimiter, SlidingWindowCounter};
pub use session::SessionRegistry;
pub use stream::{StreamFrame, StreamPhase, StreamTranslator};
