//! HTTP chat server with SSE streaming
//!
//! Request flow: admission first (429 before any session or agent work),
//! then session resolution, then a dedicated task that drains the agent's
//! event stream through the translator and forwards frames to the client.
//! The task owns its translator outright; the only state shared between
//! requests is the rate limiter and the session registry.

use crate::agent::ChatAgent;
use crate::config::ColloquyConfig;
use crate::error::Result;
use crate::ratelimit::{RateLimitStats, RateLimiter};
use crate::session::SessionRegistry;
use crate::stream::frame::StreamFrame;
use crate::stream::phase::{StreamTranslator, CODE_PROCESSING_ERROR, CODE_STREAM_ERROR};
use crate::utils::text::truncate_chars;
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

/// Shared state injected into request handlers
#[derive(Clone)]
struct AppState {
    agent: Arc<dyn ChatAgent>,
    sessions: Arc<SessionRegistry>,
    limiter: Arc<RateLimiter>,
    config: Arc<ColloquyConfig>,
    instance_id: String,
}

type FrameSender = mpsc::Sender<std::result::Result<SseEvent, Infallible>>;

/// Chat API server
pub struct ChatServer {
    config: ColloquyConfig,
    agent: Arc<dyn ChatAgent>,
    sessions: Arc<SessionRegistry>,
    limiter: Arc<RateLimiter>,
    instance_id: String,
}

impl ChatServer {
    pub fn new(config: ColloquyConfig, agent: Arc<dyn ChatAgent>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        let sessions = Arc::new(SessionRegistry::new());
        let instance_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        Self {
            config,
            agent,
            sessions,
            limiter,
            instance_id,
        }
    }

    /// Session registry handle, shared with the running server.
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let state = AppState {
            agent: self.agent.clone(),
            sessions: self.sessions.clone(),
            limiter: self.limiter.clone(),
            config: Arc::new(self.config.clone()),
            instance_id: self.instance_id.clone(),
        };

        Router::new()
            .route("/chat/stream", get(stream_chat_get).post(stream_chat_post))
            .route("/chat/session/:session_id", delete(delete_session_handler))
            .route("/chat/ratelimit", get(ratelimit_stats_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self.config.server.addr.parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener (used by tests for ephemeral ports).
    pub async fn serve_on(self, listener: tokio::net::TcpListener) -> Result<()> {
        info!(
            "Chat server [{}] listening on http://{}",
            self.instance_id,
            listener.local_addr()?
        );
        let router = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, router).await?;
        Ok(())
    }
}

/// Chat request parameters, shared by query string and JSON body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatParams {
    message: Option<String>,
    session_id: Option<String>,
}

async fn stream_chat_get(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<ChatParams>,
) -> Response {
    stream_chat(state, peer, headers, params).await
}

async fn stream_chat_post(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(params): Json<ChatParams>,
) -> Response {
    stream_chat(state, peer, headers, params).await
}

async fn stream_chat(
    state: AppState,
    peer: SocketAddr,
    headers: HeaderMap,
    params: ChatParams,
) -> Response {
    // Admission happens before any session lookup or agent work.
    let client = client_key(&headers, peer);
    if !state.limiter.allow(&client) {
        warn!(client = %client, "rate limit exceeded");
        return rate_limited_response();
    }

    let message = match params.message {
        Some(message) if !message.is_empty() => message,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "message is required"})),
            )
                .into_response()
        }
    };
    let message = clamp_message(&message, state.config.stream.message_max_chars);
    let session_id = SessionRegistry::resolve_id(params.session_id);

    let (tx, rx) = mpsc::channel(state.config.server.channel_capacity);
    tokio::spawn(run_turn(state.clone(), session_id, message, tx));

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Bound one streaming request by the configured wall-clock timeout.
async fn run_turn(state: AppState, session_id: String, message: String, tx: FrameSender) {
    let timeout = state.config.stream.timeout();
    if tokio::time::timeout(timeout, drive_turn(&state, &session_id, &message, &tx))
        .await
        .is_err()
    {
        warn!(session_id = %session_id, "stream timed out; closing transport");
    }
}

/// Drain the agent event stream and forward translated frames.
///
/// Returns early when the client transport goes away; upstream work is not
/// cancelled or rolled back.
async fn drive_turn(state: &AppState, session_id: &str, message: &str, tx: &FrameSender) {
    let mut translator =
        StreamTranslator::new(session_id, state.config.stream.tool_result_max_chars);

    let start = StreamFrame::SessionStart {
        session_id: session_id.to_string(),
    };
    if send_frame(tx, &start).await.is_err() {
        return;
    }

    let mut events = match open_turn(state, session_id, message).await {
        Ok(events) => events,
        Err(e) => {
            error!(session_id, error = %e, "failed to start agent turn");
            let frame = translator.fail(&e.to_string(), CODE_PROCESSING_ERROR);
            let _ = send_frame(tx, &frame).await;
            return;
        }
    };

    while let Some(item) = events.recv().await {
        match item {
            Ok(event) => match translator.handle(&event) {
                Ok(frames) => {
                    for frame in frames {
                        if send_frame(tx, &frame).await.is_err() {
                            debug!(session_id, "client disconnected; abandoning stream");
                            return;
                        }
                    }
                }
                Err(e) => {
                    // One malformed event must not abort a healthy stream.
                    warn!(
                        session_id,
                        phase = ?translator.phase(),
                        error = %e,
                        "event translation failed"
                    );
                    let frame = StreamFrame::Error {
                        message: e.to_string(),
                        code: CODE_STREAM_ERROR.to_string(),
                    };
                    if send_frame(tx, &frame).await.is_err() {
                        return;
                    }
                }
            },
            Err(e) => {
                error!(
                    session_id,
                    phase = ?translator.phase(),
                    error = %e,
                    "upstream event source failed"
                );
                let frame = translator.fail(&e.to_string(), CODE_PROCESSING_ERROR);
                let _ = send_frame(tx, &frame).await;
                return;
            }
        }
    }

    for frame in translator.finish() {
        if send_frame(tx, &frame).await.is_err() {
            return;
        }
    }
}

async fn open_turn(
    state: &AppState,
    session_id: &str,
    message: &str,
) -> Result<crate::agent::AgentEventStream> {
    state.sessions.ensure(state.agent.as_ref(), session_id).await?;
    state.agent.stream_turn(session_id, message).await
}

async fn send_frame(tx: &FrameSender, frame: &StreamFrame) -> std::result::Result<(), ()> {
    let data = match serde_json::to_string(frame) {
        Ok(data) => data,
        Err(e) => {
            error!(error = %e, frame = frame.name(), "failed to serialize frame; skipping");
            return Ok(());
        }
    };
    tx.send(Ok(SseEvent::default().event(frame.name()).data(data)))
        .await
        .map_err(|_| ())
}

/// Enforce the inbound message cap, logging when anything was cut.
fn clamp_message(message: &str, max_chars: usize) -> String {
    let chars = message.chars().count();
    if chars > max_chars {
        warn!("message truncated from {} to {} characters", chars, max_chars);
    }
    truncate_chars(message, max_chars)
}

/// Client key for admission: first X-Forwarded-For entry, then X-Real-IP,
/// then the socket peer address.
fn client_key(headers: &HeaderMap, peer: SocketAddr) -> String {
    for header in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(header).and_then(|value| value.to_str().ok()) {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    peer.ip().to_string()
}

fn rate_limited_response() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": "Rate limit exceeded",
            "message": "Too many requests. Please try again later."
        })),
    )
        .into_response()
}

async fn delete_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let deleted = state
        .sessions
        .remove(state.agent.as_ref(), &session_id)
        .await;
    (
        StatusCode::OK,
        Json(json!({"deleted": deleted, "session_id": session_id})),
    )
        .into_response()
}

async fn ratelimit_stats_handler(State(state): State<AppState>) -> Json<RateLimitStats> {
    Json(state.limiter.stats())
}

/// Health check handler
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    instance_id: String,
    active_sessions: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id: state.instance_id.clone(),
        active_sessions: state.sessions.len().await,
    })
}
