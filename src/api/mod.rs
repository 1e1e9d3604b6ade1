//! HTTP API surface

pub mod server;

pub use server::ChatServer;
