//! Stream translation: raw agent events in, phased wire frames out

pub mod delta;
pub mod frame;
pub mod phase;
pub mod tools;

pub use delta::DeltaTracker;
pub use frame::StreamFrame;
pub use phase::{StreamPhase, StreamTranslator};
pub use tools::ToolCallTracker;
