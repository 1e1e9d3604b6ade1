//! Correlation of in-flight tool invocations with name-keyed results
//!
//! The upstream protocol reports tool results by name only, so when two
//! same-named invocations are pending, results pair with them in start
//! order. FIFO per name is a best-effort policy inherited from upstream,
//! not a guaranteed-correct pairing.

/// One tracked invocation for the current streaming request.
#[derive(Debug)]
struct PendingCall {
    id: String,
    name: String,
    completed: bool,
}

/// Tracks tool invocations for one streaming request.
///
/// Ids are `"tool_" + n` with n starting at 1, unique within the request.
/// Owned exclusively by the request's translator; no synchronization.
#[derive(Debug, Default)]
pub struct ToolCallTracker {
    next_id: u32,
    calls: Vec<PendingCall>,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending invocation and return its synthetic id.
    pub fn begin(&mut self, name: &str) -> String {
        self.next_id += 1;
        let id = format!("tool_{}", self.next_id);
        self.calls.push(PendingCall {
            id: id.clone(),
            name: name.to_string(),
            completed: false,
        });
        id
    }

    /// Complete the oldest pending invocation matching `name`.
    ///
    /// Returns its id, or None when nothing by that name is pending; the
    /// caller drops such results without emitting a frame.
    pub fn resolve(&mut self, name: &str) -> Option<String> {
        let call = self
            .calls
            .iter_mut()
            .find(|call| !call.completed && call.name == name)?;
        call.completed = true;
        Some(call.id.clone())
    }

    /// Number of invocations still awaiting a result.
    pub fn pending(&self) -> usize {
        self.calls.iter().filter(|call| !call.completed).count()
    }
}
