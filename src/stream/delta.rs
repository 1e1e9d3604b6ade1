//! Incremental text deltas over cumulative or restarted snapshots
//!
//! Upstream text events carry snapshots. Usually each snapshot extends the
//! previous one; occasionally the stream restarts with unrelated text. The
//! tracker guarantees that the concatenation of everything it returns always
//! equals the latest snapshot's new content, so clients can append deltas
//! blindly.

/// Accumulates emitted text for one phase and diffs new snapshots against it.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    emitted: String,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `snapshot` against what was already emitted and absorb it.
    ///
    /// Returns the delta to emit, which may be empty; callers must not emit
    /// empty deltas as frames.
    pub fn push(&mut self, snapshot: &str) -> String {
        if snapshot.is_empty() {
            return String::new();
        }

        if self.emitted.is_empty() {
            self.emitted.push_str(snapshot);
            return snapshot.to_string();
        }

        // Cumulative chunk: the common upstream behavior
        if let Some(suffix) = snapshot.strip_prefix(self.emitted.as_str()) {
            let delta = suffix.to_string();
            self.emitted.push_str(&delta);
            return delta;
        }

        // Non-cumulative or restarted snapshot: emit past the common prefix
        // and resynchronize the accumulator to the snapshot in full.
        let common_bytes: usize = self
            .emitted
            .chars()
            .zip(snapshot.chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        let delta = snapshot[common_bytes..].to_string();
        self.emitted.clear();
        self.emitted.push_str(snapshot);
        delta
    }

    /// Text emitted so far for this phase.
    pub fn emitted(&self) -> &str {
        &self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_snapshot_is_whole_delta() {
        let mut tracker = DeltaTracker::new();
        assert_eq!(tracker.push("Hi"), "Hi");
        assert_eq!(tracker.emitted(), "Hi");
    }

    #[test]
    fn test_cumulative_extension_yields_suffix() {
        let mut tracker = DeltaTracker::new();
        assert_eq!(tracker.push("Hi"), "Hi");
        assert_eq!(tracker.push("Hi there"), " there");
        assert_eq!(tracker.emitted(), "Hi there");
    }

    #[test]
    fn test_restart_with_no_common_prefix() {
        let mut tracker = DeltaTracker::new();
        assert_eq!(tracker.push("Hi"), "Hi");
        assert_eq!(tracker.push("Hi there"), " there");
        assert_eq!(tracker.push("Bye"), "Bye");
        assert_eq!(tracker.emitted(), "Bye");
    }

    #[test]
    fn test_restart_with_partial_common_prefix() {
        let mut tracker = DeltaTracker::new();
        assert_eq!(tracker.push("Hello world"), "Hello world");
        // Shares "Hello " then diverges
        assert_eq!(tracker.push("Hello moon"), "moon");
        assert_eq!(tracker.emitted(), "Hello moon");
    }

    #[test]
    fn test_identical_snapshot_yields_empty_delta() {
        let mut tracker = DeltaTracker::new();
        assert_eq!(tracker.push("same"), "same");
        assert_eq!(tracker.push("same"), "");
        assert_eq!(tracker.emitted(), "same");
    }

    #[test]
    fn test_empty_snapshot_is_ignored() {
        let mut tracker = DeltaTracker::new();
        assert_eq!(tracker.push(""), "");
        assert_eq!(tracker.push("text"), "text");
        assert_eq!(tracker.push(""), "");
        assert_eq!(tracker.emitted(), "text");
    }

    #[test]
    fn test_multibyte_common_prefix() {
        let mut tracker = DeltaTracker::new();
        tracker.push("héllo a");
        // Common prefix "héllo " ends inside multi-byte territory
        assert_eq!(tracker.push("héllo b"), "b");
        assert_eq!(tracker.emitted(), "héllo b");
    }

    proptest! {
        /// Concatenated deltas over cumulative snapshots equal the final snapshot.
        #[test]
        fn prop_cumulative_concatenation(chunks in proptest::collection::vec(".{0,16}", 1..8)) {
            let mut tracker = DeltaTracker::new();
            let mut snapshot = String::new();
            let mut concatenated = String::new();
            for chunk in &chunks {
                snapshot.push_str(chunk);
                concatenated.push_str(&tracker.push(&snapshot));
            }
            prop_assert_eq!(concatenated, snapshot);
        }

        /// After any snapshot sequence the accumulator matches the last
        /// non-empty snapshot.
        #[test]
        fn prop_accumulator_tracks_last_snapshot(snapshots in proptest::collection::vec(".{1,16}", 1..8)) {
            let mut tracker = DeltaTracker::new();
            for snapshot in &snapshots {
                tracker.push(snapshot);
            }
            prop_assert_eq!(tracker.emitted(), snapshots.last().unwrap().as_str());
        }
    }
}
