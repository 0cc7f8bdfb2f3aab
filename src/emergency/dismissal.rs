use std::collections::HashSet;

/// Session-scoped record of fall events the user hid, plus the events the
/// alert cue already played for. The two sets are independent; neither is
/// persisted or evicted.
#[derive(Debug, Default, Clone)]
pub struct DismissalStore {
    dismissed: HashSet<String>,
    alerted: HashSet<String>,
}

impl DismissalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide the alert for this fall timestamp. Returns false if it was already hidden.
    pub fn dismiss(&mut self, timestamp: &str) -> bool {
        self.dismissed.insert(timestamp.to_string())
    }

    pub fn has_dismissed(&self, timestamp: &str) -> bool {
        self.dismissed.contains(timestamp)
    }

    pub fn already_alerted(&self, timestamp: &str) -> bool {
        self.alerted.contains(timestamp)
    }

    /// Record that the alert cue played for this fall. Returns false if it already had.
    pub fn mark_alerted(&mut self, timestamp: &str) -> bool {
        self.alerted.insert(timestamp.to_string())
    }
}
