//! One-shot computation guard
//!
//! Records the sessions whose metrics were already computed so a replayed
//! invocation skips straight to its terminal step. The set can be saved and
//! restored as JSON to survive a process restart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Idempotency tokens keyed by session id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedSessions {
    sessions: BTreeSet<String>,
}

impl ComputedSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether metrics were already computed for the session
    pub fn is_computed(&self, session_id: &str) -> bool {
        self.sessions.contains(session_id)
    }

    /// Record an attempt for the session; returns `false` if it was already set
    pub fn mark_computed(&mut self, session_id: &str) -> bool {
        self.sessions.insert(session_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    /// Serialize to JSON for persistence
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
