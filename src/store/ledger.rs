//! Per-user ledgers: shares, favorites and notification inboxes
//!
//! Ledgers only ever grow. Each user's entry lives in its own `DashMap`
//! shard so writers for different users do not contend.

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Sequence and resource ids recorded for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemSet {
    pub sequences: BTreeSet<u64>,
    pub resources: BTreeSet<String>,
}

/// username -> set of sequence and resource ids
#[derive(Debug, Default)]
pub struct Ledger {
    entries: DashMap<String, ItemSet>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sequence id for `user`, returning the updated set
    pub fn add_sequence(&self, user: &str, id: u64) -> ItemSet {
        let mut entry = self.entries.entry(user.to_string()).or_default();
        entry.sequences.insert(id);
        entry.value().clone()
    }

    /// Record a resource id for `user`, returning the updated set
    pub fn add_resource(&self, user: &str, id: &str) -> ItemSet {
        let mut entry = self.entries.entry(user.to_string()).or_default();
        entry.resources.insert(id.to_string());
        entry.value().clone()
    }

    /// Everything recorded for `user`; empty sets for an unknown user
    pub fn get(&self, user: &str) -> ItemSet {
        self.entries
            .get(user)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn user_count(&self) -> usize {
        self.entries.len()
    }
}

/// username -> ordered notification payloads
#[derive(Debug, Default)]
pub struct Inbox {
    entries: DashMap<String, Vec<Value>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload and return the user's full list
    pub fn push(&self, user: &str, payload: Value) -> Vec<Value> {
        let mut entry = self.entries.entry(user.to_string()).or_default();
        entry.push(payload);
        entry.value().clone()
    }

    pub fn list(&self, user: &str) -> Vec<Value> {
        self.entries
            .get(user)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}
