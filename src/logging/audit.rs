//! Request audit trail
//!
//! Every inbound request leaves one entry here, including those the
//! maintenance gate turns away. The ring is bounded; once full, the oldest
//! entry is evicted. Each entry is also emitted as a `tracing` event so the
//! trail survives in the log stream after it falls off the ring.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

/// Default number of entries returned by [`AuditLog::recent`] callers
pub const DEFAULT_READ_LIMIT: usize = 100;

/// One inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique per request, echoed in the `X-Request-Id` response header
    pub request_id: String,
    /// RFC 3339 UTC timestamp
    pub time: String,
    pub path: String,
    pub method: String,
    /// Username from the bearer token, or "anonymous"
    pub user: String,
}

impl AuditEntry {
    pub fn new(path: impl Into<String>, method: impl Into<String>, user: impl Into<String>) -> Self {
        Self::at(Utc::now(), path, method, user)
    }

    pub fn at(
        time: DateTime<Utc>,
        path: impl Into<String>,
        method: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            time: time.to_rfc3339_opts(SecondsFormat::Millis, true),
            path: path.into(),
            method: method.into(),
            user: user.into(),
        }
    }
}

/// Bounded in-memory audit ring
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full
    pub fn record(&self, entry: AuditEntry) {
        info!(
            target: "genseqdid::audit",
            request_id = %entry.request_id,
            time = %entry.time,
            method = %entry.method,
            path = %entry.path,
            user = %entry.user,
            "request"
        );

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The `limit` most recent entries, oldest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
