//! Collaborative chat sessions
//!
//! Sessions live only in memory. Membership grows monotonically and the
//! message log keeps posting order. Each session sits in its own `DashMap`
//! shard, so posting to one never blocks another.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::types::{EntityKind, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub user: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: u64,
    /// Members in join order, without duplicates
    pub users: Vec<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<u64, Session>,
    next_id: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a session with `creator` as its only member
    pub fn create(&self, creator: &str) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Session {
            id,
            users: vec![creator.to_string()],
            messages: Vec::new(),
        };
        self.sessions.insert(id, session.clone());
        debug!("Session {} opened by {}", id, creator);
        session
    }

    /// Add `user` to the session; joining twice is a no-op
    pub fn join(&self, id: u64, user: &str) -> Result<Session, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found(EntityKind::Session, id))?;
        if !session.users.iter().any(|u| u == user) {
            session.users.push(user.to_string());
        }
        Ok(session.value().clone())
    }

    /// Append a message from `user`
    pub fn post_message(&self, id: u64, user: &str, text: &str) -> Result<Session, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::BadRequest("Field 'message' is required".into()));
        }
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found(EntityKind::Session, id))?;
        session.messages.push(ChatMessage {
            user: user.to_string(),
            message: text.to_string(),
        });
        Ok(session.value().clone())
    }

    pub fn get(&self, id: u64) -> Result<Session, ServiceError> {
        self.sessions
            .get(&id)
            .map(|s| s.value().clone())
            .ok_or_else(|| ServiceError::not_found(EntityKind::Session, id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
