// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Process-wide registry of live sessions, keyed by session id.
//!
//! A store is opt-in via `SessionConfig::session_store`: when set, `Session::dial`
//! registers here right after a successful dial and `Session::close_with` deregisters
//! at every terminal close, the way the original's `NewSession`/`close()` call
//! `onCreated`/`onClosed` to add/remove the session from its tracer.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::session::Session;

pub struct SessionStore<T> {
    sessions: RwLock<HashMap<String, Arc<Session<T>>>>,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> SessionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, session: Arc<Session<T>>) {
        self.sessions.write().await.insert(session.id().to_string(), session);
    }

    pub async fn del(&self, id: &str) -> Option<Arc<Session<T>>> {
        self.sessions.write().await.remove(id)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session<T>>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// A detached copy so iteration never holds the lock.
    pub async fn snapshot(&self) -> Vec<Arc<Session<T>>> {
        self.sessions.read().await.values().cloned().collect()
    }
}
