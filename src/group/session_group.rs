// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A bounded pool of sessions sharing a logical peer: auto-fill, round-robin pick,
//! and live resizing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cfg::config::SessionGroupConfig;
use crate::session::Session;

struct Inner<T> {
    sessions: HashMap<String, Arc<Session<T>>>,
    keys: Vec<String>,
    capacity: usize,
    destroyed: bool,
}

impl<T> Inner<T> {
    fn full(&self) -> bool {
        self.keys.len() >= self.capacity
    }

    fn empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn insert(&mut self, session: Arc<Session<T>>) {
        self.sessions.insert(session.id().to_string(), session);
        self.keys = self.sessions.keys().cloned().collect();
        self.keys.sort();
    }

    fn remove(&mut self, id: &str) -> Option<Arc<Session<T>>> {
        let removed = self.sessions.remove(id);
        if removed.is_some() {
            self.keys = self.sessions.keys().cloned().collect();
            self.keys.sort();
        }
        removed
    }
}

/// Pool of sessions behind one logical identity. `adjusting` is a CAS guard so
/// concurrent `adjust()` calls (the manager's ticker racing a `del`-triggered refill)
/// collapse onto a single in-flight pass instead of double-creating sessions.
pub struct SessionGroup<T> {
    config: SessionGroupConfig<T>,
    inner: RwLock<Inner<T>>,
    round: AtomicU64,
    adjusting: AtomicBool,
}

impl<T: Send + Sync + 'static> SessionGroup<T> {
    pub fn new(config: SessionGroupConfig<T>) -> Arc<Self> {
        let capacity = config.capacity;
        Arc::new(SessionGroup {
            config,
            inner: RwLock::new(Inner {
                sessions: HashMap::new(),
                keys: Vec::new(),
                capacity,
                destroyed: false,
            }),
            round: AtomicU64::new(0),
            adjusting: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.config.group_id
    }

    pub fn values(&self) -> &Arc<T> {
        &self.config.values
    }

    /// Round-robins over the current key snapshot; only takes a read lock.
    pub async fn round(&self) -> Option<Arc<Session<T>>> {
        let inner = self.inner.read().await;
        let n = inner.keys.len() as u64;
        if n == 0 {
            return None;
        }
        let i = self.round.fetch_add(1, Ordering::Relaxed).wrapping_add(1) & 0x7FFF_FFFF;
        let key = &inner.keys[(i % n) as usize];
        inner.sessions.get(key).cloned()
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Session<T>>> {
        self.inner.read().await.sessions.get(session_id).cloned()
    }

    pub async fn all(&self) -> Vec<Arc<Session<T>>> {
        self.inner.read().await.sessions.values().cloned().collect()
    }

    pub async fn add(self: &Arc<Self>, session: Arc<Session<T>>) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            anyhow::bail!("session group has been destroyed");
        }
        if inner.full() {
            anyhow::bail!("session group is full");
        }
        info!(group = self.id(), session = session.id(), "add session");
        inner.insert(session);
        Ok(())
    }

    pub async fn del(self: &Arc<Self>, session_id: &str) {
        let removed = {
            let mut inner = self.inner.write().await;
            if inner.destroyed {
                None
            } else {
                inner.remove(session_id)
            }
        };

        if let Some(session) = removed {
            info!(group = self.id(), session = session.id(), "del session");
            session.close();
            self.adjust().await;
        }
    }

    pub async fn set_capacity(self: &Arc<Self>, n: usize) {
        {
            let mut inner = self.inner.write().await;
            inner.capacity = n;
        }
        self.adjust().await;
    }

    /// `diff = capacity - current`: creates up to `diff` sessions when `auto_fill` is
    /// set, or evicts the oldest `|diff|` sessions. Single-flighted via `adjusting`.
    pub async fn adjust(self: &Arc<Self>) {
        if !self.config.auto_fill {
            return;
        }
        if self.inner.read().await.destroyed {
            return;
        }
        if self.adjusting.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return;
        }

        let diff = {
            let inner = self.inner.read().await;
            inner.capacity as i64 - inner.keys.len() as i64
        };

        for _ in 0..diff.max(0) {
            self.create().await;
        }
        for _ in diff.min(0)..0 {
            if let Some(session) = self.remove_oldest().await {
                session.close();
            }
        }

        self.adjusting.store(false, Ordering::SeqCst);
    }

    async fn create(self: &Arc<Self>) {
        {
            let inner = self.inner.read().await;
            if inner.full() || inner.destroyed {
                return;
            }
        }

        let session = match (self.config.create_fn)(self).await {
            Ok(session) => session,
            Err(err) => {
                if let Some(failed) = &self.config.failed_fn {
                    failed(self, &err);
                }
                warn!(group = self.id(), error = %err, "create session failed");
                return;
            }
        };

        let mut inner = self.inner.write().await;
        if inner.full() || inner.destroyed {
            drop(inner);
            session.close();
            return;
        }
        info!(group = self.id(), session = session.id(), "create session");
        inner.insert(session);
    }

    async fn remove_oldest(self: &Arc<Self>) -> Option<Arc<Session<T>>> {
        let mut inner = self.inner.write().await;
        if inner.empty() || inner.destroyed {
            return None;
        }
        let id = inner.keys[0].clone();
        inner.remove(&id)
    }

    /// Idempotent: a second `destroy()` call is a no-op.
    pub async fn destroy(self: &Arc<Self>) {
        let sessions = {
            let mut inner = self.inner.write().await;
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.keys.clear();
            inner.sessions.drain().map(|(_, s)| s).collect::<Vec<_>>()
        };

        info!(group = self.id(), "destroy");
        for session in sessions {
            session.close();
        }
    }
}
