// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Named registry of `SessionGroup`s plus a periodic adjust ticker.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::session_group::SessionGroup;
use crate::cfg::config::{SessionGroupConfig, SessionGroupManagerConfig};

struct Inner<T> {
    groups: HashMap<String, Arc<SessionGroup<T>>>,
    adjust: HashMap<String, Arc<SessionGroup<T>>>,
}

pub struct SessionGroupManager<T> {
    config: SessionGroupManagerConfig,
    inner: RwLock<Inner<T>>,
}

impl<T: Send + Sync + 'static> SessionGroupManager<T> {
    pub fn new(config: SessionGroupManagerConfig) -> Arc<Self> {
        let manager = Arc::new(SessionGroupManager {
            config,
            inner: RwLock::new(Inner {
                groups: HashMap::new(),
                adjust: HashMap::new(),
            }),
        });
        manager.clone().spawn_adjust_ticker();
        manager
    }

    fn spawn_adjust_ticker(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.adjust_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let groups: Vec<_> = self.inner.read().await.adjust.values().cloned().collect();
                for group in groups {
                    group.adjust().await;
                }
            }
        });
    }

    pub async fn register(&self, config: SessionGroupConfig<T>) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        if inner.groups.contains_key(&config.group_id) {
            anyhow::bail!("group {} already exists", config.group_id);
        }

        let auto_fill = config.auto_fill;
        let group_id = config.group_id.clone();
        let group = SessionGroup::new(config);
        group.adjust().await;

        inner.groups.insert(group_id.clone(), group.clone());
        if auto_fill {
            inner.adjust.insert(group_id, group);
        }

        Ok(())
    }

    pub async fn unregister(&self, group_id: &str) {
        let group = {
            let mut inner = self.inner.write().await;
            inner.adjust.remove(group_id);
            inner.groups.remove(group_id)
        };

        if let Some(group) = group {
            info!(group = group_id, "unregister session group");
            group.destroy().await;
        }
    }

    pub async fn get(&self, group_id: &str) -> Option<Arc<SessionGroup<T>>> {
        self.inner.read().await.groups.get(group_id).cloned()
    }
}
