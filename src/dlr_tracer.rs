// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Out-of-band correlation index mapping submitted message ids to their awaited
//! delivery receipts, with earliest-deadline-first expiry.
//!
//! Dual-structure design mirroring the sliding window's `QueueWindow`: a map for O(1)
//! lookup and a min-heap (ordered by `expired_at`) for O(log N) eviction. A node is
//! "taken" the instant it leaves the map; the heap entry for it lingers as a tombstone
//! until `take_timeout` walks past it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::SmppError;
use crate::utils::now_unix;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlrNode {
    pub message_id: String,
    pub system_id: String,
    pub session_id: Option<String>,
    pub expired_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeapEntry {
    expired_at: i64,
    message_id: String,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so a `BinaryHeap` (max-heap by default) behaves as a min-heap on
        // `expired_at`.
        other.expired_at.cmp(&self.expired_at)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Inner {
    data: HashMap<String, DlrNode>,
    heap: BinaryHeap<HeapEntry>,
}

/// Guarded by a single mutex; every operation is cheap enough (O(1) amortized, O(log N)
/// worst case) that there is no benefit to finer-grained locking.
pub struct DlrTracer {
    inner: Mutex<Inner>,
}

impl Default for DlrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl DlrTracer {
    pub fn new() -> Self {
        DlrTracer {
            inner: Mutex::new(Inner {
                data: HashMap::new(),
                heap: BinaryHeap::new(),
            }),
        }
    }

    /// Insert a node. No deduplication: a second `put` for the same `message_id`
    /// overwrites the map slot; the earlier heap entry becomes an unreachable
    /// tombstone once its `message_id` no longer resolves to it in the map.
    pub async fn put(&self, node: DlrNode) {
        let mut inner = self.inner.lock().await;
        inner.heap.push(HeapEntry {
            expired_at: node.expired_at,
            message_id: node.message_id.clone(),
        });
        inner.data.insert(node.message_id.clone(), node);
    }

    pub async fn take(&self, message_id: &str) -> Option<DlrNode> {
        let mut inner = self.inner.lock().await;
        inner.data.remove(message_id)
    }

    /// Harvest every node whose `expired_at` has strictly elapsed, in ascending expiry
    /// order. Stops as soon as it finds a live node that has not expired yet.
    pub async fn take_timeout(&self) -> Vec<DlrNode> {
        let mut inner = self.inner.lock().await;
        let now = now_unix();
        let mut harvested = Vec::new();
        loop {
            let Some(top) = inner.heap.peek() else {
                break;
            };
            let still_tracked = inner.data.contains_key(&top.message_id);
            if !still_tracked {
                inner.heap.pop();
                continue;
            }
            if now < top.expired_at {
                break;
            }
            let entry = inner.heap.pop().expect("peeked Some above");
            if let Some(node) = inner.data.remove(&entry.message_id) {
                harvested.push(node);
            }
        }
        harvested
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.data.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Atomically write `DlrTracer.data` (the map) and `DlrTracer.heap` (the heap) into
    /// `dir`. The on-disk format is an opaque `serde_json` container; only the
    /// save/load round trip is a contract, not the byte layout.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<(), SmppError> {
        let dir = dir.as_ref();
        let inner = self.inner.lock().await;
        let nodes: Vec<&DlrNode> = inner.data.values().collect();
        let heap_keys: Vec<(i64, String)> = inner
            .heap
            .iter()
            .map(|e| (e.expired_at, e.message_id.clone()))
            .collect();

        let data_json = serde_json::to_vec(&nodes).map_err(|_| SmppError::InvalidDlrFormat)?;
        let heap_json = serde_json::to_vec(&heap_keys).map_err(|_| SmppError::InvalidDlrFormat)?;

        write_atomic(&dir.join("DlrTracer.data"), &data_json).await?;
        write_atomic(&dir.join("DlrTracer.heap"), &heap_json).await?;
        Ok(())
    }

    /// Restore from `dir`. The heap is reconstructed from the loaded map rather than
    /// from the persisted heap file — the two are always consistent for a tracer that
    /// only ever mutates through `put`/`take`/`take_timeout`, so the heap file is kept
    /// on disk for the contract but not read back.
    pub async fn load(&self, dir: impl AsRef<Path>) -> Result<(), SmppError> {
        let path = dir.as_ref().join("DlrTracer.data");
        let bytes = tokio::fs::read(&path).await?;
        let nodes: Vec<DlrNode> = serde_json::from_slice(&bytes).map_err(|_| SmppError::InvalidDlrFormat)?;

        let mut inner = self.inner.lock().await;
        inner.data.clear();
        inner.heap.clear();
        for node in nodes {
            inner.heap.push(HeapEntry {
                expired_at: node.expired_at,
                message_id: node.message_id.clone(),
            });
            inner.data.insert(node.message_id.clone(), node);
        }
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SmppError> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
