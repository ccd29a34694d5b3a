// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `Window` variant for large pools or short TTLs: a hash map plus a FIFO queue of
//! sequence numbers in submit order.
//!
//! Requests are submitted and expire in the same order, so the queue head is a
//! near-optimal eviction frontier. `take(seq)` only has to remove from the map — the
//! matching queue slot becomes a tombstone (absence from the map) that `take_timeout`
//! skips over when it eventually reaches the head, rather than being nulled in place.
//! The raw queue is capped at `2 * capacity` to bound tombstone accumulation: a `put`
//! that would exceed the cap forces a synchronous compaction of the whole queue first.

use std::collections::{HashMap, VecDeque};

use super::Window;
use crate::request::Request;
use crate::utils::now_unix;

pub struct QueueWindow<T> {
    entries: HashMap<u32, Request<T>>,
    queue: VecDeque<u32>,
    capacity: usize,
    wait_secs: i64,
}

impl<T> QueueWindow<T> {
    pub fn new(capacity: usize, wait_secs: i64) -> Self {
        QueueWindow {
            entries: HashMap::with_capacity(capacity),
            queue: VecDeque::with_capacity(capacity * 2),
            capacity,
            wait_secs,
        }
    }

    /// A tombstone left by an out-of-order `take()` can land anywhere in the queue, not
    /// just at the front — popping only a leading run would let the raw queue grow past
    /// `2 * capacity` indefinitely under adversarial take patterns. This compacts the
    /// whole queue down to just the still-outstanding sequence numbers, preserving their
    /// relative (submission) order so `take_timeout`'s front-to-back walk stays valid.
    fn purge_tombstones(&mut self) {
        let entries = &self.entries;
        self.queue.retain(|seq| entries.contains_key(seq));
    }
}

impl<T: Send> Window<T> for QueueWindow<T> {
    fn put(&mut self, request: Request<T>) -> Result<(), Request<T>> {
        if self.full() {
            return Err(request);
        }
        if self.queue.len() >= self.capacity * 2 {
            self.purge_tombstones();
        }
        let seq = request.pdu.sequence_number;
        self.entries.insert(seq, request);
        self.queue.push_back(seq);
        Ok(())
    }

    fn take(&mut self, seq: u32) -> Option<Request<T>> {
        self.entries.remove(&seq)
    }

    fn take_timeout(&mut self) -> Vec<Request<T>> {
        let now = now_unix();
        let mut expired = Vec::new();
        loop {
            let Some(&seq) = self.queue.front() else {
                break;
            };
            match self.entries.get(&seq) {
                None => {
                    self.queue.pop_front();
                }
                Some(req) => {
                    if now - req.submit_at > self.wait_secs {
                        self.queue.pop_front();
                        if let Some(r) = self.entries.remove(&seq) {
                            expired.push(r);
                        }
                    } else {
                        break;
                    }
                }
            }
        }
        expired
    }

    fn full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::Pdu;
    use crate::request::Submitter;

    fn req(seq: u32, submit_at: i64) -> Request<()> {
        let mut r = Request::new(
            Pdu::enquire_link(seq),
            (),
            "sess1".into(),
            "sys1".into(),
            Submitter::User,
        );
        r.submit_at = submit_at;
        r
    }

    #[test]
    fn take_then_sweep_skips_tombstone() {
        let mut w: QueueWindow<()> = QueueWindow::new(4, 10);
        let now = now_unix();
        w.put(req(1, now - 20)).expect("put succeeds");
        w.put(req(2, now - 20)).expect("put succeeds");
        w.take(1);
        let expired = w.take_timeout();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].pdu.sequence_number, 2);
        assert!(w.is_empty());
    }

    #[test]
    fn sweep_stops_at_first_live_entry() {
        let mut w: QueueWindow<()> = QueueWindow::new(4, 10);
        let now = now_unix();
        w.put(req(1, now - 20)).expect("put succeeds");
        w.put(req(2, now)).expect("put succeeds");
        let expired = w.take_timeout();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].pdu.sequence_number, 1);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn put_rejects_when_full() {
        let mut w: QueueWindow<()> = QueueWindow::new(1, 60);
        w.put(req(1, now_unix())).expect("put succeeds");
        let rejected = w.put(req(2, now_unix())).err().expect("second put should be rejected");
        assert_eq!(rejected.pdu.sequence_number, 2);
    }

    #[test]
    fn put_compacts_interior_tombstones_left_by_out_of_order_take() {
        let mut w: QueueWindow<()> = QueueWindow::new(2, 60);
        let now = now_unix();
        w.put(req(1, now)).expect("put succeeds");
        w.put(req(2, now)).expect("put succeeds");
        w.take(2);
        w.put(req(3, now)).expect("put succeeds");
        w.take(3);
        w.put(req(4, now)).expect("put succeeds");
        w.take(4);
        assert_eq!(w.queue.len(), 4, "queue still holds 3 tombstones plus the live entry 1");

        // Crosses the `2 * capacity` threshold with the front (seq 1) still live, so a
        // leading-only purge would free nothing; it must compact the whole queue.
        w.put(req(5, now)).expect("put succeeds");
        assert_eq!(w.queue.len(), 2, "compaction should drop every tombstone, not just a leading run");
        assert_eq!(w.len(), 2);
    }
}
