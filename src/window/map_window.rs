// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The default, balanced `Window` implementation: a plain hash map swept in full on
//! every `take_timeout` call. Appropriate when `capacity` is small enough that an O(W)
//! sweep every `window_scan_interval` is cheap.

use std::collections::HashMap;

use super::Window;
use crate::request::Request;
use crate::utils::now_unix;

pub struct MapWindow<T> {
    entries: HashMap<u32, Request<T>>,
    capacity: usize,
    wait_secs: i64,
}

impl<T> MapWindow<T> {
    pub fn new(capacity: usize, wait_secs: i64) -> Self {
        MapWindow {
            entries: HashMap::with_capacity(capacity),
            capacity,
            wait_secs,
        }
    }
}

impl<T: Send> Window<T> for MapWindow<T> {
    fn put(&mut self, request: Request<T>) -> Result<(), Request<T>> {
        if self.full() {
            return Err(request);
        }
        self.entries.insert(request.pdu.sequence_number, request);
        Ok(())
    }

    fn take(&mut self, seq: u32) -> Option<Request<T>> {
        self.entries.remove(&seq)
    }

    fn take_timeout(&mut self) -> Vec<Request<T>> {
        let now = now_unix();
        let wait = self.wait_secs;
        let expired: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, req)| now - req.submit_at > wait)
            .map(|(seq, _)| *seq)
            .collect();

        expired
            .into_iter()
            .filter_map(|seq| self.entries.remove(&seq))
            .collect()
    }

    fn full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
