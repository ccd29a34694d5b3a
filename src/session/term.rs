// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-dial mutable state: everything that is torn down and rebuilt on every
//! `dial()`/redial, as opposed to the identity/config fields that outlive a redial.

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::request::Request;
use crate::window::Window;

/// Born on a successful `dial()`, dropped once `close()` finishes tearing the workers
/// down. The original's `sync.WaitGroup` becomes a plain `Vec<JoinHandle<()>>` that
/// `close()` drains and awaits.
pub struct SessionTerm<T> {
    pub cancel: CancellationToken,
    pub window: Mutex<Box<dyn Window<T>>>,
    pub tr_tx: mpsc::Sender<Request<T>>,
    pub handles: Mutex<Vec<JoinHandle<()>>>,
    pub dial_at: i64,
}
