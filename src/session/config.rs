// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::session::{CloseReason, Session};
use crate::pdu::Pdu;
use crate::request::{Request, Response};
use crate::session_store::SessionStore;
use crate::window::Window;

/// `WindowType` in the original configuration surface: which `Window` implementation a
/// session builds by default (overridable per-session via `new_window_fn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindowKind {
    #[default]
    Map,
    Queue,
}

/// Backpressure policy the write worker applies when the window is full and the
/// outbound PDU expects a response. Mirrors the original's single signed-integer
/// `WindowBlock` knob: `0` no-block, `>0` sleep milliseconds, `<0` yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowBlock {
    NoBlock,
    Sleep(Duration),
    Yield,
}

impl WindowBlock {
    pub fn from_millis(v: i64) -> Self {
        match v.cmp(&0) {
            std::cmp::Ordering::Equal => WindowBlock::NoBlock,
            std::cmp::Ordering::Greater => WindowBlock::Sleep(Duration::from_millis(v as u64)),
            std::cmp::Ordering::Less => WindowBlock::Yield,
        }
    }
}

pub type NewWindowFn<T> = Arc<dyn Fn(&str) -> Box<dyn Window<T>> + Send + Sync>;
pub type OnDialedFn<T> = Arc<dyn Fn(&Session<T>, &T) + Send + Sync>;
pub type OnClosedFn<T> = Arc<dyn Fn(&Session<T>, CloseReason, &str, &T) + Send + Sync>;
pub type OnReceiveFn<T> = Arc<dyn Fn(&Session<T>, &Pdu, &T) -> Option<Pdu> + Send + Sync>;
pub type OnRequestFn<T> = Arc<dyn Fn(&Request<T>, &T) + Send + Sync>;
pub type OnRespondFn<T> = Arc<dyn Fn(&Response<T>, &T) + Send + Sync>;

/// Session-wide knobs plus the callbacks invoked out of the read/write/sweep workers.
/// `context` is the shared, arbitrary per-session value threaded to every callback (the
/// original's `CustomData any`, here typed as `T` — the same type parameter used for
/// each request's own `trace` value, so the crate needs only one generic parameter
/// instead of carrying both an `any`-typed context and an `any`-typed trace).
pub struct SessionConfig<T> {
    pub context: Arc<T>,
    /// `0` disables heartbeats.
    pub enquire_link_interval: Duration,
    /// `0` disables redial; a session closed with this at `0` terminates for good.
    pub attempt_dial_interval: Duration,
    pub window_kind: WindowKind,
    pub window_size: usize,
    pub window_wait: Duration,
    pub window_scan_interval: Duration,
    pub window_block: WindowBlock,
    pub new_window_fn: Option<NewWindowFn<T>>,
    /// When set, every successful dial registers the session here and every terminal
    /// close deregisters it (see `Session::dial`/`Session::close_with`).
    pub session_store: Option<Arc<SessionStore<T>>>,
    pub on_dialed: Option<OnDialedFn<T>>,
    pub on_closed: Option<OnClosedFn<T>>,
    pub on_receive: Option<OnReceiveFn<T>>,
    pub on_request: Option<OnRequestFn<T>>,
    pub on_respond: Option<OnRespondFn<T>>,
}

impl<T: Default> Default for SessionConfig<T> {
    fn default() -> Self {
        SessionConfig {
            context: Arc::new(T::default()),
            enquire_link_interval: Duration::ZERO,
            attempt_dial_interval: Duration::ZERO,
            window_kind: WindowKind::Map,
            window_size: 64,
            window_wait: Duration::from_secs(60),
            window_scan_interval: Duration::from_secs(60),
            window_block: WindowBlock::NoBlock,
            new_window_fn: None,
            session_store: None,
            on_dialed: None,
            on_closed: None,
            on_receive: None,
            on_request: None,
            on_respond: None,
        }
    }
}

impl<T: Send + 'static> SessionConfig<T> {
    pub fn build_window(&self, system_id: &str) -> Box<dyn Window<T>> {
        if let Some(f) = &self.new_window_fn {
            return f(system_id);
        }
        let wait_secs = self.window_wait.as_secs() as i64;
        match self.window_kind {
            WindowKind::Map => Box::new(crate::window::MapWindow::new(self.window_size, wait_secs)),
            WindowKind::Queue => Box::new(crate::window::QueueWindow::new(self.window_size, wait_secs)),
        }
    }
}
