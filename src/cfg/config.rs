// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Configuration for connections and session groups. `SessionConfig` itself lives in
//! [`crate::session::config`] next to the engine it configures; this module re-exports
//! it so callers can `use smpp_session_rs::cfg::*` and reach every config in one place.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::dial::Dial;
use crate::connection::server::AuthenticateFn;
use crate::group::session_group::SessionGroup;
use crate::pdu::BindType;
use crate::session::session::Session;

pub use crate::connection::{ClientConnectionConfig, ServerConnectionConfig};
pub use crate::session::config::{
    NewWindowFn, OnClosedFn, OnDialedFn, OnReceiveFn, OnRequestFn, OnRespondFn, SessionConfig, WindowBlock,
    WindowKind,
};

type CreateFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<Arc<Session<T>>>> + Send>>;

/// Returns a future rather than blocking, unlike the original's synchronous
/// `func(*SessionGroup) (*Session, error)` — building a `Session` means dialing and
/// binding, which is inherently async here, so `adjust()` awaits this the same way
/// [`crate::connection::dial::Dial`] is awaited.
pub type CreateFn<T> = Arc<dyn Fn(&SessionGroup<T>) -> CreateFuture<T> + Send + Sync>;
pub type FailedFn<T> = Arc<dyn Fn(&SessionGroup<T>, &anyhow::Error) + Send + Sync>;

/// Pool configuration for a [`SessionGroup`](crate::group::session_group::SessionGroup).
pub struct SessionGroupConfig<T> {
    pub group_id: String,
    pub capacity: usize,
    pub auto_fill: bool,
    pub values: Arc<T>,
    pub create_fn: CreateFn<T>,
    pub failed_fn: Option<FailedFn<T>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionGroupManagerConfig {
    pub adjust_interval: Duration,
}

impl Default for SessionGroupManagerConfig {
    fn default() -> Self {
        SessionGroupManagerConfig {
            adjust_interval: Duration::from_secs(30),
        }
    }
}

/// Re-exported so callers building a [`ClientConnectionConfig`] reach for the same
/// dialer helpers the rest of the crate uses.
pub fn default_dial() -> Dial {
    crate::connection::dial::tcp_dial()
}

/// Convenience builder for an always-accept authenticator, primarily for demos/tests.
pub fn accept_all_fn() -> AuthenticateFn {
    Arc::new(|_system_id: &str, _password: &str| crate::pdu::status::ESME_ROK)
}

pub fn bind_type_default() -> BindType {
    BindType::Transceiver
}
