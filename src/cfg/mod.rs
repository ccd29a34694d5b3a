// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Configuration structs and logger bootstrap, collected in one place so an embedder
//! has a single module to read when wiring up a session.

pub mod config;
pub mod logger;

pub use config::{
    CreateFn, FailedFn, NewWindowFn, OnClosedFn, OnDialedFn, OnReceiveFn, OnRequestFn, OnRespondFn, SessionConfig,
    SessionGroupConfig, SessionGroupManagerConfig, WindowBlock, WindowKind,
};
pub use crate::connection::{ClientConnectionConfig, ServerConnectionConfig};
