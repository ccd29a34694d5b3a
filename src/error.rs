// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed error taxonomy for the session runtime.
//!
//! Internal plumbing (I/O, config loading) propagates `anyhow::Error` the way the
//! teacher's connection/session code does. Errors that are meant to reach an
//! application's `on_respond` callback are always one of these variants so callers can
//! `match` on them instead of string-sniffing.

use thiserror::Error;

use crate::pdu::status::{CommandStatus, describe};

#[derive(Debug, Error)]
pub enum SmppError {
    #[error("bind failed")]
    BindFailed,

    #[error("auth failed")]
    AuthFailed,

    #[error("({status}) {desc}")]
    StatusError {
        status: CommandStatus,
        desc: &'static str,
    },

    #[error("server connection constructed without a socket")]
    ConnectionIsNil,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("window full")]
    WindowFull,

    #[error("not allowed")]
    NotAllowed,

    #[error("channel closed")]
    ChannelClosed,

    #[error("response timeout")]
    ResponseTimeout,

    #[error("invalid dlr format")]
    InvalidDlrFormat,

    #[error("invalid pdu")]
    InvalidPdu,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmppError {
    pub fn status(status: CommandStatus) -> Self {
        SmppError::StatusError {
            status,
            desc: describe(status),
        }
    }
}
