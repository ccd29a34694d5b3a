// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A single bidirectional PDU transport, in either client or server role.
//!
//! The original interface is replaced with a tagged enum over `{Client, Server}`
//! rather than a trait object: both variants expose the same methods, dispatched with
//! a plain `match`, so no virtual call is paid on the hot read/write path.

pub mod client;
pub mod dial;
pub mod server;

use std::time::Duration;

pub use client::{ClientConnection, ClientConnectionConfig};
pub use server::{ServerConnection, ServerConnectionConfig};

use crate::error::SmppError;
use crate::pdu::{BindType, Pdu};

pub enum Connection {
    Client(ClientConnection),
    Server(ServerConnection),
}

impl Connection {
    pub fn self_addr(&self) -> String {
        match self {
            Connection::Client(c) => c.self_addr(),
            Connection::Server(c) => c.self_addr(),
        }
    }

    pub fn peer_addr(&self) -> String {
        match self {
            Connection::Client(c) => c.peer_addr(),
            Connection::Server(c) => c.peer_addr(),
        }
    }

    pub fn system_id(&self) -> String {
        match self {
            Connection::Client(c) => c.system_id(),
            Connection::Server(c) => c.system_id(),
        }
    }

    pub fn bind_type(&self) -> Option<BindType> {
        match self {
            Connection::Client(c) => Some(c.bind_type()),
            Connection::Server(c) => c.bind_type(),
        }
    }

    /// Establishes the transport and runs the bind handshake. Only ever called while
    /// the caller holds exclusive access (the session's connection write-lock), never
    /// concurrently with `read`/`write`.
    pub async fn dial(&mut self) -> Result<(), SmppError> {
        match self {
            Connection::Client(c) => c.dial().await,
            Connection::Server(c) => c.dial().await,
        }
    }

    /// Reads and writes take `&self`: each side locks its own half internally, so a
    /// session's read loop and write loop can run concurrently against the same
    /// `Connection` without contending on each other's lock.
    pub async fn read(&self) -> Result<Pdu, SmppError> {
        match self {
            Connection::Client(c) => c.read().await,
            Connection::Server(c) => c.read().await,
        }
    }

    pub async fn write(&self, pdu: &Pdu) -> Result<usize, SmppError> {
        match self {
            Connection::Client(c) => c.write(pdu).await,
            Connection::Server(c) => c.write(pdu).await,
        }
    }

    pub async fn close(&mut self, bye: bool) -> Result<(), SmppError> {
        match self {
            Connection::Client(c) => c.close(bye).await,
            Connection::Server(c) => c.close().await,
        }
    }

    pub async fn set_deadline(&self, dur: Duration) {
        match self {
            Connection::Client(c) => c.set_deadline(dur).await,
            Connection::Server(c) => c.set_deadline(dur).await,
        }
    }
}
