// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Pluggable transport dialer, matching the original's `Dial func(addr string) (net.Conn,
//! error)` — an embedder can plug in plain TCP, TLS, or a test double.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{self, AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Anything that looks like a duplex byte stream: a real `TcpStream`, a TLS-wrapped
/// stream, or an in-memory duplex pipe used by tests.
pub trait AsyncConn: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncConn for T {}

pub type BoxedConn = Box<dyn AsyncConn>;
pub type ConnReadHalf = io::ReadHalf<BoxedConn>;
pub type ConnWriteHalf = io::WriteHalf<BoxedConn>;

/// Splits a boxed transport into independently lockable halves via `tokio::io::split`,
/// so a session's read loop and write loop never contend on the same lock the way a
/// single shared `Mutex<BoxedConn>` would force them to.
pub fn split(conn: BoxedConn) -> (ConnReadHalf, ConnWriteHalf) {
    io::split(conn)
}

/// A dialed connection plus the local/peer address strings the `Connection` layer
/// reports back to callers — captured here because they can't be recovered generically
/// from a boxed `AsyncConn` trait object once a concrete `TcpStream` is erased.
pub struct Dialed {
    pub conn: BoxedConn,
    pub self_addr: String,
    pub peer_addr: String,
}

type DialFuture = Pin<Box<dyn Future<Output = std::io::Result<Dialed>> + Send>>;

/// `Arc<dyn Fn(addr) -> DialFuture>` so it can be cloned into a `ClientConnectionConfig`
/// and invoked on every `dial()`/redial.
pub type Dial = Arc<dyn Fn(String) -> DialFuture + Send + Sync>;

/// Plain TCP dialer: `TcpStream::connect(addr)`, boxed behind [`AsyncConn`].
pub fn tcp_dial() -> Dial {
    Arc::new(|addr: String| -> DialFuture {
        Box::pin(async move {
            let stream = TcpStream::connect(&addr).await?;
            stream.set_nodelay(true).ok();
            let self_addr = stream
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_default();
            let peer_addr = stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| addr.clone());
            Ok(Dialed {
                conn: Box::new(stream) as BoxedConn,
                self_addr,
                peer_addr,
            })
        })
    })
}
