// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Shared scaffolding for the session-engine integration tests: an in-memory duplex
//! pipe stands in for a TCP socket so bind/submit/unbind/heartbeat round trips can be
//! exercised without the network.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use smpp_session_rs::cfg::config::accept_all_fn;
use smpp_session_rs::connection::dial::{BoxedConn, Dial, Dialed};
use smpp_session_rs::connection::{ClientConnection, ClientConnectionConfig, Connection, ServerConnection, ServerConnectionConfig};
use smpp_session_rs::pdu::{BindType, PduBody};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A [`Dial`] that hands out one already-open half of a duplex pipe exactly once —
/// `ClientConnection::dial` only ever calls it once per `dial()`/redial anyway, but the
/// `Fn` bound (not `FnOnce`) means the closure still has to be reusable in shape.
fn one_shot_dial(conn: BoxedConn) -> Dial {
    let slot = Arc::new(Mutex::new(Some(conn)));
    Arc::new(move |addr: String| -> Pin<Box<dyn Future<Output = std::io::Result<Dialed>> + Send>> {
        let slot = slot.clone();
        Box::pin(async move {
            let conn = slot
                .lock()
                .expect("one_shot_dial mutex poisoned")
                .take()
                .expect("test dialed more than once");
            Ok(Dialed {
                conn,
                self_addr: "test-client".to_string(),
                peer_addr: addr,
            })
        })
    })
}

fn client_conn_config(dial_fn: Dial, system_id: &str) -> ClientConnectionConfig {
    ClientConnectionConfig {
        dial_fn,
        smsc: "test-smsc".to_string(),
        system_id: system_id.to_string(),
        password: "pwd".to_string(),
        bind_type: BindType::Transceiver,
        system_type: String::new(),
        address_range: String::new(),
        read_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(5),
    }
}

/// Builds an un-dialed client `Connection` wired to one end of an in-memory duplex
/// pipe, plus a task that will bind the other end as a `ServerConnection` and hand it
/// back once the bind handshake completes. The caller is expected to dial the
/// `Connection` (directly, or via `Session::new`) concurrently with awaiting the
/// returned task — the handshake needs both sides running at once.
pub fn make_client_connection(system_id: &str) -> (Connection, JoinHandle<ServerConnection>) {
    let (client_half, server_half) = tokio::io::duplex(65536);

    let server_task = tokio::spawn(async move {
        let mut server = ServerConnection::new(
            Box::new(server_half) as BoxedConn,
            "test-server".to_string(),
            "test-client".to_string(),
            ServerConnectionConfig {
                authenticate_fn: accept_all_fn(),
                read_timeout: Duration::from_secs(5),
                write_timeout: Duration::from_secs(5),
            },
        );
        server.dial().await.expect("server bind handshake");
        server
    });

    let dial_fn = one_shot_dial(Box::new(client_half) as BoxedConn);
    let conn = Connection::Client(ClientConnection::new(client_conn_config(dial_fn, system_id)));

    (conn, server_task)
}

/// Plays the role of the far end of an already-bound session: answers anything
/// `can_respond()` with its default response, and stops once it sees (and answers) an
/// `Unbind`.
pub fn spawn_echo_responder(mut server: ServerConnection) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let pdu = match server.read().await {
                Ok(pdu) => pdu,
                Err(_) => return,
            };
            match &pdu.body {
                PduBody::Unbind => {
                    let _ = server.write(&pdu.get_response()).await;
                    return;
                }
                _ if pdu.can_respond() => {
                    let _ = server.write(&pdu.get_response()).await;
                }
                _ => {}
            }
        }
    })
}

/// Like [`spawn_echo_responder`] but never answers an ordinary request — only `Unbind`
/// gets a reply. Lets a test leave a `submit_sm` (or similar) outstanding forever, to
/// exercise window-full backpressure or the sweep worker's timeout, while the session
/// can still close cleanly afterwards.
pub fn spawn_silent_responder(mut server: ServerConnection) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let pdu = match server.read().await {
                Ok(pdu) => pdu,
                Err(_) => return,
            };
            if let PduBody::Unbind = &pdu.body {
                let _ = server.write(&pdu.get_response()).await;
                return;
            }
        }
    })
}

/// A [`Dial`] that hands out a fresh duplex pipe every call, spawning a new
/// `ServerConnection` bind-acceptor task each time and handing it back over `rx` once
/// its bind handshake completes. Unlike `one_shot_dial`, this supports redial: each
/// `ClientConnection::dial()` (including the ones `Session::close_with`'s redial loop
/// triggers) gets its own fresh transport and its own `ServerConnection` to drive.
pub fn make_redialing_client_connection(system_id: &str) -> (Connection, mpsc::UnboundedReceiver<ServerConnection>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let dial_fn: Dial = Arc::new(move |addr: String| -> Pin<Box<dyn Future<Output = std::io::Result<Dialed>> + Send>> {
        let tx = tx.clone();
        Box::pin(async move {
            let (client_half, server_half) = tokio::io::duplex(65536);
            tokio::spawn(async move {
                let mut server = ServerConnection::new(
                    Box::new(server_half) as BoxedConn,
                    "test-server".to_string(),
                    "test-client".to_string(),
                    ServerConnectionConfig {
                        authenticate_fn: accept_all_fn(),
                        read_timeout: Duration::from_secs(5),
                        write_timeout: Duration::from_secs(5),
                    },
                );
                if server.dial().await.is_ok() {
                    let _ = tx.send(server);
                }
            });
            Ok(Dialed {
                conn: Box::new(client_half) as BoxedConn,
                self_addr: "test-client".to_string(),
                peer_addr: addr,
            })
        })
    });

    let conn = Connection::Client(ClientConnection::new(client_conn_config(dial_fn, system_id)));
    (conn, rx)
}
