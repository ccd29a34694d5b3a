// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A single bound SMPP session: one [`Connection`] driven by a read worker, a
//! write(+heartbeat) worker and a window-sweep worker.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{info, warn};

use super::term::SessionTerm;
use super::workers;
use crate::connection::Connection;
use crate::error::SmppError;
use crate::pdu::{BindType, Pdu};
use crate::request::{Request, Response, Submitter};
use crate::session::config::SessionConfig;
use crate::utils::{generate_id, now_unix};

const SESSION_ACTIVE: u8 = 0;
const SESSION_CLOSED: u8 = 1;

/// Why a session stopped running, mirroring the original's `CloseByError` /
/// `CloseByPdu` / `CloseByExplicit` string constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Error,
    Pdu,
    Explicit,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloseReason::Error => "error",
            CloseReason::Pdu => "pdu",
            CloseReason::Explicit => "explicit",
        })
    }
}

/// One bound SMPP connection, with redial, heartbeats, a sliding window of
/// outstanding requests, and a sweep worker that times those requests out.
///
/// Always held behind an `Arc` — every method that needs to spawn workers or redial
/// takes `self: &Arc<Self>` so those tasks can hold their own strong reference.
pub struct Session<T> {
    id: String,
    conn: Arc<RwLock<Connection>>,
    conf: Arc<SessionConfig<T>>,
    term: Mutex<Option<Arc<SessionTerm<T>>>>,
    status: AtomicU8,
    closed_explicitly: AtomicBool,
    init_at: i64,
}

impl<T: Send + Sync + Default + 'static> Session<T> {
    /// Builds a session around `conn` and performs the initial dial.
    pub async fn new(conn: Connection, conf: SessionConfig<T>) -> Result<Arc<Self>, SmppError> {
        let session = Arc::new(Session {
            id: generate_id(),
            conn: Arc::new(RwLock::new(conn)),
            conf: Arc::new(conf),
            term: Mutex::new(None),
            status: AtomicU8::new(SESSION_CLOSED),
            closed_explicitly: AtomicBool::new(false),
            init_at: now_unix(),
        });
        session.dial().await?;
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn init_at(&self) -> i64 {
        self.init_at
    }

    pub fn is_active(&self) -> bool {
        self.status.load(Ordering::SeqCst) == SESSION_ACTIVE
    }

    pub fn closed(&self) -> bool {
        self.status.load(Ordering::SeqCst) == SESSION_CLOSED
    }

    pub fn closed_explicitly(&self) -> bool {
        self.closed_explicitly.load(Ordering::SeqCst)
    }

    /// `"Closed"` if explicitly closed or terminally closed (redial disabled);
    /// `"Dialing"` if closed but still redialing; `"Active"` otherwise.
    pub fn status_string(&self) -> &'static str {
        if self.closed_explicitly() || (self.closed() && self.conf.attempt_dial_interval.is_zero()) {
            "Closed"
        } else if self.closed() {
            "Dialing"
        } else {
            "Active"
        }
    }

    pub async fn system_id(&self) -> String {
        self.conn.read().await.system_id()
    }

    pub async fn bind_type(&self) -> Option<BindType> {
        self.conn.read().await.bind_type()
    }

    pub async fn peer_addr(&self) -> String {
        self.conn.read().await.peer_addr()
    }

    pub async fn dial_at(&self) -> Option<i64> {
        self.term.lock().await.as_ref().map(|t| t.dial_at)
    }

    /// (Re)establishes the transport, then spawns the read/write/sweep workers. A
    /// no-op if already active.
    pub async fn dial(self: &Arc<Self>) -> Result<(), SmppError> {
        if self.is_active() {
            return Ok(());
        }

        {
            let mut conn = self.conn.write().await;
            if let Err(err) = conn.dial().await {
                warn!(session = %self.id, peer = %conn.peer_addr(), error = %err, "dial failed");
                return Err(err);
            }
        }

        let system_id = self.system_id().await;
        let window = self.conf.build_window(&system_id);
        let (tr_tx, tr_rx) = mpsc::channel(1);
        let term = Arc::new(SessionTerm {
            cancel: tokio_util::sync::CancellationToken::new(),
            window: Mutex::new(window),
            tr_tx,
            handles: Mutex::new(Vec::new()),
            dial_at: now_unix(),
        });

        *self.term.lock().await = Some(term.clone());
        self.status.store(SESSION_ACTIVE, Ordering::SeqCst);

        let handles = vec![
            workers::spawn_read_loop(self.clone(), term.clone()),
            workers::spawn_write_loop(self.clone(), term.clone(), tr_rx),
            workers::spawn_sweep_loop(self.clone(), term.clone()),
        ];
        *term.handles.lock().await = handles;

        info!(session = %self.id, system_id = %system_id, peer = %self.peer_addr().await, "dial succeeded");
        self.on_dialed();
        self.register_in_store().await;

        Ok(())
    }

    /// Enqueues a user-submitted PDU for the write worker. Fails immediately if the
    /// session is not currently dialed.
    pub async fn write(self: &Arc<Self>, pdu: Pdu, trace: T) -> Result<(), SmppError> {
        if self.closed() {
            return Err(SmppError::ConnectionClosed);
        }
        self.enqueue(pdu, trace, Submitter::User).await
    }

    pub(crate) async fn enqueue(self: &Arc<Self>, pdu: Pdu, trace: T, submitter: Submitter) -> Result<(), SmppError> {
        let term = self.term.lock().await.clone().ok_or(SmppError::ConnectionClosed)?;
        let request = Request::new(pdu, trace, self.id.clone(), self.system_id().await, submitter);
        term.tr_tx.send(request).await.map_err(|_| SmppError::ChannelClosed)
    }

    /// Marks the session permanently closed (no redial, even if `attempt_dial_interval`
    /// is set) and tears it down asynchronously.
    pub fn close(self: &Arc<Self>) {
        self.closed_explicitly.store(true, Ordering::SeqCst);
        let session = self.clone();
        tokio::spawn(async move {
            session.close_with(CloseReason::Explicit, String::new()).await;
        });
    }

    /// Internal close/redial sequence. A no-op if already closed (guarded by a single
    /// CAS on `status`, so concurrent callers race harmlessly).
    pub(crate) async fn close_with(self: &Arc<Self>, reason: CloseReason, desc: String) {
        if self
            .status
            .compare_exchange(SESSION_ACTIVE, SESSION_CLOSED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let session = self.clone();
        tokio::spawn(async move {
            info!(session = %session.id, %reason, desc = %desc, "closing");

            let term = session.term.lock().await.clone();
            if let Some(term) = &term {
                term.cancel.cancel();
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
            session.conn.read().await.set_deadline(Duration::from_millis(100)).await;

            if let Some(term) = &term {
                let handles = {
                    let mut h = term.handles.lock().await;
                    std::mem::take(&mut *h)
                };
                for handle in handles {
                    let _ = handle.await;
                }
            }

            {
                let mut conn = session.conn.write().await;
                let _ = conn.close(false).await;
            }

            *session.term.lock().await = None;

            info!(session = %session.id, "closed");

            let terminal = session.conf.attempt_dial_interval.is_zero() || reason == CloseReason::Explicit;
            if terminal {
                session.deregister_from_store().await;
                session.on_closed(reason, &desc);
                return;
            }

            info!(session = %session.id, "redialing");
            let mut ticker = tokio::time::interval(session.conf.attempt_dial_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if session.closed_explicitly() {
                    info!(session = %session.id, "close requested while redialing");
                    session.deregister_from_store().await;
                    session.on_closed(CloseReason::Explicit, "");
                    return;
                }
                if session.dial().await.is_ok() {
                    if session.closed_explicitly() {
                        info!(session = %session.id, "close requested right after redial");
                        session.close_with(CloseReason::Explicit, String::new()).await;
                    }
                    return;
                }
            }
        });
    }

    async fn register_in_store(self: &Arc<Self>) {
        if let Some(store) = &self.conf.session_store {
            store.add(self.clone()).await;
        }
    }

    async fn deregister_from_store(self: &Arc<Self>) {
        if let Some(store) = &self.conf.session_store {
            store.del(&self.id).await;
        }
    }

    fn on_dialed(self: &Arc<Self>) {
        if let Some(f) = &self.conf.on_dialed {
            f(self, self.conf.context.as_ref());
        }
    }

    fn on_closed(self: &Arc<Self>, reason: CloseReason, desc: &str) {
        if let Some(f) = &self.conf.on_closed {
            f(self, reason, desc, self.conf.context.as_ref());
        }
    }

    pub(crate) fn on_receive(self: &Arc<Self>, pdu: &Pdu) -> Option<Pdu> {
        self.conf.on_receive.as_ref().and_then(|f| f(self, pdu, self.conf.context.as_ref()))
    }

    pub(crate) fn on_request(&self, request: &Request<T>) {
        if request.submitter != Submitter::User {
            return;
        }
        if let Some(f) = &self.conf.on_request {
            f(request, self.conf.context.as_ref());
        }
    }

    pub(crate) fn on_respond(&self, response: &Response<T>) {
        if response.request.submitter != Submitter::User {
            return;
        }
        if let Some(f) = &self.conf.on_respond {
            f(response, self.conf.context.as_ref());
        }
    }

    pub(crate) fn conn(&self) -> &Arc<RwLock<Connection>> {
        &self.conn
    }

    pub(crate) fn conf(&self) -> &Arc<SessionConfig<T>> {
        &self.conf
    }
}
