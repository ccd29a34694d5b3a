// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The three tasks spawned by every `Session::dial`: a read loop that classifies
//! inbound PDUs, a write loop that drains the outbound channel (and ticks heartbeats),
//! and a sweep loop that times out stale window entries.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::config::WindowBlock;
use super::session::{CloseReason, Session};
use super::term::SessionTerm;
use crate::error::SmppError;
use crate::pdu::{Pdu, PduBody};
use crate::request::{Request, Response, Submitter};
use crate::utils::now_unix;

/// PDU types an embedder may not submit through [`Session::write`] directly — these
/// are either session-internal (bind/unbind/heartbeat replies) or only ever valid as a
/// reply the runtime itself constructs from `on_receive`.
fn allow_write(pdu: &Pdu) -> bool {
    !matches!(
        pdu.body,
        PduBody::BindRequest(_) | PduBody::Unbind | PduBody::Outbind(_) | PduBody::GenericNack | PduBody::AlertNotification(_)
    )
}

/// A write timeout means the bytes may or may not have reached the peer but the
/// connection itself hasn't necessarily gone bad — the session stays up and the next
/// write gets its own chance. Any other write failure closes the session.
fn is_write_timeout(err: &SmppError) -> bool {
    matches!(err, SmppError::Io(io_err) if io_err.kind() == std::io::ErrorKind::TimedOut)
}

pub fn spawn_read_loop<T>(session: Arc<Session<T>>, term: Arc<SessionTerm<T>>) -> JoinHandle<()>
where
    T: Send + Sync + Default + 'static,
{
    tokio::spawn(async move {
        loop {
            let pdu = {
                let conn = session.conn().read().await;
                tokio::select! {
                    _ = term.cancel.cancelled() => return,
                    result = conn.read() => result,
                }
            };

            let pdu = match pdu {
                Ok(pdu) => pdu,
                Err(err) => {
                    warn!(session = %session.id(), error = %err, "read failed");
                    session.close_with(CloseReason::Error, err.to_string()).await;
                    return;
                }
            };

            match &pdu.body {
                PduBody::EnquireLink => {
                    let reply = pdu.get_response();
                    let _ = session.enqueue(reply, T::default(), Submitter::System).await;
                }
                PduBody::EnquireLinkResp => {
                    if let Some(req) = term.window.lock().await.take(pdu.sequence_number) {
                        session.on_respond(&Response::ok(req, pdu));
                    }
                }
                PduBody::Unbind => {
                    let reply = pdu.get_response();
                    let _ = session.enqueue(reply, T::default(), Submitter::System).await;
                    session.close_with(CloseReason::Pdu, "received unbind".to_string()).await;
                    return;
                }
                PduBody::UnbindResp => {
                    session.close_with(CloseReason::Pdu, "received unbind response".to_string()).await;
                    return;
                }
                PduBody::BindRequest(_) => {
                    debug!(session = %session.id(), "ignoring unexpected bind request on a bound session");
                }
                PduBody::AlertNotification(_) => {
                    let _ = session.on_receive(&pdu);
                }
                PduBody::GenericNack | PduBody::Outbind(_) => {
                    session.close_with(CloseReason::Pdu, "received unexpected pdu".to_string()).await;
                    return;
                }
                _ if pdu.can_respond() => {
                    if let Some(reply) = session.on_receive(&pdu) {
                        let _ = session.enqueue(reply, T::default(), Submitter::System).await;
                    }
                }
                _ => {
                    if let Some(req) = term.window.lock().await.take(pdu.sequence_number) {
                        session.on_respond(&Response::ok(req, pdu));
                    }
                }
            }
        }
    })
}

/// Drives the outbound channel, retrying window-full submissions per
/// `window_block`, and on cancellation drains anything still buffered in the channel
/// so none of it is silently dropped.
pub fn spawn_write_loop<T>(
    session: Arc<Session<T>>,
    term: Arc<SessionTerm<T>>,
    mut tr_rx: mpsc::Receiver<Request<T>>,
) -> JoinHandle<()>
where
    T: Send + Sync + Default + 'static,
{
    tokio::spawn(async move {
        let heartbeat = session.conf().enquire_link_interval;

        if heartbeat.is_zero() {
            loop {
                tokio::select! {
                    _ = term.cancel.cancelled() => break,
                    received = tr_rx.recv() => {
                        match received {
                            None => break,
                            Some(request) => {
                                if write_request(&session, &term, request).await {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        } else {
            let mut ticker = tokio::time::interval(heartbeat);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = term.cancel.cancelled() => break,
                    received = tr_rx.recv() => {
                        match received {
                            None => break,
                            Some(request) => {
                                if write_request(&session, &term, request).await {
                                    break;
                                }
                            }
                        }
                    }
                    _ = ticker.tick() => {
                        let heartbeat_req = Request::new(
                            Pdu::enquire_link(crate::pdu::next_sequence_number()),
                            T::default(),
                            session.id().to_string(),
                            session.system_id().await,
                            Submitter::System,
                        );
                        if write_request(&session, &term, heartbeat_req).await {
                            break;
                        }
                    }
                }
            }
        }

        drain_channel(&session, &mut tr_rx).await;
    })
}

async fn drain_channel<T>(session: &Arc<Session<T>>, tr_rx: &mut mpsc::Receiver<Request<T>>)
where
    T: Send + Sync + Default + 'static,
{
    while let Ok(request) = tr_rx.try_recv() {
        session.on_respond(&Response::err(request, SmppError::ChannelClosed));
    }
}

/// Runs one request through the write procedure. Returns `true` when the write loop
/// should stop (channel/session gone or the connection just failed).
async fn write_request<T>(session: &Arc<Session<T>>, term: &Arc<SessionTerm<T>>, mut request: Request<T>) -> bool
where
    T: Send + Sync + Default + 'static,
{
    if session.closed() {
        session.on_respond(&Response::err(request, SmppError::ConnectionClosed));
        return true;
    }

    if request.submitter == Submitter::User && !allow_write(&request.pdu) {
        session.on_respond(&Response::err(request, SmppError::NotAllowed));
        return false;
    }

    session.on_request(&request);

    if !request.pdu.can_respond() {
        request.submit_at = now_unix();
        let result = {
            let conn = session.conn().read().await;
            conn.write(&request.pdu).await
        };
        if let Err(err) = result {
            if is_write_timeout(&err) {
                return false;
            }
            session.close_with(CloseReason::Error, err.to_string()).await;
            return true;
        }
        return false;
    }

    let (pdu_to_write, seq) = loop {
        let pdu_clone = request.pdu.clone();
        let seq = pdu_clone.sequence_number;
        request.submit_at = now_unix();
        let put_result = {
            let mut window = term.window.lock().await;
            window.put(request)
        };
        request = match put_result {
            Ok(()) => break (pdu_clone, seq),
            Err(returned) => returned,
        };

        match session.conf().window_block {
            WindowBlock::NoBlock => {
                session.on_respond(&Response::err(request, SmppError::WindowFull));
                return false;
            }
            WindowBlock::Sleep(d) => {
                tokio::select! {
                    _ = term.cancel.cancelled() => {
                        session.on_respond(&Response::err(request, SmppError::ChannelClosed));
                        return true;
                    }
                    _ = tokio::time::sleep(d) => {}
                }
            }
            WindowBlock::Yield => {
                if term.cancel.is_cancelled() {
                    session.on_respond(&Response::err(request, SmppError::ChannelClosed));
                    return true;
                }
                tokio::task::yield_now().await;
            }
        }
    };

    let result = {
        let conn = session.conn().read().await;
        conn.write(&pdu_to_write).await
    };

    if let Err(err) = result {
        if is_write_timeout(&err) {
            // Bytes may or may not have reached the peer; leave the entry in the
            // window so a late response still lands, or the sweep worker times it out.
            return false;
        }
        let desc = err.to_string();
        if let Some(stale) = term.window.lock().await.take(seq) {
            session.on_respond(&Response::err(stale, err));
        }
        session.close_with(CloseReason::Error, desc).await;
        return true;
    }

    false
}

pub fn spawn_sweep_loop<T>(session: Arc<Session<T>>, term: Arc<SessionTerm<T>>) -> JoinHandle<()>
where
    T: Send + Sync + Default + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(session.conf().window_scan_interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = term.cancel.cancelled() => return,
                _ = ticker.tick() => {
                    let expired = term.window.lock().await.take_timeout();
                    for request in expired {
                        session.on_respond(&Response::err(request, SmppError::ResponseTimeout));
                    }
                }
            }
        }
    })
}
