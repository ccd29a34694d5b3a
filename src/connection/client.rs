// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::dial::{ConnReadHalf, ConnWriteHalf, Dial, Dialed, split};
use crate::error::SmppError;
use crate::pdu::codec::read_pdu;
use crate::pdu::status::ESME_ROK;
use crate::pdu::{BindRequestBody, BindType, Pdu, PduBody};

#[derive(Clone)]
pub struct ClientConnectionConfig {
    pub dial_fn: Dial,
    pub smsc: String,
    pub system_id: String,
    pub password: String,
    pub bind_type: BindType,
    pub system_type: String,
    pub address_range: String,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

/// The initiator side of a bind: dials, sends `BindRequest`, and expects `BindResp`.
///
/// Read and write halves are locked independently (see [`super::dial::split`]) so a
/// session's read loop and write loop never block on each other's I/O.
pub struct ClientConnection {
    conf: ClientConnectionConfig,
    read_half: Option<Mutex<ConnReadHalf>>,
    write_half: Option<Mutex<ConnWriteHalf>>,
    self_addr: Option<String>,
    peer_addr: Option<String>,
    read_deadline_override: Mutex<Option<Duration>>,
    write_deadline_override: Mutex<Option<Duration>>,
}

impl ClientConnection {
    pub fn new(conf: ClientConnectionConfig) -> Self {
        ClientConnection {
            conf,
            read_half: None,
            write_half: None,
            self_addr: None,
            peer_addr: None,
            read_deadline_override: Mutex::new(None),
            write_deadline_override: Mutex::new(None),
        }
    }

    pub fn system_id(&self) -> String {
        self.conf.system_id.clone()
    }

    pub fn bind_type(&self) -> BindType {
        self.conf.bind_type
    }

    pub fn self_addr(&self) -> String {
        self.self_addr.clone().unwrap_or_default()
    }

    pub fn peer_addr(&self) -> String {
        self.peer_addr.clone().unwrap_or_else(|| self.conf.smsc.clone())
    }

    /// Establishes a fresh transport and runs the bind handshake. Takes `&mut self`:
    /// callers hold the connection behind an `RwLock` and take the write lock only for
    /// `dial`/`close`, never while a read or write loop is in flight.
    pub async fn dial(&mut self) -> Result<(), SmppError> {
        self.teardown().await;

        let Dialed {
            conn,
            self_addr,
            peer_addr,
        } = (self.conf.dial_fn)(self.conf.smsc.clone()).await?;
        let (r, w) = split(conn);
        self.read_half = Some(Mutex::new(r));
        self.write_half = Some(Mutex::new(w));
        self.self_addr = Some(self_addr);
        self.peer_addr = Some(peer_addr);

        if let Err(err) = self.bind().await {
            self.teardown().await;
            return Err(err);
        }
        Ok(())
    }

    async fn teardown(&mut self) {
        if let Some(half) = self.write_half.take() {
            let _ = half.into_inner().shutdown().await;
        }
        self.read_half = None;
    }

    async fn bind(&self) -> Result<(), SmppError> {
        let seq = crate::pdu::next_sequence_number();
        let request = Pdu::bind_request(
            seq,
            BindRequestBody {
                system_id: self.conf.system_id.clone(),
                password: self.conf.password.clone(),
                system_type: self.conf.system_type.clone(),
                interface_version: 0x34,
                addr_ton: 0,
                addr_npi: 0,
                address_range: self.conf.address_range.clone(),
                bind_type: self.conf.bind_type,
            },
        );

        self.write(&request).await?;

        let mut matched = None;
        for _ in 0..3 {
            let pdu = self.read().await?;
            if let PduBody::BindResp(_) = &pdu.body {
                matched = Some(pdu);
                break;
            }
        }

        let resp = matched.ok_or(SmppError::BindFailed)?;
        if resp.sequence_number != seq {
            return Err(SmppError::BindFailed);
        }
        if resp.command_status != ESME_ROK {
            warn!(status = resp.command_status, "bind rejected by peer");
            return Err(SmppError::status(resp.command_status));
        }

        info!(system_id = %self.conf.system_id, peer = %self.peer_addr(), "bind succeeded");
        Ok(())
    }

    pub async fn read(&self) -> Result<Pdu, SmppError> {
        let half = self.read_half.as_ref().ok_or(SmppError::ConnectionIsNil)?;
        let mut half = half.lock().await;
        let dur = self.read_deadline_override.lock().await.take().unwrap_or(self.conf.read_timeout);
        if dur.is_zero() {
            read_pdu(&mut *half).await
        } else {
            timeout(dur, read_pdu(&mut *half))
                .await
                .map_err(|_| SmppError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "read timeout")))?
        }
    }

    pub async fn write(&self, pdu: &Pdu) -> Result<usize, SmppError> {
        let half = self.write_half.as_ref().ok_or(SmppError::ConnectionIsNil)?;
        let mut half = half.lock().await;
        let bytes = crate::pdu::codec::marshal(pdu);
        let dur = self.write_deadline_override.lock().await.take().unwrap_or(self.conf.write_timeout);
        let write_fut = async {
            half.write_all(&bytes).await?;
            half.flush().await?;
            Ok::<usize, std::io::Error>(bytes.len())
        };
        let written = if dur.is_zero() {
            write_fut.await?
        } else {
            timeout(dur, write_fut)
                .await
                .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "write timeout"))??
        };
        Ok(written)
    }

    /// Client close: write `Unbind` with a 100ms deadline, wait 100ms so the peer's
    /// reply drains without triggering a connection reset, then close the socket.
    pub async fn close(&mut self, bye: bool) -> Result<(), SmppError> {
        if bye && self.write_half.is_some() {
            *self.write_deadline_override.lock().await = Some(Duration::from_millis(100));
            let unbind = Pdu::unbind(crate::pdu::next_sequence_number());
            let _ = self.write(&unbind).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        debug!("closing client connection");
        self.teardown().await;
        Ok(())
    }

    /// Arms a one-shot deadline consumed by the very next `read()`/`write()` call on
    /// either half (used by `close()`'s courtesy `Unbind` write).
    pub async fn set_deadline(&self, dur: Duration) {
        *self.read_deadline_override.lock().await = Some(dur);
        *self.write_deadline_override.lock().await = Some(dur);
    }
}
