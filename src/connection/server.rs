// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::info;

use super::dial::{BoxedConn, ConnReadHalf, ConnWriteHalf, split};
use crate::error::SmppError;
use crate::pdu::codec::read_pdu;
use crate::pdu::status::{CommandStatus, ESME_ROK};
use crate::pdu::{BindType, Pdu, PduBody};

pub type AuthenticateFn = Arc<dyn Fn(&str, &str) -> CommandStatus + Send + Sync>;

#[derive(Clone)]
pub struct ServerConnectionConfig {
    pub authenticate_fn: AuthenticateFn,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

/// The acceptor side of a bind: reads `BindRequest`, authenticates, and answers with
/// `BindResp`. Read and write halves are locked independently, same rationale as
/// [`super::client::ClientConnection`].
pub struct ServerConnection {
    conf: ServerConnectionConfig,
    read_half: Option<Mutex<ConnReadHalf>>,
    write_half: Option<Mutex<ConnWriteHalf>>,
    self_addr: String,
    peer_addr: String,
    system_id: String,
    bind_type: Option<BindType>,
    read_deadline_override: Mutex<Option<Duration>>,
    write_deadline_override: Mutex<Option<Duration>>,
}

impl ServerConnection {
    pub fn new(conn: BoxedConn, self_addr: String, peer_addr: String, conf: ServerConnectionConfig) -> Self {
        let (r, w) = split(conn);
        ServerConnection {
            conf,
            read_half: Some(Mutex::new(r)),
            write_half: Some(Mutex::new(w)),
            self_addr,
            peer_addr,
            system_id: String::new(),
            bind_type: None,
            read_deadline_override: Mutex::new(None),
            write_deadline_override: Mutex::new(None),
        }
    }

    pub fn system_id(&self) -> String {
        self.system_id.clone()
    }

    pub fn bind_type(&self) -> Option<BindType> {
        self.bind_type
    }

    pub fn self_addr(&self) -> String {
        self.self_addr.clone()
    }

    pub fn peer_addr(&self) -> String {
        self.peer_addr.clone()
    }

    pub async fn dial(&mut self) -> Result<(), SmppError> {
        if self.read_half.is_none() || self.write_half.is_none() {
            return Err(SmppError::ConnectionIsNil);
        }

        let mut matched = None;
        for _ in 0..3 {
            let pdu = self.read().await?;
            if matches!(pdu.body, PduBody::BindRequest(_)) {
                matched = Some(pdu);
                break;
            }
        }

        let request = matched.ok_or(SmppError::BindFailed)?;
        let PduBody::BindRequest(ref req_body) = request.body else {
            return Err(SmppError::BindFailed);
        };
        self.system_id = req_body.system_id.clone();
        self.bind_type = Some(req_body.bind_type);

        let status = (self.conf.authenticate_fn)(&req_body.system_id, &req_body.password);

        let resp = Pdu::bind_resp(request.sequence_number, status, req_body.system_id.clone());
        self.write(&resp).await?;

        if status != ESME_ROK {
            return Err(SmppError::AuthFailed);
        }

        info!(system_id = %self.system_id, peer = %self.peer_addr, "accepted bind");
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

    /// Server close just drops the socket — no `Unbind` courtesy write.
    pub async fn close(&mut self) -> Result<(), SmppError> {
        if let Some(half) = self.write_half.take() {
            let _ = half.into_inner().shutdown().await;
        }
        self.read_half = None;
        Ok(())
    }

    pub async fn set_deadline(&self, dur: Duration) {
        *self.read_deadline_override.lock().await = Some(dur);
        *self.write_deadline_override.lock().await = Some(dur);
    }
}
