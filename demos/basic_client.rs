// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use smpp_session_rs::cfg::config::default_dial;
use smpp_session_rs::cfg::logger::init_logger;
use smpp_session_rs::connection::{ClientConnection, ClientConnectionConfig, Connection};
use smpp_session_rs::pdu::{Address, BindType, Pdu, SubmitSmBody};
use smpp_session_rs::session::{Session, SessionConfig};
use tokio::time::sleep;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("info").context("failed to initialize logger")?;

    let smsc = env::var("SMPP_SMSC").unwrap_or_else(|_| "127.0.0.1:2775".to_string());
    let system_id = env::var("SMPP_SYSTEM_ID").unwrap_or_else(|_| "demo".to_string());
    let password = env::var("SMPP_PASSWORD").unwrap_or_else(|_| "demo".to_string());

    let conn = Connection::Client(ClientConnection::new(ClientConnectionConfig {
        dial_fn: default_dial(),
        smsc: smsc.clone(),
        system_id: system_id.clone(),
        password,
        bind_type: BindType::Transceiver,
        system_type: String::new(),
        address_range: String::new(),
        read_timeout: Duration::from_secs(30),
        write_timeout: Duration::from_secs(10),
    }));

    let conf = SessionConfig::<()> {
        enquire_link_interval: Duration::from_secs(30),
        attempt_dial_interval: Duration::from_secs(5),
        on_receive: Some(std::sync::Arc::new(|_session, pdu, _ctx| {
            info!(?pdu, "received pdu");
            None
        })),
        on_closed: Some(std::sync::Arc::new(|session, reason, desc, _ctx| {
            info!(session = session.id(), %reason, desc, "session closed");
        })),
        ..Default::default()
    };

    let session = Session::new(conn, conf).await.context("initial dial failed")?;
    info!(session = session.id(), smsc = %smsc, "bound to smsc");

    session
        .write(
            Pdu::submit_sm(
                smpp_session_rs::pdu::next_sequence_number(),
                SubmitSmBody {
                    source_addr: Address::international("15551230000"),
                    dest_addr: Address::alphanumeric("15551239999"),
                    short_message: b"hello from smpp-session-rs".to_vec(),
                    ..Default::default()
                },
            ),
            (),
        )
        .await
        .context("submit failed")?;

    sleep(Duration::from_secs(5)).await;

    session.close();
    sleep(Duration::from_millis(200)).await;

    Ok(())
}
