// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Drives `DlrTracer` the way an embedder actually would around a real delivery
//! receipt: track a submitted message, have its receipt land before expiry, and have a
//! second message's receipt never show up so the tracer's own timeout manufactures the
//! fallback `UNDELIV` outcome. `dlr_tracer.rs`'s own inline tests only check the
//! map/heap bookkeeping in isolation; this exercises it alongside `Dlr` the way a
//! delivery-receipt watchdog would.

use smpp_session_rs::dlr::{DLR_STAT_DELIVERED, DLR_STAT_UNDELIVERABLE, Dlr};
use smpp_session_rs::dlr_tracer::{DlrNode, DlrTracer};
use smpp_session_rs::utils::now_unix;

#[tokio::test]
async fn receipt_arriving_before_expiry_is_taken_directly() {
    let tracer = DlrTracer::new();
    let now = now_unix();

    tracer
        .put(DlrNode {
            message_id: "M1".to_string(),
            system_id: "sys1".to_string(),
            session_id: Some("sess1".to_string()),
            expired_at: now + 3600,
        })
        .await;

    let receipt = Dlr {
        id: "M1".to_string(),
        sub: 1,
        dlvrd: 1,
        sd: chrono::Utc::now().naive_utc(),
        dd: chrono::Utc::now().naive_utc(),
        stat: DLR_STAT_DELIVERED.to_string(),
        err: "000".to_string(),
        text: String::new(),
    };

    let tracked = tracer.take(&receipt.id).await.expect("message was tracked");
    assert_eq!(tracked.session_id.as_deref(), Some("sess1"));
    assert!(tracer.is_empty().await);
}

#[tokio::test]
async fn expiring_without_a_receipt_yields_a_synthetic_undeliverable_outcome() {
    let tracer = DlrTracer::new();
    let now = now_unix();

    tracer
        .put(DlrNode {
            message_id: "M2".to_string(),
            system_id: "sys1".to_string(),
            session_id: Some("sess1".to_string()),
            expired_at: now - 1,
        })
        .await;

    let expired = tracer.take_timeout().await;
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].message_id, "M2");

    // A watchdog builds its own fallback receipt once the tracer gives up waiting.
    let fallback = Dlr {
        id: expired[0].message_id.clone(),
        sub: 1,
        dlvrd: 0,
        sd: chrono::Utc::now().naive_utc(),
        dd: chrono::Utc::now().naive_utc(),
        stat: DLR_STAT_UNDELIVERABLE.to_string(),
        err: "999".to_string(),
        text: String::new(),
    };
    let wire = fallback.to_string_wire();
    assert!(wire.contains("stat:UNDELIV"));
    assert!(tracer.is_empty().await);
}
