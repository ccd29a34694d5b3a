// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Carries a delivery receipt through a full `DeliverSm` PDU wire round trip — distinct
//! from `dlr.rs`'s own inline tests, which only round-trip the text format itself and
//! decode the body straight from `Dlr::pdu` without ever going through `WireCodec`.

use smpp_session_rs::dlr::{DLR_STAT_DELIVERED, Dlr};
use smpp_session_rs::pdu::codec::WireCodec;
use smpp_session_rs::pdu::{Pdu, PduBody, codec::PduCodec};

fn sample_dlr() -> Dlr {
    Dlr {
        id: "M12345".to_string(),
        sub: 1,
        dlvrd: 1,
        sd: chrono::NaiveDateTime::parse_from_str("2501151030", "%y%m%d%H%M").expect("valid"),
        dd: chrono::NaiveDateTime::parse_from_str("2501151031", "%y%m%d%H%M").expect("valid"),
        stat: DLR_STAT_DELIVERED.to_string(),
        err: "000".to_string(),
        text: "delivered ok".to_string(),
    }
}

#[test]
fn deliver_sm_carrying_a_dlr_round_trips_through_the_wire_codec() {
    let dlr = sample_dlr();
    let body = dlr.pdu("12025550123", "ACME");
    let pdu = Pdu::deliver_sm(99, body);

    let bytes = WireCodec::marshal(&pdu);
    let parsed = WireCodec::parse(&bytes).expect("parse");

    assert_eq!(parsed.sequence_number, 99);
    match parsed.body {
        PduBody::DeliverSm(b) => {
            assert_eq!(b.esm_class, smpp_session_rs::pdu::SM_SMSC_DLR_RECEIPT);
            let decoded = String::from_utf8(b.short_message).expect("utf8");
            let reparsed = Dlr::parse(&decoded).expect("receipt text parses");
            assert_eq!(reparsed, dlr);
        }
        other => panic!("unexpected body: {other:?}"),
    }
}
