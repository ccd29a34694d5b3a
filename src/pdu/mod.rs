// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The PDU model this runtime drives its session state machine with.
//!
//! Wire encode/decode is treated as an external boundary by the specification (an
//! "SMPP codec library" the runtime merely consumes). No such crate exists on
//! crates.io, so [`codec`] implements that boundary in-house, kept behind the
//! [`codec::PduCodec`] trait so an embedder can swap in a different codec without
//! touching the session engine.

pub mod codec;
pub mod status;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use status::{CommandStatus, ESME_ROK};

static NEXT_SEQ: AtomicU32 = AtomicU32::new(1);

/// Assigns the next outbound `sequence_number`. Sequence-number assignment is normally
/// the codec library's job (see the module doc); since this crate owns the wire codec
/// it owns this counter too. Wraps past `0` (reserved, unused by any PDU this crate
/// builds) back to `1`.
pub fn next_sequence_number() -> u32 {
    let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
    if seq == 0 {
        NEXT_SEQ.store(2, Ordering::Relaxed);
        1
    } else {
        seq
    }
}

/// SMPP bind type (SMPP v3.4 §4.1), also used to classify a session's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BindType {
    Transmitter,
    Receiver,
    Transceiver,
}

impl fmt::Display for BindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindType::Transmitter => "Transmitter",
            BindType::Receiver => "Receiver",
            BindType::Transceiver => "Transceiver",
        })
    }
}

/// The 32-bit `command_id` identifying a PDU's type (SMPP v3.4 §5.1.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandId {
    BindReceiver = 0x0000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransceiver = 0x0000_0009,
    BindReceiverResp = 0x8000_0001,
    BindTransmitterResp = 0x8000_0002,
    BindTransceiverResp = 0x8000_0009,
    Outbind = 0x0000_000B,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    GenericNack = 0x8000_0000,
    AlertNotification = 0x0000_0102,
}

impl CommandId {
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0x0000_0001 => Self::BindReceiver,
            0x0000_0002 => Self::BindTransmitter,
            0x0000_0009 => Self::BindTransceiver,
            0x8000_0001 => Self::BindReceiverResp,
            0x8000_0002 => Self::BindTransmitterResp,
            0x8000_0009 => Self::BindTransceiverResp,
            0x0000_000B => Self::Outbind,
            0x0000_0006 => Self::Unbind,
            0x8000_0006 => Self::UnbindResp,
            0x0000_0004 => Self::SubmitSm,
            0x8000_0004 => Self::SubmitSmResp,
            0x0000_0005 => Self::DeliverSm,
            0x8000_0005 => Self::DeliverSmResp,
            0x0000_0015 => Self::EnquireLink,
            0x8000_0015 => Self::EnquireLinkResp,
            0x8000_0000 => Self::GenericNack,
            0x0000_0102 => Self::AlertNotification,
            _ => return None,
        })
    }
}

/// `{ton, npi, addr}` per SMPP v3.4 §5.2.5/§5.2.6. TON/NPI are documented but not
/// enforced, matching the original's free-function `Address(ton, npi, addr)` helper.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub ton: u8,
    pub npi: u8,
    pub addr: String,
}

impl Address {
    pub fn new(ton: u8, npi: u8, addr: impl Into<String>) -> Self {
        Self {
            ton,
            npi,
            addr: addr.into(),
        }
    }

    /// `TON=International(1), NPI=E.164(1)` — the combination DLR producers commonly use
    /// for the SMSC-facing source address.
    pub fn international(addr: impl Into<String>) -> Self {
        Self::new(1, 1, addr)
    }

    /// `TON=Alphanumeric(5), NPI=Unknown(0)` — the combination commonly used for an
    /// application-facing short code / sender id destination address.
    pub fn alphanumeric(addr: impl Into<String>) -> Self {
        Self::new(5, 0, addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.ton, self.npi, self.addr)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BindRequestBody {
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
    pub bind_type: BindType,
}

impl Default for BindType {
    fn default() -> Self {
        BindType::Transceiver
    }
}

#[derive(Debug, Clone, Default)]
pub struct BindRespBody {
    pub system_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct OutbindBody {
    pub system_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitSmBody {
    pub service_type: String,
    pub source_addr: Address,
    pub dest_addr: Address,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub registered_delivery: u8,
    pub data_coding: u8,
    pub short_message: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitSmRespBody {
    pub message_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeliverSmBody {
    pub service_type: String,
    pub source_addr: Address,
    pub dest_addr: Address,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub data_coding: u8,
    pub short_message: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct DeliverSmRespBody {
    pub message_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct AlertNotificationBody {
    pub source_addr: Address,
    pub esme_addr: Address,
}

/// The SMPP-class used to mark `EsmClass` on the wire for a delivery receipt
/// (`SMSC Delivery Receipt`, SMPP v3.4 §5.2.12 table).
pub const SM_SMSC_DLR_RECEIPT: u8 = 0x04;

#[derive(Debug, Clone)]
pub enum PduBody {
    BindRequest(BindRequestBody),
    BindResp(BindRespBody),
    Outbind(OutbindBody),
    Unbind,
    UnbindResp,
    SubmitSm(SubmitSmBody),
    SubmitSmResp(SubmitSmRespBody),
    DeliverSm(DeliverSmBody),
    DeliverSmResp(DeliverSmRespBody),
    EnquireLink,
    EnquireLinkResp,
    GenericNack,
    AlertNotification(AlertNotificationBody),
}

/// A full SMPP PDU: header fields plus a typed body.
#[derive(Debug, Clone)]
pub struct Pdu {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: PduBody,
}

impl Pdu {
    pub fn command_id(&self) -> CommandId {
        match &self.body {
            PduBody::BindRequest(b) => match b.bind_type {
                BindType::Transmitter => CommandId::BindTransmitter,
                BindType::Receiver => CommandId::BindReceiver,
                BindType::Transceiver => CommandId::BindTransceiver,
            },
            PduBody::BindResp(_) => CommandId::BindTransceiverResp,
            PduBody::Outbind(_) => CommandId::Outbind,
            PduBody::Unbind => CommandId::Unbind,
            PduBody::UnbindResp => CommandId::UnbindResp,
            PduBody::SubmitSm(_) => CommandId::SubmitSm,
            PduBody::SubmitSmResp(_) => CommandId::SubmitSmResp,
            PduBody::DeliverSm(_) => CommandId::DeliverSm,
            PduBody::DeliverSmResp(_) => CommandId::DeliverSmResp,
            PduBody::EnquireLink => CommandId::EnquireLink,
            PduBody::EnquireLinkResp => CommandId::EnquireLinkResp,
            PduBody::GenericNack => CommandId::GenericNack,
            PduBody::AlertNotification(_) => CommandId::AlertNotification,
        }
    }

    /// Whether the peer owes us a response PDU carrying our `sequence_number`.
    pub fn can_respond(&self) -> bool {
        matches!(
            self.body,
            PduBody::BindRequest(_)
                | PduBody::Unbind
                | PduBody::SubmitSm(_)
                | PduBody::DeliverSm(_)
                | PduBody::EnquireLink
        )
    }

    /// True for PDUs that are themselves a response to an earlier request.
    pub fn is_response(&self) -> bool {
        matches!(
            self.body,
            PduBody::BindResp(_)
                | PduBody::UnbindResp
                | PduBody::SubmitSmResp(_)
                | PduBody::DeliverSmResp(_)
                | PduBody::EnquireLinkResp
        )
    }

    /// Build the default successful response to this PDU, echoing `sequence_number`.
    /// Panics if `can_respond()` is false — callers are expected to check first, as the
    /// read loop in `session::workers` does.
    pub fn get_response(&self) -> Pdu {
        let body = match &self.body {
            PduBody::BindRequest(b) => PduBody::BindResp(BindRespBody {
                system_id: b.system_id.clone(),
            }),
            PduBody::Unbind => PduBody::UnbindResp,
            PduBody::SubmitSm(_) => PduBody::SubmitSmResp(SubmitSmRespBody::default()),
            PduBody::DeliverSm(_) => PduBody::DeliverSmResp(DeliverSmRespBody::default()),
            PduBody::EnquireLink => PduBody::EnquireLinkResp,
            other => panic!("{other:?} cannot be responded to"),
        };
        Pdu {
            command_status: ESME_ROK,
            sequence_number: self.sequence_number,
            body,
        }
    }

    pub fn enquire_link(sequence_number: u32) -> Pdu {
        Pdu {
            command_status: ESME_ROK,
            sequence_number,
            body: PduBody::EnquireLink,
        }
    }

    pub fn enquire_link_resp(sequence_number: u32) -> Pdu {
        Pdu {
            command_status: ESME_ROK,
            sequence_number,
            body: PduBody::EnquireLinkResp,
        }
    }

    pub fn unbind(sequence_number: u32) -> Pdu {
        Pdu {
            command_status: ESME_ROK,
            sequence_number,
            body: PduBody::Unbind,
        }
    }

    pub fn bind_request(sequence_number: u32, body: BindRequestBody) -> Pdu {
        Pdu {
            command_status: ESME_ROK,
            sequence_number,
            body: PduBody::BindRequest(body),
        }
    }

    pub fn bind_resp(sequence_number: u32, status: CommandStatus, system_id: String) -> Pdu {
        Pdu {
            command_status: status,
            sequence_number,
            body: PduBody::BindResp(BindRespBody { system_id }),
        }
    }

    pub fn submit_sm(sequence_number: u32, body: SubmitSmBody) -> Pdu {
        Pdu {
            command_status: ESME_ROK,
            sequence_number,
            body: PduBody::SubmitSm(body),
        }
    }

    pub fn deliver_sm(sequence_number: u32, body: DeliverSmBody) -> Pdu {
        Pdu {
            command_status: ESME_ROK,
            sequence_number,
            body: PduBody::DeliverSm(body),
        }
    }
}
