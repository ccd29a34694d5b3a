// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Wire encode/decode for [`Pdu`](super::Pdu).
//!
//! SMPP v3.4 frames a PDU as a 16-byte header (`command_length`, `command_id`,
//! `command_status`, `sequence_number`, all big-endian `u32`) followed by a body whose
//! layout depends on `command_id`. String fields are NULL-terminated ("C-octet string"
//! in the spec's language); `short_message` is length-prefixed by a single `sm_length`
//! octet rather than NULL-terminated, since message bodies are free-form bytes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{
    Address, AlertNotificationBody, BindRequestBody, BindRespBody, BindType, CommandId,
    DeliverSmBody, DeliverSmRespBody, OutbindBody, Pdu, PduBody, SubmitSmBody, SubmitSmRespBody,
};
use crate::error::SmppError;

const HEADER_LEN: usize = 16;

/// The wire boundary this crate treats as swappable: an embedder who has (or prefers) a
/// different SMPP codec can implement this trait instead of using [`WireCodec`].
pub trait PduCodec {
    fn marshal(pdu: &Pdu) -> Vec<u8>;
    fn parse(buf: &[u8]) -> Result<Pdu, SmppError>;
}

pub struct WireCodec;

impl PduCodec for WireCodec {
    fn marshal(pdu: &Pdu) -> Vec<u8> {
        marshal(pdu)
    }

    fn parse(buf: &[u8]) -> Result<Pdu, SmppError> {
        parse_body(pdu_command_id_of(buf)?, pdu_status_of(buf)?, pdu_seq_of(buf)?, &buf[HEADER_LEN..])
    }
}

fn pdu_command_id_of(buf: &[u8]) -> Result<u32, SmppError> {
    Ok(u32::from_be_bytes(buf[4..8].try_into().map_err(|_| SmppError::InvalidPdu)?))
}

fn pdu_status_of(buf: &[u8]) -> Result<u32, SmppError> {
    Ok(u32::from_be_bytes(buf[8..12].try_into().map_err(|_| SmppError::InvalidPdu)?))
}

fn pdu_seq_of(buf: &[u8]) -> Result<u32, SmppError> {
    Ok(u32::from_be_bytes(buf[12..16].try_into().map_err(|_| SmppError::InvalidPdu)?))
}

fn put_cstring(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

fn take_cstring<'a>(buf: &'a [u8]) -> (String, &'a [u8]) {
    match buf.iter().position(|&b| b == 0) {
        Some(idx) => (
            String::from_utf8_lossy(&buf[..idx]).into_owned(),
            &buf[idx + 1..],
        ),
        None => (String::from_utf8_lossy(buf).into_owned(), &[]),
    }
}

fn take_u8(buf: &[u8]) -> (u8, &[u8]) {
    if buf.is_empty() {
        (0, buf)
    } else {
        (buf[0], &buf[1..])
    }
}

/// Encode a full PDU (header + body) to bytes ready to write to the wire.
pub fn marshal(pdu: &Pdu) -> Vec<u8> {
    let mut body = Vec::new();
    match &pdu.body {
        PduBody::BindRequest(b) => {
            put_cstring(&mut body, &b.system_id);
            put_cstring(&mut body, &b.password);
            put_cstring(&mut body, &b.system_type);
            body.push(b.interface_version);
            body.push(b.addr_ton);
            body.push(b.addr_npi);
            put_cstring(&mut body, &b.address_range);
        }
        PduBody::BindResp(b) => {
            put_cstring(&mut body, &b.system_id);
        }
        PduBody::Outbind(b) => {
            put_cstring(&mut body, &b.system_id);
            put_cstring(&mut body, &b.password);
        }
        PduBody::Unbind | PduBody::UnbindResp | PduBody::EnquireLink | PduBody::EnquireLinkResp
        | PduBody::GenericNack => {}
        PduBody::SubmitSm(b) => marshal_sm(&mut body, b),
        PduBody::SubmitSmResp(b) => put_cstring(&mut body, &b.message_id),
        PduBody::DeliverSm(b) => marshal_dlr_sm(&mut body, b),
        PduBody::DeliverSmResp(b) => put_cstring(&mut body, &b.message_id),
        PduBody::AlertNotification(b) => {
            body.push(b.source_addr.ton);
            body.push(b.source_addr.npi);
            put_cstring(&mut body, &b.source_addr.addr);
            body.push(b.esme_addr.ton);
            body.push(b.esme_addr.npi);
            put_cstring(&mut body, &b.esme_addr.addr);
        }
    }

    let command_id = pdu.command_id() as u32;
    let total_len = (HEADER_LEN + body.len()) as u32;
    let mut out = Vec::with_capacity(total_len as usize);
    out.extend_from_slice(&total_len.to_be_bytes());
    out.extend_from_slice(&command_id.to_be_bytes());
    out.extend_from_slice(&pdu.command_status.to_be_bytes());
    out.extend_from_slice(&pdu.sequence_number.to_be_bytes());
    out.extend_from_slice(&body);
    out
}

fn marshal_sm(body: &mut Vec<u8>, b: &SubmitSmBody) {
    put_cstring(body, &b.service_type);
    body.push(b.source_addr.ton);
    body.push(b.source_addr.npi);
    put_cstring(body, &b.source_addr.addr);
    body.push(b.dest_addr.ton);
    body.push(b.dest_addr.npi);
    put_cstring(body, &b.dest_addr.addr);
    body.push(b.esm_class);
    body.push(b.protocol_id);
    body.push(b.priority_flag);
    body.push(b.registered_delivery);
    body.push(b.data_coding);
    body.push(b.short_message.len().min(255) as u8);
    body.extend_from_slice(&b.short_message[..b.short_message.len().min(255)]);
}

fn marshal_dlr_sm(body: &mut Vec<u8>, b: &DeliverSmBody) {
    put_cstring(body, &b.service_type);
    body.push(b.source_addr.ton);
    body.push(b.source_addr.npi);
    put_cstring(body, &b.source_addr.addr);
    body.push(b.dest_addr.ton);
    body.push(b.dest_addr.npi);
    put_cstring(body, &b.dest_addr.addr);
    body.push(b.esm_class);
    body.push(b.protocol_id);
    body.push(b.priority_flag);
    body.push(b.data_coding);
    body.push(b.short_message.len().min(255) as u8);
    body.extend_from_slice(&b.short_message[..b.short_message.len().min(255)]);
}

fn parse_body(
    command_id: u32,
    command_status: u32,
    sequence_number: u32,
    body: &[u8],
) -> Result<Pdu, SmppError> {
    let id = CommandId::from_u32(command_id).ok_or(SmppError::InvalidPdu)?;
    let pdu_body = match id {
        CommandId::BindReceiver | CommandId::BindTransmitter | CommandId::BindTransceiver => {
            let (system_id, b) = take_cstring(body);
            let (password, b) = take_cstring(b);
            let (system_type, b) = take_cstring(b);
            let (interface_version, b) = take_u8(b);
            let (addr_ton, b) = take_u8(b);
            let (addr_npi, b) = take_u8(b);
            let (address_range, _) = take_cstring(b);
            let bind_type = match id {
                CommandId::BindReceiver => BindType::Receiver,
                CommandId::BindTransmitter => BindType::Transmitter,
                _ => BindType::Transceiver,
            };
            PduBody::BindRequest(BindRequestBody {
                system_id,
                password,
                system_type,
                interface_version,
                addr_ton,
                addr_npi,
                address_range,
                bind_type,
            })
        }
        CommandId::BindReceiverResp | CommandId::BindTransmitterResp | CommandId::BindTransceiverResp => {
            let (system_id, _) = take_cstring(body);
            PduBody::BindResp(BindRespBody { system_id })
        }
        CommandId::Outbind => {
            let (system_id, b) = take_cstring(body);
            let (password, _) = take_cstring(b);
            PduBody::Outbind(OutbindBody { system_id, password })
        }
        CommandId::Unbind => PduBody::Unbind,
        CommandId::UnbindResp => PduBody::UnbindResp,
        CommandId::EnquireLink => PduBody::EnquireLink,
        CommandId::EnquireLinkResp => PduBody::EnquireLinkResp,
        CommandId::GenericNack => PduBody::GenericNack,
        CommandId::SubmitSm => PduBody::SubmitSm(parse_sm(body)),
        CommandId::SubmitSmResp => {
            let (message_id, _) = take_cstring(body);
            PduBody::SubmitSmResp(SubmitSmRespBody { message_id })
        }
        CommandId::DeliverSm => PduBody::DeliverSm(parse_deliver_sm(body)),
        CommandId::DeliverSmResp => {
            let (message_id, _) = take_cstring(body);
            PduBody::DeliverSmResp(DeliverSmRespBody { message_id })
        }
        CommandId::AlertNotification => {
            let (source_ton, b) = take_u8(body);
            let (source_npi, b) = take_u8(b);
            let (source_addr, b) = take_cstring(b);
            let (esme_ton, b) = take_u8(b);
            let (esme_npi, b) = take_u8(b);
            let (esme_addr, _) = take_cstring(b);
            PduBody::AlertNotification(AlertNotificationBody {
                source_addr: Address::new(source_ton, source_npi, source_addr),
                esme_addr: Address::new(esme_ton, esme_npi, esme_addr),
            })
        }
    };
    Ok(Pdu {
        command_status,
        sequence_number,
        body: pdu_body,
    })
}

fn parse_sm(body: &[u8]) -> SubmitSmBody {
    let (service_type, b) = take_cstring(body);
    let (src_ton, b) = take_u8(b);
    let (src_npi, b) = take_u8(b);
    let (source_addr, b) = take_cstring(b);
    let (dst_ton, b) = take_u8(b);
    let (dst_npi, b) = take_u8(b);
    let (dest_addr, b) = take_cstring(b);
    let (esm_class, b) = take_u8(b);
    let (protocol_id, b) = take_u8(b);
    let (priority_flag, b) = take_u8(b);
    let (registered_delivery, b) = take_u8(b);
    let (data_coding, b) = take_u8(b);
    let (sm_length, b) = take_u8(b);
    let short_message = b[..(sm_length as usize).min(b.len())].to_vec();
    SubmitSmBody {
        service_type,
        source_addr: Address::new(src_ton, src_npi, source_addr),
        dest_addr: Address::new(dst_ton, dst_npi, dest_addr),
        esm_class,
        protocol_id,
        priority_flag,
        registered_delivery,
        data_coding,
        short_message,
    }
}

fn parse_deliver_sm(body: &[u8]) -> DeliverSmBody {
    let (service_type, b) = take_cstring(body);
    let (src_ton, b) = take_u8(b);
    let (src_npi, b) = take_u8(b);
    let (source_addr, b) = take_cstring(b);
    let (dst_ton, b) = take_u8(b);
    let (dst_npi, b) = take_u8(b);
    let (dest_addr, b) = take_cstring(b);
    let (esm_class, b) = take_u8(b);
    let (protocol_id, b) = take_u8(b);
    let (priority_flag, b) = take_u8(b);
    let (data_coding, b) = take_u8(b);
    let (sm_length, b) = take_u8(b);
    let short_message = b[..(sm_length as usize).min(b.len())].to_vec();
    DeliverSmBody {
        service_type,
        source_addr: Address::new(src_ton, src_npi, source_addr),
        dest_addr: Address::new(dst_ton, dst_npi, dest_addr),
        esm_class,
        protocol_id,
        priority_flag,
        data_coding,
        short_message,
    }
}

/// Read one full PDU off an async byte stream: the 4-byte `command_length` prefix
/// determines how much more to read before handing the frame to [`WireCodec::parse`].
pub async fn read_pdu<R: AsyncRead + Unpin + Send>(r: &mut R) -> Result<Pdu, SmppError> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).await?;
    let total_len = u32::from_be_bytes(len_buf) as usize;
    if total_len < HEADER_LEN {
        return Err(SmppError::InvalidPdu);
    }
    let mut rest = vec![0u8; total_len - 4];
    r.read_exact(&mut rest).await?;
    let mut full = Vec::with_capacity(total_len);
    full.extend_from_slice(&len_buf);
    full.extend_from_slice(&rest);
    WireCodec::parse(&full)
}

/// Write one full PDU to an async byte stream.
pub async fn write_pdu<W: AsyncWrite + Unpin + Send>(w: &mut W, pdu: &Pdu) -> Result<(), SmppError> {
    let bytes = marshal(pdu);
    w.write_all(&bytes).await?;
    w.flush().await?;
    Ok(())
}
