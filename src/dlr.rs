// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Delivery-receipt text format, embedded verbatim in a `DeliverSM.short_message`.
//!
//! ```text
//! id:<id> sub:<sub> dlvrd:<dlvrd> submit date:<sd> done date:<dd> stat:<stat> err:<err> text:<text>
//! ```

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SmppError;
use crate::pdu::{Address, DeliverSmBody, SM_SMSC_DLR_RECEIPT};

pub const DLR_STAT_ENROUTE: &str = "ENROUTE";
pub const DLR_STAT_DELIVERED: &str = "DELIVRD";
pub const DLR_STAT_EXPIRED: &str = "EXPIRED";
pub const DLR_STAT_DELETED: &str = "DELETED";
pub const DLR_STAT_UNDELIVERABLE: &str = "UNDELIV";
pub const DLR_STAT_ACCEPTED: &str = "ACCEPTD";
pub const DLR_STAT_UNKNOWN: &str = "UNKNOWN";
pub const DLR_STAT_REJECTED: &str = "REJECTD";

const DATE_FORMAT_10: &str = "%y%m%d%H%M";
const DATE_FORMAT_12: &str = "%y%m%d%H%M%S";

static DLR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^id:([\w\-]+) sub:(\d+) dlvrd:(\d+) submit date:(\d+) done date:(\d+) stat:(\w+) err:(\w+)$")
        .expect("static dlr pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dlr {
    pub id: String,
    pub sub: i64,
    pub dlvrd: i64,
    pub sd: NaiveDateTime,
    pub dd: NaiveDateTime,
    pub stat: String,
    pub err: String,
    pub text: String,
}

impl Dlr {
    /// Clamps `n` into the producer's 3-digit field: any value outside `[0, 999]`,
    /// negative or overflowing, renders as `"999"` rather than saturating to the
    /// nearest valid bound.
    pub fn build_dlr_num(n: i64) -> String {
        if !(0..=999).contains(&n) {
            "999".to_string()
        } else {
            format!("{n:03}")
        }
    }

    pub fn to_string_wire(&self) -> String {
        format!(
            "id:{} sub:{} dlvrd:{} submit date:{} done date:{} stat:{} err:{} text:{}",
            self.id,
            Self::build_dlr_num(self.sub),
            Self::build_dlr_num(self.dlvrd),
            self.sd.format(DATE_FORMAT_10),
            self.dd.format(DATE_FORMAT_10),
            self.stat,
            self.err,
            self.text,
        )
    }

    /// Build the `DeliverSm` body carrying this receipt as its `short_message`.
    pub fn pdu(&self, source: impl Into<String>, dest: impl Into<String>) -> DeliverSmBody {
        DeliverSmBody {
            source_addr: Address::international(source),
            dest_addr: Address::alphanumeric(dest),
            esm_class: SM_SMSC_DLR_RECEIPT,
            short_message: self.to_string_wire().into_bytes(),
            ..Default::default()
        }
    }

    pub fn parse(s: &str) -> Result<Dlr, SmppError> {
        let delim_idx = s
            .find(" text:")
            .or_else(|| s.find(" Text:"))
            .ok_or(SmppError::InvalidDlrFormat)?;

        let caps = DLR_PATTERN
            .captures(&s[..delim_idx])
            .ok_or(SmppError::InvalidDlrFormat)?;

        let sd = parse_dlr_date(&caps[4])?;
        let dd = parse_dlr_date(&caps[5])?;

        let text_start = delim_idx + 6;
        let text = if s.len() > text_start {
            s[text_start..].to_string()
        } else {
            String::new()
        };

        Ok(Dlr {
            id: caps[1].to_string(),
            sub: caps[2].parse().map_err(|_| SmppError::InvalidDlrFormat)?,
            dlvrd: caps[3].parse().map_err(|_| SmppError::InvalidDlrFormat)?,
            sd,
            dd,
            stat: caps[6].to_string(),
            err: caps[7].to_string(),
            text,
        })
    }
}

fn parse_dlr_date(s: &str) -> Result<NaiveDateTime, SmppError> {
    if let Ok(d) = NaiveDateTime::parse_from_str(s, DATE_FORMAT_10) {
        return Ok(d);
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(s, DATE_FORMAT_12) {
        return Ok(d);
    }
    if s.len() == 10 {
        if let Ok(secs) = s.parse::<i64>() {
            if let Some(d) = chrono::DateTime::from_timestamp(secs, 0) {
                return Ok(d.naive_utc());
            }
        }
    }
    if s.len() == 13 {
        if let Ok(millis) = s.parse::<i64>() {
            if let Some(d) = chrono::DateTime::from_timestamp_millis(millis) {
                return Ok(d.naive_utc());
            }
        }
    }
    Err(SmppError::InvalidDlrFormat)
}
