// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Submission records threaded between the write worker, the window, and the
//! application's callbacks.
//!
//! `trace` is the caller-supplied correlation value (the original's `any`-typed field
//! threaded through `TRequest`/`TResponse`). Rust has no ergonomic untyped `any` that
//! callbacks can downcast safely, so it is a type parameter `T` instead: an embedder
//! picks one concrete trace type per session (often `()` if unused).

use crate::error::SmppError;
use crate::pdu::Pdu;

/// Who originated a [`Request`]. System-originated requests (enquire-link replies,
/// unbind responses) never invoke `on_request`/`on_respond`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitter {
    System,
    User,
}

/// A submission record: one outbound PDU plus the bookkeeping needed to correlate its
/// response (or its timeout/channel-closed failure) back to the caller.
#[derive(Debug, Clone)]
pub struct Request<T> {
    pub pdu: Pdu,
    pub trace: T,
    pub session_id: String,
    pub system_id: String,
    /// Unix seconds set immediately before the wire write; `0` while still queued.
    pub submit_at: i64,
    /// Unix seconds set at enqueue time, before the request ever reaches the writer.
    /// Useful for measuring queue latency as `submit_at - create_at`.
    pub create_at: i64,
    pub submitter: Submitter,
}

impl<T> Request<T> {
    pub fn new(pdu: Pdu, trace: T, session_id: String, system_id: String, submitter: Submitter) -> Self {
        Request {
            pdu,
            trace,
            session_id,
            system_id,
            submit_at: 0,
            create_at: crate::utils::now_unix(),
            submitter,
        }
    }
}

/// The outcome of a [`Request`]: exactly one of `pdu` or `error` is ever populated.
/// Constructed only via [`Response::ok`]/[`Response::err`] to keep that invariant.
#[derive(Debug)]
pub struct Response<T> {
    pub request: Request<T>,
    pub pdu: Option<Pdu>,
    pub error: Option<SmppError>,
}

impl<T> Response<T> {
    pub fn ok(request: Request<T>, pdu: Pdu) -> Self {
        Response {
            request,
            pdu: Some(pdu),
            error: None,
        }
    }

    pub fn err(request: Request<T>, error: SmppError) -> Self {
        Response {
            request,
            pdu: None,
            error: Some(error),
        }
    }

    pub fn trace(&self) -> &T {
        &self.request.trace
    }

    pub fn session_id(&self) -> &str {
        &self.request.session_id
    }

    pub fn system_id(&self) -> &str {
        &self.request.system_id
    }

    pub fn submit_at(&self) -> i64 {
        self.request.submit_at
    }
}
