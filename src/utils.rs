// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt::Write;

use rand::Rng;

/// Generates a random 16-byte id and returns its lowercase hex representation. Used for
/// `Session::id`; doesn't need to be globally unique across restarts, only unique within
/// a running process.
pub fn generate_id() -> String {
    let mut raw = [0u8; 16];
    rand::rng().fill(&mut raw);

    let mut hex = String::with_capacity(32);
    for byte in &raw {
        write!(&mut hex, "{byte:02x}").expect("writing to String cannot fail");
    }
    hex
}

/// Current unix time in whole seconds, used for `submit_at`/`create_at`/`expired_at`.
pub fn now_unix() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}
