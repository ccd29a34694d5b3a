// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Logger bootstrap for embedders that don't already run their own `tracing`
//! subscriber (demos, standalone binaries, integration tests).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a JSON-formatted, env-filtered subscriber on stdout as the process-global
/// default. `default_level` is used when `RUST_LOG` is unset.
pub fn init_logger(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let json_layer = fmt::layer().with_ansi(false).json().with_target(true).with_line_number(true);

    tracing_subscriber::registry().with(env_filter).with(json_layer).try_init()?;

    Ok(())
}
