/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Logging and terminal output macros.
//!
//! Log messages go through [tracing], so a library user sees them in whatever
//! subscriber they install. The `oal` binary installs one with [init].

/// Logs a message unconditionally. Use this for errors or warnings.
///
/// The message is tagged with the module path, so it is clear where it comes
/// from.
macro_rules! log {
    ($($arg:tt)+) => {
        ::tracing::warn!(target: module_path!(), $($arg)+)
    }
}

/// Like [log], but for verbose things only needed when debugging. These are
/// only shown when enabled for the module, e.g. `RUST_LOG=oal::source=debug`.
macro_rules! log_dbg {
    ($($arg:tt)+) => {
        ::tracing::debug!(target: module_path!(), $($arg)+)
    }
}

/// Print a message (with implicit newline). This should be used for all
/// terminal output of the `oal` binary that isn't a log message.
macro_rules! echo {
    ($($arg:tt)+) => {
        eprintln!($($arg)+)
    };
    () => {
        eprintln!()
    };
}

/// Filter used when `RUST_LOG` isn't set.
pub const DEFAULT_FILTER: &str = "oal=info";

/// Install a formatting subscriber filtered by `RUST_LOG`. Does nothing if a
/// global subscriber is already set.
pub fn init() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
