//! Diagnostic logging setup.
//!
//! All diagnostics go through `tracing` and are written to stderr so
//! that `--format json` output on stdout stays machine-readable.

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global `tracing` subscriber.
///
/// An explicit `directive` wins over `RUST_LOG`.
pub fn init(directive: Option<&str>) -> Result<()> {
    let filter = build_filter(directive)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}

fn build_filter(directive: Option<&str>) -> Result<EnvFilter> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter {directive:?}")),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}
