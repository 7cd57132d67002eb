//! Observability and telemetry.

use crate::{Error, Result};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Options for environment-based initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes structured logging for the process.
///
/// The filter comes from `RUST_LOG` when set; otherwise `debug` with
/// the verbose flag, `info` without.
///
/// # Errors
///
/// Returns an error if logging has already been initialized.
pub fn init_from_env(options: InitOptions) -> Result<()> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::operation(
            "observability_init",
            "observability already initialized",
        ));
    }

    let default_level = if options.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::operation("observability_init", e))?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::operation("observability_init", "failed to mark initialized"))?;
    Ok(())
}
