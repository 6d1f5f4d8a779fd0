// src/logging.rs
// =============================================================================
// Log output for the command-line tool.
//
// Library code only emits `tracing` events; it never decides where they go.
// The binary calls `init()` once to print them to stderr. Tests and embedders
// can install their own subscriber instead.
//
// Level selection:
// - RUST_LOG, when set, wins (e.g. RUST_LOG=mirror_spider=debug,reqwest=warn)
// - otherwise -v gives debug, -vv gives trace, and the default is info
// =============================================================================

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

// Maps the number of -v flags to a default filter directive
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(5), "trace");
    }
}
