// src/error.rs
// =============================================================================
// Typed errors for the two places the crawler can fail in a way callers care
// about:
// - ConfigError: the crawl cannot start (bad seed, unreachable seed, bad
//   directory, ...)
// - FetchError: one URL could not be downloaded (the crawl carries on)
//
// Everything else (a failed mirror write, a failed checkpoint) is logged and
// swallowed where it happens, so it never needs a type here.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("unsupported scheme '{0}' (only http and https can be mirrored)")]
    UnsupportedScheme(String),

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("mirror root {0} exists but is not a directory")]
    MirrorRootNotADirectory(PathBuf),

    #[error("cannot create mirror root {path}: {source}")]
    MirrorRootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seed URL {url} could not be fetched: {source}")]
    SeedUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("authentication required for realm '{0}' and no credentials are configured")]
    Unauthorized(String),
}
