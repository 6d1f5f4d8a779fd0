// src/fetch/mod.rs
// =============================================================================
// Getting bytes for a URL.
//
// Submodules:
// - http: the real network fetcher, built on reqwest
// - auth: where basic-auth credentials come from
//
// The crawler itself only knows the Fetcher trait, so tests can plug in a
// fetcher that serves a made-up site from memory.
// =============================================================================

mod auth;
mod http;

pub use auth::{CredentialProvider, Credentials, NoCredentials, StaticCredentials};
pub use http::HttpFetcher;

use crate::error::FetchError;
use async_trait::async_trait;
use url::Url;

// Used when a server doesn't send a Content-Type header
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// What a successful network fetch hands back
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// One resource a worker is holding for the current cycle, whether it came
// from the network or from the mirror on disk.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: Url,
    /// MIME type: the server's header for network fetches, a guess from the
    /// extension for files read back from disk
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Was a file for this URL already mirrored when the cycle started?
    pub existed_on_disk_before: bool,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    // Downloads one URL. Non-2xx responses are errors.
    async fn fetch(&self, url: &Url) -> Result<FetchedPayload, FetchError>;
}
