// src/fetch/http.rs
// =============================================================================
// This module downloads resources over HTTP(S).
//
// Key functionality:
// - One shared reqwest Client (connection pooling across all workers)
// - Configurable user agent and per-request timeout
// - Follows redirects (up to a limit)
// - Answers basic-auth challenges: on a 401 we look up credentials for the
//   server's realm and retry once
//
// Anything other than a 2xx response is a FetchError. The crawl worker logs
// it and moves on; nothing here retries on its own.
// =============================================================================

use super::auth::CredentialProvider;
use super::{FetchedPayload, Fetcher, DEFAULT_CONTENT_TYPE};
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

const MAX_REDIRECTS: usize = 10;

pub struct HttpFetcher {
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpFetcher {
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client, credentials })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPayload, FetchError> {
        let mut response = self.client.get(url.clone()).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // No realm in the challenge? Fall back to the host name.
            let realm = basic_realm(response.headers())
                .unwrap_or_else(|| url.host_str().unwrap_or_default().to_string());
            let credentials = self
                .credentials
                .credentials_for(&realm)
                .ok_or_else(|| FetchError::Unauthorized(realm.clone()))?;

            debug!(url = %url, realm = %realm, user = %credentials.username, "retrying with basic auth");
            response = self
                .client
                .get(url.clone())
                .basic_auth(&credentials.username, Some(&credentials.password))
                .send()
                .await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(FetchedPayload { content_type, bytes })
    }
}

// Pulls the realm out of `WWW-Authenticate: Basic realm="..."`.
//
// Returns None for other schemes (Digest, Bearer, ...) or a missing realm.
fn basic_realm(headers: &HeaderMap) -> Option<String> {
    let challenge = headers.get(WWW_AUTHENTICATE)?.to_str().ok()?.trim();
    let (scheme, params) = challenge.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let lowered = params.to_ascii_lowercase();
    let start = lowered.find("realm=")? + "realm=".len();
    let value = &params[start..];
    let realm = match value.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next()?,
        None => value.split(|c: char| c == ',' || c.is_whitespace()).next()?,
    };
    Some(realm.to_string())
}
