// src/lib.rs
// =============================================================================
// mirror-spider: mirrors a website into a local directory.
//
// Modules:
// - config: what to crawl and how (CrawlConfig)
// - crawl: the work queue, workers, checkpoints and the Crawler engine
// - extract: finding links in fetched pages
// - fetch: downloading over HTTP(S), with basic-auth support
// - store: the on-disk mirror
// - error: typed errors for config and fetch failures
// - logging: stderr log output for the CLI
//
// A minimal crawl:
//
//   let config = CrawlConfig::new(parse_seed("https://example.com/")?);
//   let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout(),
//                                  Arc::new(NoCredentials))?;
//   let mail_log = FileMailLog::new(&config.mail_log_path);
//   let crawler = Crawler::new(config, Arc::new(fetcher), Arc::new(mail_log))?;
//   let stats = crawler.run().await?;
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod store;

pub use config::{parse_seed, CrawlConfig, RefreshPolicy};
pub use crawl::{CrawlStats, Crawler, UrlRef, WorkQueue};
pub use error::{ConfigError, FetchError};
