// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands share the same set of crawl options:
// - crawl: mirror a site
// - save-config: write the resolved options to a JSON file for later use
//
// Options can come from a JSON file (--config) and from flags. Flags always
// win, so a saved config can be reused with small tweaks.
// =============================================================================

use anyhow::{bail, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use mirror_spider::{parse_seed, CrawlConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mirror-spider",
    version,
    about = "Mirror a website into a local directory",
    long_about = "mirror-spider starts from a seed URL, downloads every page, image and \
                  stylesheet it can reach (up to an optional depth) and saves them under a \
                  local directory laid out like the site."
)]
pub struct Cli {
    /// More log output (-v for debug, -vv for trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mirror a website
    ///
    /// Example: mirror-spider crawl https://example.com/ --dir ./mirror --max-depth 2
    Crawl {
        #[command(flatten)]
        options: CrawlOptions,

        /// Continue from the checkpoint file if one exists
        #[arg(long)]
        resume: bool,

        /// Print the final statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the resolved configuration to a JSON file without crawling
    ///
    /// Example: mirror-spider save-config site.json https://example.com/ --workers 2
    SaveConfig {
        /// Where to write the configuration
        output: PathBuf,

        #[command(flatten)]
        options: CrawlOptions,
    },
}

#[derive(Args, Debug)]
pub struct CrawlOptions {
    /// URL to start from (may be omitted when --config provides one)
    pub seed: Option<String>,

    /// Load settings from a JSON config file first
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory to write the mirror into
    #[arg(short, long = "dir", value_name = "DIR")]
    pub mirror_root: Option<PathBuf>,

    /// Maximum link depth to follow (0 = unlimited)
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Only follow links whose URL contains this text
    #[arg(long = "match", value_name = "TEXT")]
    pub url_match: Option<String>,

    /// Download HTML/XML pages again even if they are already mirrored
    #[arg(long)]
    pub refresh_html: bool,

    /// Download images again even if they are already mirrored
    #[arg(long)]
    pub refresh_images: bool,

    /// Milliseconds between checkpoints (0 = no checkpoints)
    #[arg(long, value_name = "MILLIS")]
    pub checkpoint_interval: Option<u64>,

    /// Where the checkpoint is written
    #[arg(long, value_name = "FILE")]
    pub checkpoint_file: Option<PathBuf>,

    /// File that collects discovered mailto: links
    #[arg(long, value_name = "FILE")]
    pub mail_log: Option<PathBuf>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Username for sites behind HTTP basic auth
    #[arg(long)]
    pub user: Option<String>,

    /// Password for sites behind HTTP basic auth
    #[arg(long)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl CrawlOptions {
    // Builds the final config: file first (if any), then flags on top
    pub fn resolve(&self) -> Result<CrawlConfig> {
        let mut config = match (&self.config, &self.seed) {
            (Some(path), _) => CrawlConfig::load(path)?,
            (None, Some(seed)) => CrawlConfig::new(parse_seed(seed)?),
            (None, None) => bail!("a seed URL is required unless --config is given"),
        };

        if let (Some(_), Some(seed)) = (&self.config, &self.seed) {
            config.seed = parse_seed(seed)?;
        }
        if let Some(dir) = &self.mirror_root {
            config.mirror_root = dir.clone();
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(url_match) = &self.url_match {
            config.url_match = url_match.clone();
        }
        // A flag can switch refresh on, but never off, over a config file
        config.refresh.html |= self.refresh_html;
        config.refresh.images |= self.refresh_images;
        if let Some(interval) = self.checkpoint_interval {
            config.checkpoint_interval_ms = interval;
        }
        if let Some(path) = &self.checkpoint_file {
            config.checkpoint_path = path.clone();
        }
        if let Some(path) = &self.mail_log {
            config.mail_log_path = path.clone();
        }
        if let Some(agent) = &self.user_agent {
            config.user_agent = agent.clone();
        }
        if let Some(user) = &self.user {
            config.basic_auth_user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.basic_auth_password = Some(password.clone());
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }

        Ok(config)
    }
}
