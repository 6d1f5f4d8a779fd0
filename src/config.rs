// src/config.rs
// =============================================================================
// Everything a crawl run needs to know up front.
//
// A CrawlConfig is built once (from CLI flags, a JSON file, or both) and then
// shared read-only by every worker for the whole run.
//
// JSON files only need a "seed"; every other field has a default, so a
// minimal config looks like:
//
//   { "seed": "https://example.com/", "max_depth": 2 }
// =============================================================================

use crate::error::ConfigError;
use crate::fetch::Credentials;
use crate::store::ContentClass;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CHECKPOINT_FILE: &str = "spider.checkpoint";
pub const DEFAULT_MAIL_LOG_FILE: &str = "mailto.txt";

// Which already-mirrored resources get downloaded again
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPolicy {
    /// Re-fetch HTML and XML pages that are already on disk
    #[serde(default)]
    pub html: bool,
    /// Re-fetch images that are already on disk
    #[serde(default)]
    pub images: bool,
}

impl RefreshPolicy {
    // Exactly one flag applies per class; other content is never refreshed
    pub fn should_refetch(&self, class: ContentClass) -> bool {
        match class {
            ContentClass::Html | ContentClass::Xml => self.html,
            ContentClass::Image => self.images,
            ContentClass::Other => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Where the crawl starts
    pub seed: Url,

    /// Directory the mirror is written into
    #[serde(default = "default_mirror_root")]
    pub mirror_root: PathBuf,

    /// Deepest link level to follow (0 = no limit)
    #[serde(default)]
    pub max_depth: u32,

    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Only follow links whose URL contains this text (empty = all)
    #[serde(default)]
    pub url_match: String,

    #[serde(default)]
    pub refresh: RefreshPolicy,

    /// Milliseconds between automatic checkpoints (0 = never)
    #[serde(default)]
    pub checkpoint_interval_ms: u64,

    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Where discovered mailto: links are appended
    #[serde(default = "default_mail_log_path")]
    pub mail_log_path: PathBuf,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_password: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_mirror_root() -> PathBuf {
    PathBuf::from("mirror")
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from(DEFAULT_CHECKPOINT_FILE)
}

fn default_mail_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_MAIL_LOG_FILE)
}

fn default_user_agent() -> String {
    format!("mirror-spider/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl CrawlConfig {
    // A config with every default filled in
    pub fn new(seed: Url) -> Self {
        Self {
            seed,
            mirror_root: default_mirror_root(),
            max_depth: 0,
            workers: DEFAULT_WORKERS,
            url_match: String::new(),
            refresh: RefreshPolicy::default(),
            checkpoint_interval_ms: 0,
            checkpoint_path: default_checkpoint_path(),
            mail_log_path: default_mail_log_path(),
            user_agent: default_user_agent(),
            basic_auth_user: None,
            basic_auth_password: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    // Reads a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    // Writes this config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("writing config file {}", path.display()))?;
        Ok(())
    }

    // Checks the things that would make a crawl pointless to start
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.seed.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.mirror_root.exists() && !self.mirror_root.is_dir() {
            return Err(ConfigError::MirrorRootNotADirectory(self.mirror_root.clone()));
        }
        Ok(())
    }

    // Creates the mirror root if it isn't there yet
    pub fn prepare_mirror_root(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.mirror_root).map_err(|source| {
            ConfigError::MirrorRootUnavailable {
                path: self.mirror_root.clone(),
                source,
            }
        })
    }

    // Does a discovered URL pass the match filter?
    pub fn matches(&self, url: &Url) -> bool {
        self.url_match.is_empty() || url.as_str().contains(&self.url_match)
    }

    // Is a link at this depth still inside the crawl?
    pub fn within_depth(&self, depth: u32) -> bool {
        self.max_depth == 0 || depth <= self.max_depth
    }

    pub fn checkpoint_interval(&self) -> Option<Duration> {
        match self.checkpoint_interval_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    // Basic-auth credentials, if a username was configured
    pub fn credentials(&self) -> Option<Credentials> {
        self.basic_auth_user.as_ref().map(|user| {
            Credentials::new(user.clone(), self.basic_auth_password.clone().unwrap_or_default())
        })
    }
}

// Parses a seed URL from user input
pub fn parse_seed(input: &str) -> Result<Url, ConfigError> {
    Url::parse(input).map_err(|e| ConfigError::InvalidSeed {
        url: input.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> CrawlConfig {
        CrawlConfig::new(Url::parse("http://x/").unwrap())
    }

    #[test]
    fn test_refresh_policy_per_class() {
        let html_only = RefreshPolicy { html: true, images: false };
        assert!(html_only.should_refetch(ContentClass::Html));
        assert!(html_only.should_refetch(ContentClass::Xml));
        assert!(!html_only.should_refetch(ContentClass::Image));

        let images_only = RefreshPolicy { html: false, images: true };
        assert!(images_only.should_refetch(ContentClass::Image));
        assert!(!images_only.should_refetch(ContentClass::Html));

        let both = RefreshPolicy { html: true, images: true };
        assert!(!both.should_refetch(ContentClass::Other));
    }

    #[test]
    fn test_match_filter() {
        let mut config = config();
        assert!(config.matches(&Url::parse("http://x/blog").unwrap()));

        config.url_match = "docs".to_string();
        assert!(!config.matches(&Url::parse("http://x/blog").unwrap()));
        assert!(config.matches(&Url::parse("http://x/docs/a").unwrap()));
    }

    #[test]
    fn test_depth_limit() {
        let mut config = config();
        assert!(config.within_depth(1000));

        config.max_depth = 1;
        assert!(config.within_depth(1));
        assert!(!config.within_depth(2));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut config = CrawlConfig::new(Url::parse("ftp://x/").unwrap());
        assert!(matches!(config.validate(), Err(ConfigError::UnsupportedScheme(s)) if s == "ftp"));

        config.seed = Url::parse("https://x/").unwrap();
        config.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        config.workers = 1;
        config.mirror_root = file;
        assert!(matches!(config.validate(), Err(ConfigError::MirrorRootNotADirectory(_))));
    }

    #[test]
    fn test_parse_seed() {
        assert!(parse_seed("https://example.com").is_ok());
        assert!(matches!(parse_seed("not a url"), Err(ConfigError::InvalidSeed { .. })));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spider.json");

        let mut config = config();
        config.max_depth = 3;
        config.url_match = "docs".to_string();
        config.refresh.images = true;
        config.basic_auth_user = Some("bob".to_string());
        config.save(&path).unwrap();

        assert_eq!(CrawlConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spider.json");
        std::fs::write(&path, r#"{ "seed": "https://example.com/" }"#).unwrap();

        let config = CrawlConfig::load(&path).unwrap();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.max_depth, 0);
        assert_eq!(config.checkpoint_interval(), None);
        assert_eq!(config.credentials(), None);
    }

    #[test]
    fn test_credentials_default_password() {
        let mut config = config();
        config.basic_auth_user = Some("bob".to_string());
        assert_eq!(config.credentials(), Some(Credentials::new("bob", "")));
    }
}
