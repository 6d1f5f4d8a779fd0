// src/extract/mail_log.rs
// =============================================================================
// Side channel for `mailto:` links.
//
// Mail links are never crawled, but they are still worth keeping: every one
// the extractor sees is handed to a MailLog along with the page it came
// from. The file-backed log appends one reference per line; failures are
// logged and otherwise ignored, since losing a mail address must never stop
// a crawl.
// =============================================================================

use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

pub trait MailLog: Send + Sync {
    // Records one mail reference found on `page`
    fn record(&self, page: &Url, reference: &str);
}

// Appends references to a text file, one per line
#[derive(Debug)]
pub struct FileMailLog {
    path: PathBuf,
    // Serializes appends so lines from different workers never interleave
    write_lock: Mutex<()>,
}

impl FileMailLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, reference: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", reference)
    }
}

impl MailLog for FileMailLog {
    fn record(&self, page: &Url, reference: &str) {
        debug!(page = %page, reference, "found mail link");
        if let Err(e) = self.append(reference) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "could not append mail link"
            );
        }
    }
}

// Keeps references in memory, keyed by page. Handy when the caller wants
// the addresses rather than a file.
#[derive(Debug, Default)]
pub struct MemoryMailLog {
    entries: Mutex<Vec<(Url, String)>>,
}

impl MemoryMailLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Url, String)> {
        self.entries.lock().clone()
    }
}

impl MailLog for MemoryMailLog {
    fn record(&self, page: &Url, reference: &str) {
        self.entries.lock().push((page.clone(), reference.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_log_appends_lines() {
        let dir = TempDir::new().unwrap();
        let log = FileMailLog::new(dir.path().join("mailto.txt"));
        let page = Url::parse("http://x/contact").unwrap();

        log.record(&page, "mailto:a@x.com");
        log.record(&page, "mailto:b@x.com");

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(text, "mailto:a@x.com\nmailto:b@x.com\n");
    }

    #[test]
    fn test_unwritable_log_does_not_panic() {
        let dir = TempDir::new().unwrap();
        // Parent directory does not exist, so every append fails
        let log = FileMailLog::new(dir.path().join("missing").join("mailto.txt"));
        let page = Url::parse("http://x/").unwrap();
        log.record(&page, "mailto:a@x.com");
        assert!(!log.path().exists());
    }

    #[test]
    fn test_memory_log_keeps_page() {
        let log = MemoryMailLog::new();
        let page = Url::parse("http://x/about").unwrap();
        log.record(&page, "mailto:me@x.com");
        assert_eq!(log.entries(), vec![(page, "mailto:me@x.com".to_string())]);
    }
}
