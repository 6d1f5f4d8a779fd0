// src/store/mod.rs
// =============================================================================
// The local mirror: where every fetched URL ends up on disk.
//
// Layout (under the configured root directory):
//   http://example.com            -> <root>/example.com/index.html
//   http://example.com/docs/      -> <root>/example.com/docs/index.html
//   http://example.com/a.png      -> <root>/example.com/a.png
//   http://example.com/s?q=1&p=2  -> <root>/example.com/s%3Fq=1%26p=2
//
// The store also answers "do we already have this?" so workers can skip the
// network for content mirrored by an earlier run.
//
// Writes go to a temporary sibling file first and are renamed into place, so
// a crash mid-write never leaves a truncated file that a later run would
// mistake for a complete one.
// =============================================================================

mod content_type;

pub use content_type::{guess_mime, ContentClass};

use crate::crawl::normalized_key;
use std::io;
use std::path::PathBuf;
use url::Url;

// File name used when a URL names a directory
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // Maps an absolute URL to its file under the mirror root. The result
    // never climbs out of the root: dot segments are kept as literal names.
    pub fn local_path_for(&self, url: &Url) -> PathBuf {
        relative_path(url)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment {
                "." => "%2E",
                ".." => "%2E%2E",
                other => other,
            })
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    // True only for a regular file; a bare directory does not count
    pub async fn exists(&self, url: &Url) -> bool {
        tokio::fs::metadata(self.local_path_for(url))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    pub async fn read(&self, url: &Url) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.local_path_for(url)).await
    }

    // Saves the bytes for a URL, creating parent directories on demand.
    //
    // Returns the final path on success.
    pub async fn write(&self, url: &Url, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.local_path_for(url);
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
        tokio::fs::create_dir_all(parent).await?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| INDEX_FILE.to_string());
        let partial = parent.join(format!(".{}.part", file_name));

        tokio::fs::write(&partial, bytes).await?;
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            // Don't leave the half-way file lying around
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        Ok(path)
    }
}

// Builds the '/'-separated path for a URL, relative to the mirror root
fn relative_path(url: &Url) -> String {
    let full = normalized_key(url);
    let without_scheme = match full.find("://") {
        Some(idx) => &full[idx + 3..],
        None => full,
    };

    // The query belongs to the last file name, so its slashes must not
    // open new directories
    let mut relative = match without_scheme.split_once('?') {
        Some((path, query)) => format!("{}?{}", path, query.replace('/', "%2F")),
        None => without_scheme.to_string(),
    };

    // A bare host name ("example.com") still needs a file inside it
    if !relative.contains('/') {
        relative.push('/');
    }
    if relative.ends_with('/') {
        relative.push_str(INDEX_FILE);
    }

    // Keep query strings from being read as anything but a file name
    relative
        .replace('?', "%3F")
        .replace('&', "%26")
        .replace('\\', "%5C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Component;
    use tempfile::TempDir;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_host_only_gets_index() {
        let store = ContentStore::new("/mirror");
        assert_eq!(
            store.local_path_for(&url("http://example.com")),
            PathBuf::from("/mirror/example.com/index.html")
        );
    }

    #[test]
    fn test_trailing_slash_gets_index() {
        let store = ContentStore::new("/mirror");
        assert_eq!(
            store.local_path_for(&url("https://example.com/docs/")),
            PathBuf::from("/mirror/example.com/docs/index.html")
        );
    }

    #[test]
    fn test_query_metacharacters_are_encoded() {
        let store = ContentStore::new("/mirror");
        assert_eq!(
            store.local_path_for(&url("http://example.com/search?q=1&page=2")),
            PathBuf::from("/mirror/example.com/search%3Fq=1%26page=2")
        );
    }

    #[test]
    fn test_paths_never_leave_the_root() {
        let store = ContentStore::new("/mirror");
        for link in [
            "http://x/a?/../../../../escaped.txt",
            "http://x/?q=../../etc/passwd",
            "http://x/a/%2e%2e/%2E%2E/b",
            "http://x/..%2F..%2Fb",
            "http://x/a?..",
            "http://x/a?x=1\\..\\..\\b",
        ] {
            let path = store.local_path_for(&url(link));
            assert!(path.starts_with("/mirror/x"), "{} -> {}", link, path.display());
            assert!(
                !path.components().any(|c| matches!(c, Component::ParentDir | Component::CurDir)),
                "{} -> {}",
                link,
                path.display()
            );
        }
    }

    #[test]
    fn test_query_slashes_stay_in_file_name() {
        let store = ContentStore::new("/mirror");
        assert_eq!(
            store.local_path_for(&url("http://x/a?/../../../../escaped.txt")),
            PathBuf::from("/mirror/x/a%3F%2F..%2F..%2F..%2F..%2Fescaped.txt")
        );
    }

    #[tokio::test]
    async fn test_write_stays_inside_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a").join("mirror");
        let store = ContentStore::new(&root);

        let path = store
            .write(&url("http://x/a?/../../../../escaped.txt"), b"data")
            .await
            .unwrap();

        assert!(path.starts_with(&root));
        assert!(!dir.path().join("escaped.txt").exists());
        assert!(!dir.path().join("a").join("escaped.txt").exists());
    }

    #[test]
    fn test_fragment_does_not_change_path() {
        let store = ContentStore::new("/mirror");
        assert_eq!(
            store.local_path_for(&url("http://example.com/a.html#top")),
            store.local_path_for(&url("http://example.com/a.html"))
        );
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path());
        let page = url("http://example.com/deep/nested/page.html");

        assert!(!store.exists(&page).await);
        let path = store.write(&page, b"<html></html>").await.unwrap();
        assert!(path.ends_with("example.com/deep/nested/page.html"));
        assert!(store.exists(&page).await);
        assert_eq!(store.read(&page).await.unwrap(), b"<html></html>");
    }

    #[tokio::test]
    async fn test_write_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path());
        let page = url("http://example.com/a.html");
        store.write(&page, b"one").await.unwrap();
        store.write(&page, b"two").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path().join("example.com"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.html"]);
        assert_eq!(store.read(&page).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_directory_is_not_a_mirrored_file() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("example.com/docs")).unwrap();

        // "/docs" (no trailing slash) maps to the directory itself
        assert!(!store.exists(&url("http://example.com/docs")).await);
    }
}
