// src/crawl/url_ref.rs
// =============================================================================
// The unit of crawl work: a URL plus how we got there.
//
// A UrlRef carries its discovery depth and (optionally) the page that linked
// to it. Only the URL takes part in equality and hashing, so two refs to the
// same page discovered at different depths are "the same" as far as dedup is
// concerned.
//
// Normalization:
// - The `url` crate already lowercases scheme and host, drops default ports
//   and resolves dot segments when parsing.
// - We additionally ignore the fragment (`#section`), because it never
//   changes what the server sends back.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRef {
    /// Absolute URL to fetch
    url: Url,
    /// Link hops from the seed (the seed itself is depth 0)
    depth: u32,
    /// Page this URL was discovered on, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    referrer: Option<Url>,
}

impl UrlRef {
    // Creates the depth-0 ref for a crawl's starting point
    pub fn seed(url: Url) -> Self {
        Self::new(url, 0, None)
    }

    pub fn new(mut url: Url, depth: u32, referrer: Option<Url>) -> Self {
        url.set_fragment(None);
        Self { url, depth, referrer }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn referrer(&self) -> Option<&Url> {
        self.referrer.as_ref()
    }

    // The identity string used by every dedup set in the crawler
    pub fn key(&self) -> &str {
        normalized_key(&self.url)
    }
}

// Returns the URL's string form without its fragment.
//
// This borrows from the Url instead of allocating, since it runs for every
// link on every page.
pub fn normalized_key(url: &Url) -> &str {
    let full = url.as_str();
    match url.fragment() {
        // +1 for the '#' itself
        Some(fragment) => &full[..full.len() - fragment.len() - 1],
        None => full,
    }
}

impl PartialEq for UrlRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for UrlRef {}

impl Hash for UrlRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for UrlRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (depth {})", self.url, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_identity_ignores_depth_and_referrer() {
        let a = UrlRef::new(url("http://x/a"), 1, None);
        let b = UrlRef::new(url("http://x/a"), 4, Some(url("http://x/")));
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_fragment_is_not_part_of_identity() {
        let a = UrlRef::new(url("http://x/page#top"), 1, None);
        let b = UrlRef::seed(url("http://x/page"));
        assert_eq!(a, b);
        assert_eq!(a.key(), "http://x/page");
    }

    #[test]
    fn test_normalized_key_borrows_without_fragment() {
        let u = url("HTTP://Example.COM:80/a/../b#frag");
        assert_eq!(normalized_key(&u), "http://example.com/b");
    }
}
