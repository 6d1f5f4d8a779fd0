// src/extract/html.rs
// =============================================================================
// This module extracts links from HTML (and XML) pages.
//
// Unlike a DOM parser, this is a plain text scanner: it looks for a fixed
// set of `<tag ... attr="value"` patterns and pulls out the quoted value.
// That makes it happy with truncated, mismatched or otherwise broken markup,
// which is exactly what a mirroring crawler meets in the wild. A tag that
// can't be read just contributes nothing.
//
// For every recognized value we:
// 1. Drop any `#fragment`
// 2. Send `mailto:` links to the mail log instead of the result
// 3. Resolve everything else against the page URL (bad URLs are skipped)
// 4. Keep only http(s) results, so `javascript:` and friends fall away
// 5. Dedup within this page (cross-page dedup is the work queue's job)
//
// Matching is case-insensitive. We lowercase a copy of the page once; ASCII
// lowercasing keeps every byte offset the same, so positions found in the
// copy can slice the original text and keep the value's real casing.
// =============================================================================

use super::mail_log::MailLog;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use url::Url;

// (tag, attribute) pairs that reference another resource
const LINK_ATTRIBUTES: &[(&str, &str)] = &[
    ("img", "src"),
    ("a", "href"),
    ("body", "background"),
    ("frame", "src"),
    ("link", "href"),
    ("embed", "src"),
];

pub struct LinkExtractor {
    mail_log: Arc<dyn MailLog>,
}

impl LinkExtractor {
    pub fn new(mail_log: Arc<dyn MailLog>) -> Self {
        Self { mail_log }
    }

    // Returns every absolute URL referenced by `content`, in the order the
    // tag table lists them, each URL at most once.
    pub fn extract(&self, base: &Url, content: &str) -> Vec<Url> {
        let lowered = content.to_ascii_lowercase();
        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for (tag, attr) in LINK_ATTRIBUTES {
            for raw in attribute_values(content, &lowered, tag, attr) {
                let reference = strip_fragment(raw).trim();
                if reference.is_empty() {
                    continue;
                }

                if is_mailto(reference) {
                    self.mail_log.record(base, reference);
                    continue;
                }

                // A reference that doesn't resolve is simply not a link
                if let Ok(resolved) = base.join(reference) {
                    if is_fetchable(&resolved) && seen.insert(resolved.as_str().to_string()) {
                        links.push(resolved);
                    }
                }
            }
        }

        debug!(page = %base, count = links.len(), "extracted links");
        links
    }
}

fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

// Finds the raw value of `attr` in every `<tag ...>` occurrence.
//
// `lowered` must be `content.to_ascii_lowercase()`.
fn attribute_values<'a>(content: &'a str, lowered: &str, tag: &str, attr: &str) -> Vec<&'a str> {
    let bytes = lowered.as_bytes();
    let opening = format!("<{}", tag);
    let mut values = Vec::new();
    let mut search_from = 0;

    while let Some(found) = lowered[search_from..].find(&opening) {
        let tag_pos = search_from + found;
        let name_end = tag_pos + opening.len();
        search_from = tag_pos + 1;

        // "<a" must not match "<abbr" or "<area"
        match bytes.get(name_end) {
            Some(b) if b.is_ascii_whitespace() => {}
            _ => continue,
        }

        // The tag's span ends at the next '>'. No '>' anywhere after this
        // point means no later tag can be complete either.
        let Some(close) = lowered[name_end..].find('>').map(|i| name_end + i) else {
            break;
        };

        let Some((value_start, quote)) = find_value_start(lowered, name_end, close, attr) else {
            continue;
        };

        // The closing quote is the next matching quote character, which may
        // legitimately sit after a '>' inside the value.
        if let Some(len) = lowered[value_start..].find(quote) {
            values.push(&content[value_start..value_start + len]);
        }
    }

    values
}

// Looks for `attr = "` (or `attr='`) between `from` and `until`.
//
// Returns the offset just past the opening quote and the quote used.
fn find_value_start(lowered: &str, from: usize, until: usize, attr: &str) -> Option<(usize, char)> {
    let bytes = lowered.as_bytes();
    let mut search_from = from;

    while let Some(found) = lowered[search_from..until].find(attr) {
        let key_pos = search_from + found;
        search_from = key_pos + 1;

        // Skip "data-src" and friends when looking for "src"
        if !bytes[key_pos - 1].is_ascii_whitespace() {
            continue;
        }

        let mut i = skip_whitespace(bytes, key_pos + attr.len(), until);
        if i >= until || bytes[i] != b'=' {
            continue;
        }
        i = skip_whitespace(bytes, i + 1, until);
        if i < until && (bytes[i] == b'"' || bytes[i] == b'\'') {
            return Some((i + 1, bytes[i] as char));
        }
    }

    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize, until: usize) -> usize {
    while i < until && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn strip_fragment(reference: &str) -> &str {
    match reference.find('#') {
        Some(idx) => &reference[..idx],
        None => reference,
    }
}

fn is_mailto(reference: &str) -> bool {
    reference
        .get(..7)
        .map(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
        .unwrap_or(false)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not use a real HTML parser here?
//    - A parser builds a tree and has opinions about broken markup
//    - We only need attribute values, and we need them even from pages a
//      parser would "repair" into something different
//    - The scanner never fails: the worst case is an empty result
//
// 2. Why is `base.join()` enough for relative links?
//    - It implements the same resolution rules a browser uses
//    - "../x", "/x", "x", "//host/x" and absolute URLs all work
//    - Garbage like "http://[::1" returns Err and is skipped
//
// 3. Why does the order follow the tag table?
//    - Each (tag, attribute) pair is scanned in turn over the whole page,
//      so all images come first, then anchors, and so on
//    - The crawler only relies on "each URL once", not on a specific order
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MemoryMailLog;

    fn extract(html: &str, base: &str) -> (Vec<String>, Vec<String>) {
        let mail_log = Arc::new(MemoryMailLog::new());
        let extractor = LinkExtractor::new(mail_log.clone());
        let links = extractor
            .extract(&Url::parse(base).unwrap(), html)
            .into_iter()
            .map(String::from)
            .collect();
        let mails = mail_log.entries().into_iter().map(|(_, m)| m).collect();
        (links, mails)
    }

    #[test]
    fn test_extract_absolute_link() {
        let (links, _) = extract(r#"<a href="https://www.rust-lang.org">Rust</a>"#, "https://example.com");
        assert_eq!(links, vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_resolve_relative_links() {
        let html = r#"
            <a href="/docs">Docs</a>
            <a href="../about">About</a>
            <a href="sibling.html">Sibling</a>
        "#;
        let (links, _) = extract(html, "https://example.com/page/index.html");
        assert_eq!(
            links,
            vec![
                "https://example.com/docs",
                "https://example.com/about",
                "https://example.com/page/sibling.html",
            ]
        );
    }

    #[test]
    fn test_all_recognized_tags() {
        let html = r#"
            <body background="bg.gif">
            <frame src="frame.html">
            <link rel="stylesheet" href="style.css">
            <embed src="movie.swf">
            <img src="logo.png">
            <a href="next.html">next</a>
        "#;
        let (links, _) = extract(html, "http://x/");
        assert_eq!(
            links,
            vec![
                "http://x/logo.png",
                "http://x/next.html",
                "http://x/bg.gif",
                "http://x/frame.html",
                "http://x/style.css",
                "http://x/movie.swf",
            ]
        );
    }

    #[test]
    fn test_case_insensitive_tags_keep_value_case() {
        let (links, _) = extract(r#"<A HREF="/Docs/Intro.HTML">x</A><Img Src='Pic.JPG'>"#, "http://x/");
        assert_eq!(links, vec!["http://x/Pic.JPG", "http://x/Docs/Intro.HTML"]);
    }

    #[test]
    fn test_truncated_tag_contributes_nothing() {
        let (links, _) = extract(r#"<a href="http://x/a">a</a> <img src="http://x/b"#, "http://x/");
        assert_eq!(links, vec!["http://x/a"]);
    }

    #[test]
    fn test_duplicates_and_fragments_collapse() {
        let html = r##"
            <a href="http://x/page#one">1</a>
            <a href="http://x/page#two">2</a>
            <a href="http://x/page">3</a>
            <a href="#top">top</a>
        "##;
        let (links, _) = extract(html, "http://x/");
        assert_eq!(links, vec!["http://x/page"]);
    }

    #[test]
    fn test_mailto_goes_to_mail_log() {
        let (links, mails) = extract(r#"<a href="mailto:me@x.com">mail</a>"#, "http://x/");
        assert!(links.is_empty());
        assert_eq!(mails, vec!["mailto:me@x.com"]);

        let (_, mails) = extract(r#"<a href="MailTo:Boss@x.com">mail</a>"#, "http://x/");
        assert_eq!(mails, vec!["MailTo:Boss@x.com"]);
    }

    #[test]
    fn test_malformed_reference_is_skipped() {
        let html = r#"<a href="http://[broken">bad</a><a href="/ok">ok</a>"#;
        let (links, _) = extract(html, "http://x/");
        assert_eq!(links, vec!["http://x/ok"]);
    }

    #[test]
    fn test_similar_tags_and_attributes_are_ignored() {
        let html = r#"
            <abbr href="/abbr">x</abbr>
            <img data-src="/lazy.png">
            <a name="anchor">no href</a> href="/outside"
        "#;
        let (links, _) = extract(html, "http://x/");
        assert!(links.is_empty());
    }

    #[test]
    fn test_attribute_with_spaces_around_equals() {
        let (links, _) = extract("<a\n  href = \"/spaced\">x</a>", "http://x/");
        assert_eq!(links, vec!["http://x/spaced"]);
    }

    #[test]
    fn test_non_http_schemes_are_dropped() {
        let html = r#"
            <a href="javascript:void(0)">js</a>
            <a href="ftp://files.x/pub">ftp</a>
            <img src="data:image/png;base64,AAAA">
            <a href="https://secure.x/">ok</a>
        "#;
        let (links, _) = extract(html, "http://x/");
        assert_eq!(links, vec!["https://secure.x/"]);
    }

    #[test]
    fn test_no_links_is_empty_not_error() {
        let (links, mails) = extract("just some text <p>and a paragraph", "http://x/");
        assert!(links.is_empty());
        assert!(mails.is_empty());
    }
}
