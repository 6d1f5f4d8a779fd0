// src/store/content_type.rs
// =============================================================================
// Decides what kind of resource we are holding.
//
// There are two ways to know a content type:
// - From the network: the server's Content-Type header (authoritative)
// - From disk: we never stored the header, so we guess from the extension
//
// The crawler only distinguishes the classes that change its behavior:
// HTML/XML pages get their links extracted, images are leaves, anything
// else is logged and treated as a leaf.
// =============================================================================

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Html,
    Xml,
    Image,
    /// Anything we don't know how to handle
    Other,
}

impl ContentClass {
    // Classifies a MIME string such as "text/html; charset=utf-8"
    pub fn from_mime(content_type: &str) -> Self {
        let mime = content_type.trim().to_ascii_lowercase();
        if mime.starts_with("text/html") {
            ContentClass::Html
        } else if mime.starts_with("text/xml") || mime.starts_with("application/xml") {
            ContentClass::Xml
        } else if mime.starts_with("image/") {
            ContentClass::Image
        } else {
            ContentClass::Other
        }
    }

    // Guesses the class of a file we previously saved for this URL
    pub fn from_url(url: &Url) -> Self {
        Self::from_mime(guess_mime(url))
    }

    // Pages whose links we follow
    pub fn is_markup(self) -> bool {
        matches!(self, ContentClass::Html | ContentClass::Xml)
    }
}

// Maps a URL's file extension to a MIME type.
//
// Anything that doesn't look like an image is assumed to be a page, because
// that is what the overwhelming majority of mirrored files are.
pub fn guess_mime(url: &Url) -> &'static str {
    let extension = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("png") => "image/png",
        _ => "text/html",
    }
}
