// src/extract/mod.rs
// =============================================================================
// Link extraction.
//
// Submodules:
// - html: the tolerant tag scanner that finds links in a page
// - mail_log: where `mailto:` links end up instead of the crawl queue
// =============================================================================

mod html;
mod mail_log;

pub use html::LinkExtractor;
pub use mail_log::{FileMailLog, MailLog, MemoryMailLog};
