// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl itself.
//
// Features:
// - Breadth-first crawling from a seed URL, with an optional depth limit
// - A pool of concurrent workers sharing one deduplicating work queue
// - Reuse of files already in the mirror (unless refresh is requested)
// - Periodic checkpoints so an interrupted crawl can pick up where it left
//   off
//
// Submodules:
// - url_ref: the unit of work (URL + depth + referrer)
// - queue: the shared FIFO with its dedup and in-flight bookkeeping
// - worker: the fetch -> classify -> extract -> enqueue cycle
// - checkpoint: saving and restoring the queue
// - engine: the Crawler that ties it together
// =============================================================================

mod checkpoint;
mod engine;
mod queue;
mod url_ref;
mod worker;

pub use checkpoint::{Checkpoint, Checkpointer, CHECKPOINT_VERSION};
pub use engine::{CrawlStats, Crawler};
pub use queue::{QueueSnapshot, WorkQueue};
pub use url_ref::{normalized_key, UrlRef};
pub use worker::QUEUE_CHECK_INTERVAL;
