// src/crawl/worker.rs
// =============================================================================
// One crawl worker. The engine runs N of these side by side.
//
// Each worker loops through the same cycle until the queue runs dry or a
// stop is requested:
//
//   Claiming    take the next URL from the queue (or wait, or stop)
//   Fetching    reuse the mirrored file, or download it
//   Classifying decide from the content type whether it can hold links
//   Extracting  pull links out of HTML/XML pages
//   Filtering   drop known URLs, non-matching URLs and too-deep URLs
//   Committing  save new content, queue the survivors, mark the URL done
//
// Workers never talk to each other; everything shared goes through the
// WorkQueue's atomic operations.
// =============================================================================

use super::checkpoint::Checkpointer;
use super::queue::WorkQueue;
use super::url_ref::UrlRef;
use crate::config::CrawlConfig;
use crate::error::FetchError;
use crate::extract::LinkExtractor;
use crate::fetch::{FetchedResource, Fetcher};
use crate::store::{guess_mime, ContentClass, ContentStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;

// How long an idle worker waits before looking at the queue again
pub const QUEUE_CHECK_INTERVAL: Duration = Duration::from_millis(100);

// Running totals for one crawl
#[derive(Debug, Default)]
pub(crate) struct CrawlCounters {
    pub fetched: AtomicUsize,
    pub reused: AtomicUsize,
    pub failed: AtomicUsize,
    pub stored: AtomicUsize,
}

// State shared by every worker of one crawl
pub(crate) struct CrawlContext {
    pub config: CrawlConfig,
    pub queue: WorkQueue,
    pub store: ContentStore,
    pub extractor: LinkExtractor,
    pub fetcher: Arc<dyn Fetcher>,
    pub checkpointer: Checkpointer,
    pub stop: AtomicBool,
    pub counters: CrawlCounters,
    /// Set when a depth-0 fetch fails; the engine reports it after the run
    pub seed_failure: parking_lot::Mutex<Option<FetchError>>,
}

// Result of trying to claim work
enum Claim {
    Work(UrlRef),
    // Queue is empty but another worker may still add to it
    Wait,
    // Nothing pending and nothing in flight: the crawl is over
    Exhausted,
}

pub(crate) struct CrawlWorker {
    id: usize,
    ctx: Arc<CrawlContext>,
}

impl CrawlWorker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>) -> Self {
        Self { id, ctx }
    }

    pub async fn run(self) {
        let span = info_span!("worker", id = self.id);
        self.run_loop().instrument(span).await
    }

    async fn run_loop(&self) {
        debug!("worker started");

        // The stop flag is only checked between URLs, never mid-fetch
        while !self.ctx.stop.load(Ordering::Acquire) {
            self.ctx.checkpointer.checkpoint_if_due(&self.ctx.queue).await;

            match self.claim() {
                Claim::Work(url_ref) => self.process(url_ref).await,
                Claim::Wait => tokio::time::sleep(QUEUE_CHECK_INTERVAL).await,
                Claim::Exhausted => break,
            }
        }

        info!(seed = %self.ctx.config.seed, "worker stopping");
    }

    fn claim(&self) -> Claim {
        if let Some(url_ref) = self.ctx.queue.dequeue() {
            return Claim::Work(url_ref);
        }
        if self.ctx.queue.is_exhausted() {
            Claim::Exhausted
        } else {
            Claim::Wait
        }
    }

    // One full cycle for a claimed URL. The URL is always marked done at
    // the end, even when fetching failed: failures are not retried.
    async fn process(&self, url_ref: UrlRef) {
        if let Some(resource) = self.load(&url_ref).await {
            let links = self.extract_links(&resource);
            let next = self.filter(links, &url_ref);
            self.commit(&resource, next).await;
        }
        self.ctx.queue.mark_done(url_ref.url());
    }

    // Reuses the mirrored copy when allowed, otherwise downloads
    async fn load(&self, url_ref: &UrlRef) -> Option<FetchedResource> {
        let url = url_ref.url();
        let on_disk = self.ctx.store.exists(url).await;

        if on_disk && !self.ctx.config.refresh.should_refetch(ContentClass::from_url(url)) {
            match self.ctx.store.read(url).await {
                Ok(bytes) => {
                    debug!(url = %url, "using mirrored copy");
                    self.ctx.counters.reused.fetch_add(1, Ordering::Relaxed);
                    return Some(FetchedResource {
                        url: url.clone(),
                        // Disk copies carry no header, so guess from the name
                        content_type: guess_mime(url).to_string(),
                        bytes,
                        existed_on_disk_before: true,
                    });
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "could not read mirrored copy, fetching instead");
                }
            }
        }

        info!(
            url = %url,
            depth = url_ref.depth(),
            queued = self.ctx.queue.size(),
            "fetching"
        );
        match self.ctx.fetcher.fetch(url).await {
            Ok(payload) => {
                self.ctx.counters.fetched.fetch_add(1, Ordering::Relaxed);
                Some(FetchedResource {
                    url: url.clone(),
                    content_type: payload.content_type,
                    bytes: payload.bytes,
                    existed_on_disk_before: on_disk,
                })
            }
            Err(e) => {
                warn!(url = %url, error = %e, "fetch failed");
                self.ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
                if url_ref.depth() == 0 {
                    *self.ctx.seed_failure.lock() = Some(e);
                }
                None
            }
        }
    }

    // Classifies the resource and extracts links from markup
    fn extract_links(&self, resource: &FetchedResource) -> Vec<Url> {
        match ContentClass::from_mime(&resource.content_type) {
            class if class.is_markup() => {
                let text = String::from_utf8_lossy(&resource.bytes);
                self.ctx.extractor.extract(&resource.url, &text)
            }
            ContentClass::Other => {
                warn!(
                    url = %resource.url,
                    content_type = %resource.content_type,
                    "unknown content type, not following links"
                );
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    // Turns extracted links into the refs worth scheduling
    fn filter(&self, links: Vec<Url>, parent: &UrlRef) -> Vec<UrlRef> {
        let config = &self.ctx.config;
        let new_depth = parent.depth() + 1;
        if !config.within_depth(new_depth) {
            return Vec::new();
        }

        links
            .into_iter()
            .filter(|link| !self.ctx.queue.contains(link))
            .filter(|link| config.matches(link))
            .map(|link| UrlRef::new(link, new_depth, Some(parent.url().clone())))
            .collect()
    }

    async fn commit(&self, resource: &FetchedResource, next: Vec<UrlRef>) {
        if !resource.existed_on_disk_before {
            match self.ctx.store.write(&resource.url, &resource.bytes).await {
                Ok(path) => {
                    debug!(url = %resource.url, path = %path.display(), "stored");
                    self.ctx.counters.stored.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!(url = %resource.url, error = %e, "could not store resource");
                }
            }
        }

        let found = next.len();
        let added = self.ctx.queue.enqueue_batch(next);
        debug!(url = %resource.url, found, added, "queued new links");
    }
}
