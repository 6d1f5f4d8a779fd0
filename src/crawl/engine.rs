// src/crawl/engine.rs
// =============================================================================
// The crawl engine: owns the shared state and the pool of workers.
//
// Lifecycle:
// 1. Crawler::new validates the config and seeds the queue with depth 0
// 2. (optional) restore_from_checkpoint() replaces the seeded queue
// 3. start() spawns one tokio task per configured worker
// 4. Workers run until the queue is exhausted or stop() is called
// 5. wait() joins them; is_running() turns false once the last one exits
//
// This is also the control surface a UI or CLI drives: start, stop,
// is_running, checkpoint_now and restore_from_checkpoint.
// =============================================================================

use super::checkpoint::Checkpointer;
use super::queue::WorkQueue;
use super::url_ref::UrlRef;
use super::worker::{CrawlContext, CrawlCounters, CrawlWorker};
use crate::config::CrawlConfig;
use crate::error::{ConfigError, FetchError};
use crate::extract::{LinkExtractor, MailLog};
use crate::fetch::Fetcher;
use crate::store::ContentStore;
use anyhow::{bail, Result};
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

// Counters describing a crawl so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Downloaded over the network
    pub fetched: usize,
    /// Served from the existing mirror instead of the network
    pub reused: usize,
    /// Network fetches that failed
    pub failed: usize,
    /// New files written to the mirror
    pub stored: usize,
    /// Still waiting in the queue
    pub pending: usize,
    /// Claimed by a worker right now
    pub in_flight: usize,
}

pub struct Crawler {
    ctx: Arc<CrawlContext>,
    active_workers: Arc<AtomicUsize>,
    handles: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    // The queue came from a checkpoint rather than the seed
    restored: AtomicBool,
}

// Decrements the active worker count when a worker task ends, however it ends
struct ActiveWorker(Arc<AtomicUsize>);

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Crawler {
    // Builds a crawler ready to start from the config's seed.
    //
    // Fails if the config can't possibly work; nothing has been fetched yet.
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        mail_log: Arc<dyn MailLog>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        config.prepare_mirror_root()?;

        let queue = WorkQueue::new();
        queue.enqueue(UrlRef::seed(config.seed.clone()));

        let ctx = CrawlContext {
            store: ContentStore::new(&config.mirror_root),
            extractor: LinkExtractor::new(mail_log),
            checkpointer: Checkpointer::new(&config.checkpoint_path, config.checkpoint_interval()),
            fetcher,
            queue,
            stop: AtomicBool::new(false),
            counters: CrawlCounters::default(),
            seed_failure: parking_lot::Mutex::new(None),
            config,
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            active_workers: Arc::new(AtomicUsize::new(0)),
            handles: parking_lot::Mutex::new(Vec::new()),
            restored: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.ctx.config
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.ctx.queue
    }

    pub fn store(&self) -> &ContentStore {
        &self.ctx.store
    }

    // Spawns the worker pool. Must be called from inside a tokio runtime.
    pub fn start(&self) {
        let mut handles = self.handles.lock();
        if self.is_running() {
            warn!("crawl is already running");
            return;
        }

        self.ctx.stop.store(false, Ordering::Release);
        info!(
            seed = %self.ctx.config.seed,
            workers = self.ctx.config.workers,
            "starting crawl"
        );

        for id in 1..=self.ctx.config.workers {
            self.active_workers.fetch_add(1, Ordering::AcqRel);
            let active = ActiveWorker(Arc::clone(&self.active_workers));
            let worker = CrawlWorker::new(id, Arc::clone(&self.ctx));
            handles.push(tokio::spawn(async move {
                let _active = active;
                worker.run().await;
            }));
        }
    }

    // Asks every worker to finish its current URL and exit
    pub fn stop(&self) {
        info!("stop requested");
        self.ctx.stop.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.ctx.stop.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.active_workers.load(Ordering::Acquire) > 0
    }

    // Waits for every started worker to exit
    pub async fn wait(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "worker task failed");
            }
        }
    }

    // Starts the crawl and waits for it to finish.
    //
    // A fresh crawl whose seed can't be fetched has nothing to follow, so
    // that is reported as a startup error rather than an empty result.
    pub async fn run(&self) -> Result<CrawlStats, ConfigError> {
        self.start();
        self.wait().await;

        if let Some(source) = self.take_seed_failure() {
            error!(seed = %self.ctx.config.seed, error = %source, "seed is unreachable");
            return Err(ConfigError::SeedUnreachable {
                url: self.ctx.config.seed.to_string(),
                source,
            });
        }

        let stats = self.stats();
        info!(
            fetched = stats.fetched,
            reused = stats.reused,
            failed = stats.failed,
            stored = stats.stored,
            "crawl finished"
        );
        Ok(stats)
    }

    // A resumed crawl has other work queued, so a failing seed there is an
    // ordinary failed fetch
    fn take_seed_failure(&self) -> Option<FetchError> {
        let failure = self.ctx.seed_failure.lock().take();
        if self.restored.load(Ordering::Acquire) {
            None
        } else {
            failure
        }
    }

    pub async fn checkpoint_now(&self) -> Result<()> {
        self.ctx.checkpointer.write(&self.ctx.queue).await
    }

    // Replaces the queue with the saved checkpoint, if there is one.
    //
    // Only allowed while no workers are running.
    pub async fn restore_from_checkpoint(&self) -> Result<bool> {
        if self.is_running() {
            bail!("cannot restore a checkpoint while the crawl is running");
        }
        let restored = self.ctx.checkpointer.restore_into(&self.ctx.queue).await?;
        if restored {
            self.restored.store(true, Ordering::Release);
        }
        Ok(restored)
    }

    pub fn stats(&self) -> CrawlStats {
        let counters = &self.ctx.counters;
        CrawlStats {
            fetched: counters.fetched.load(Ordering::Relaxed),
            reused: counters.reused.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            stored: counters.stored.load(Ordering::Relaxed),
            pending: self.ctx.queue.size(),
            in_flight: self.ctx.queue.in_flight_len(),
        }
    }
}
