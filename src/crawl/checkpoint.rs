// src/crawl/checkpoint.rs
// =============================================================================
// Saving and restoring the work queue so an interrupted crawl can resume.
//
// How it works:
// 1. Workers call `checkpoint_if_due()` between URLs
// 2. If the configured interval has passed, exactly one of them wins the
//    right to write; everybody else returns straight away
// 3. The queue is copied under its lock, then the copy is written as JSON
//    OUTSIDE that lock, so workers are only held up for the copy
// 4. The file is written next to the target and renamed over it, which
//    means a reader never sees half a checkpoint
//
// On resume, in-flight URLs (claimed but never finished) are put back at the
// front of the queue.
// =============================================================================

use super::queue::WorkQueue;
use super::url_ref::UrlRef;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const CHECKPOINT_VERSION: u32 = 1;

// The on-disk checkpoint document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    /// Refs waiting to be claimed, in queue order
    pub pending: Vec<UrlRef>,
    /// Refs a worker was busy with when the checkpoint was taken
    pub in_flight: Vec<UrlRef>,
    /// Every URL scheduled so far, so finished pages aren't walked again
    #[serde(default)]
    pub scheduled: Vec<String>,
}

impl Checkpoint {
    pub fn from_queue(queue: &WorkQueue) -> Self {
        let snapshot = queue.snapshot();
        Self {
            version: CHECKPOINT_VERSION,
            pending: snapshot.pending,
            in_flight: snapshot.in_flight,
            scheduled: snapshot.scheduled,
        }
    }

    pub fn apply_to(self, queue: &WorkQueue) {
        queue.restore(self.pending, self.in_flight);
        queue.remember_scheduled(self.scheduled);
    }
}

pub struct Checkpointer {
    path: PathBuf,
    interval: Option<Duration>,
    last_checkpoint: parking_lot::Mutex<Instant>,
    // Keeps a periodic write and a manual one from sharing the temp file
    write_lock: tokio::sync::Mutex<()>,
}

impl Checkpointer {
    // `interval` of None disables periodic checkpoints; manual ones still work
    pub fn new(path: impl Into<PathBuf>, interval: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            interval,
            last_checkpoint: parking_lot::Mutex::new(Instant::now()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    // Writes a checkpoint if the interval has passed since the last one.
    //
    // Failures are logged; losing a checkpoint only makes resuming worse.
    pub async fn checkpoint_if_due(&self, queue: &WorkQueue) {
        let Some(interval) = self.interval else {
            return;
        };

        // Claim this slot before writing so only one caller writes per interval
        {
            let mut last = self.last_checkpoint.lock();
            if last.elapsed() <= interval {
                return;
            }
            *last = Instant::now();
        }

        if let Err(e) = self.write(queue).await {
            warn!(path = %self.path.display(), error = %e, "checkpoint failed");
        }
    }

    // Writes a checkpoint right now, replacing any previous one
    pub async fn write(&self, queue: &WorkQueue) -> Result<()> {
        // Snapshot only once we own the file, so a slower older write can
        // never land on top of a newer one
        let _guard = self.write_lock.lock().await;
        let checkpoint = Checkpoint::from_queue(queue);
        let json = serde_json::to_vec(&checkpoint)?;

        let partial = self.partial_path();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&partial, &json)
            .await
            .with_context(|| format!("writing {}", partial.display()))?;
        tokio::fs::rename(&partial, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;

        *self.last_checkpoint.lock() = Instant::now();
        debug!(
            path = %self.path.display(),
            pending = checkpoint.pending.len(),
            in_flight = checkpoint.in_flight.len(),
            "checkpoint written"
        );
        Ok(())
    }

    // Reads the checkpoint file. Ok(None) means there is no checkpoint yet.
    pub async fn load(&self) -> Result<Option<Checkpoint>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        let checkpoint: Checkpoint = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        if checkpoint.version != CHECKPOINT_VERSION {
            bail!(
                "unsupported checkpoint version {} (expected {})",
                checkpoint.version,
                CHECKPOINT_VERSION
            );
        }
        Ok(Some(checkpoint))
    }

    // Loads the checkpoint into `queue`. Returns false if there was none.
    pub async fn restore_into(&self, queue: &WorkQueue) -> Result<bool> {
        let Some(checkpoint) = self.load().await? else {
            return Ok(false);
        };

        info!(
            path = %self.path.display(),
            pending = checkpoint.pending.len(),
            in_flight = checkpoint.in_flight.len(),
            "resuming from checkpoint"
        );
        checkpoint.apply_to(queue);
        Ok(true)
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
