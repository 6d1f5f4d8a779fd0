// src/crawl/queue.rs
// =============================================================================
// The shared work queue every crawl worker pulls from and pushes to.
//
// How it works:
// 1. Pending URLs wait in a FIFO (VecDeque), which gives breadth-first order
// 2. `scheduled_or_done` remembers every URL ever enqueued so a page is
//    never scheduled twice, even after it has been fetched
// 3. `in_flight` holds URLs a worker has claimed but not finished; after a
//    crash these are the ones that must be retried
//
// All three live behind ONE mutex. Every operation is a single critical
// section, so no caller can observe a URL that is both pending and done, and
// the "is it already scheduled?" check can never race with the insert.
//
// Rust concepts:
// - parking_lot::Mutex: like std's Mutex but without lock poisoning
// - VecDeque: push_back/pop_front for FIFO order
// =============================================================================

use super::url_ref::{normalized_key, UrlRef};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use url::Url;

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<UrlRef>,
    // Bounded by the worker count, so a Vec keeps claim order for free
    in_flight: Vec<UrlRef>,
    scheduled_or_done: HashSet<String>,
}

// A consistent copy of the queue's state, taken under the lock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    /// Not-yet-claimed refs in dequeue order
    pub pending: Vec<UrlRef>,
    /// Refs claimed by a worker and not yet marked done, in claim order
    pub in_flight: Vec<UrlRef>,
    /// Every normalized URL ever scheduled
    pub scheduled: Vec<String>,
}

#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Schedules a ref unless its URL has been scheduled before.
    //
    // Returns true if the ref was added. A duplicate is a silent no-op.
    pub fn enqueue(&self, url_ref: UrlRef) -> bool {
        let mut state = self.state.lock();
        Self::push_locked(&mut state, url_ref)
    }

    // Schedules many refs under one lock acquisition.
    //
    // Each ref is still checked on its own, so duplicates inside the batch
    // are dropped too. Returns how many were added.
    pub fn enqueue_batch<I>(&self, refs: I) -> usize
    where
        I: IntoIterator<Item = UrlRef>,
    {
        let mut state = self.state.lock();
        let mut added = 0;
        for url_ref in refs {
            if Self::push_locked(&mut state, url_ref) {
                added += 1;
            }
        }
        added
    }

    fn push_locked(state: &mut QueueState, url_ref: UrlRef) -> bool {
        // insert() returns false if the key was already present
        if !state.scheduled_or_done.insert(url_ref.key().to_string()) {
            return false;
        }
        state.pending.push_back(url_ref);
        true
    }

    // Takes the oldest pending ref and marks it in-flight in the same step
    pub fn dequeue(&self) -> Option<UrlRef> {
        let mut state = self.state.lock();
        let next = state.pending.pop_front()?;
        state.in_flight.push(next.clone());
        Some(next)
    }

    // Clears the in-flight marker once a worker has committed a URL
    pub fn mark_done(&self, url: &Url) {
        let key = normalized_key(url);
        let mut state = self.state.lock();
        if let Some(pos) = state.in_flight.iter().position(|r| r.key() == key) {
            state.in_flight.remove(pos);
        }
    }

    // Number of refs waiting to be claimed
    pub fn size(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    // True when nothing is pending AND nobody is mid-fetch.
    //
    // Both are read under one lock: a worker enqueues its new links before
    // marking its own URL done, so "no in-flight" here really means no more
    // work can appear.
    pub fn is_exhausted(&self) -> bool {
        let state = self.state.lock();
        state.pending.is_empty() && state.in_flight.is_empty()
    }

    // Has this URL ever been scheduled in this run?
    pub fn contains(&self, url: &Url) -> bool {
        self.state
            .lock()
            .scheduled_or_done
            .contains(normalized_key(url))
    }

    // Copies the whole state out for checkpointing.
    //
    // The lock is held only for the copy; callers serialize and write the
    // snapshot after it has been released.
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        QueueSnapshot {
            pending: state.pending.iter().cloned().collect(),
            in_flight: state.in_flight.clone(),
            scheduled: state.scheduled_or_done.iter().cloned().collect(),
        }
    }

    // Replaces the queue's state with a checkpointed one.
    //
    // Refs that were in flight never finished, so they go back on the FRONT
    // of the pending order, ahead of everything that was still waiting.
    pub fn restore(&self, pending: Vec<UrlRef>, in_flight: Vec<UrlRef>) {
        let mut state = self.state.lock();
        *state = QueueState::default();
        for url_ref in in_flight.into_iter().chain(pending) {
            Self::push_locked(&mut state, url_ref);
        }
    }

    // Adds URLs to the dedup history without scheduling them.
    //
    // Used on resume so pages completed before the checkpoint are not
    // walked again.
    pub fn remember_scheduled<I>(&self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = self.state.lock();
        state.scheduled_or_done.extend(keys);
    }
}
