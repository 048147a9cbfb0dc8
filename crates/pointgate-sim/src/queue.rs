//! FCFS object queue with wall-clock instrumentation.
//!
//! Objects arrive in synthetic bursts ("epochs"); the first and last object
//! of a burst carry batch-boundary flags so the estimator can aggregate one
//! statistics update per epoch. Service discipline is first-come-first-serve.
//!
//! One producer thread (the arrival generator) and one consumer thread (the
//! service loop) contend only on enqueue/dequeue; the mutex is held for the
//! whole insertion/removal but never across service work or statistics.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Name stamped on every synthetic arrival.
const OBJECT_NAME: &str = "drone";

// ============================================================================
// QueuedObject
// ============================================================================

/// One synthetic arrival, exclusively owned by the queue until dequeued.
#[derive(Debug)]
pub struct QueuedObject {
    pub name: String,
    /// First object of its arrival burst.
    pub begin_batch: bool,
    /// Last object of its arrival burst; triggers the per-epoch statistics
    /// update when it completes service.
    pub end_batch: bool,
    /// Number of objects in the burst this object arrived with.
    pub batch_size: usize,
    arrived_at: Instant,
    queue_wait: Option<Duration>,
    service_started_at: Option<Instant>,
    service_time: Option<Duration>,
}

impl QueuedObject {
    fn new(begin_batch: bool, end_batch: bool, batch_size: usize) -> Self {
        Self {
            name: OBJECT_NAME.to_string(),
            begin_batch,
            end_batch,
            batch_size,
            arrived_at: Instant::now(),
            queue_wait: None,
            service_started_at: None,
            service_time: None,
        }
    }

    /// Time spent waiting in the queue. `None` until dequeued.
    pub fn queue_wait(&self) -> Option<Duration> {
        self.queue_wait
    }

    /// Stamps the start of service.
    pub fn mark_service_start(&mut self) {
        self.service_started_at = Some(Instant::now());
    }

    /// Stamps the end of service. A no-op unless service was started.
    pub fn mark_service_end(&mut self) {
        if let Some(start) = self.service_started_at {
            self.service_time = Some(start.elapsed());
        }
    }

    /// Time spent in service. `None` until service completed.
    pub fn service_time(&self) -> Option<Duration> {
        self.service_time
    }
}

// ============================================================================
// EventQueue
// ============================================================================

/// Thread-safe FCFS queue of arriving objects.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: Mutex<VecDeque<QueuedObject>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues one arrival burst of `count` objects.
    ///
    /// The first object is flagged `begin_batch`, the last `end_batch` (a
    /// single-object burst carries both). Each object is stamped with its
    /// arrival time under the lock and appended at the tail in order.
    /// Returns the number of objects inserted.
    pub fn enqueue_batch(&self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }

        let mut queue = self.lock();
        for i in 0..count {
            queue.push_back(QueuedObject::new(i == 0, i == count - 1, count));
        }
        count
    }

    /// Detaches and returns the head of the queue, or `None` when empty.
    ///
    /// The queue-exit time is stamped after the lock is released: the object
    /// is exclusively owned once detached and `Instant` is monotonic, so the
    /// wait measurement loses nothing by leaving the critical section first.
    pub fn dequeue_front(&self) -> Option<QueuedObject> {
        let detached = self.lock().pop_front();

        detached.map(|mut object| {
            object.queue_wait = Some(object.arrived_at.elapsed());
            object
        })
    }

    /// Number of objects currently queued.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueuedObject>> {
        // A poisoned lock means a panicking peer, not corrupt data; the
        // queue content is still well-formed.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Tests
// ============================================================================
