//! Shared simulation context.
//!
//! One context object is created at startup and shared by the arrival thread
//! and the service loop. It owns the event queue and the run-wide counters
//! both sides consult for termination.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::queue::EventQueue;

/// State shared between the arrival (producer) and service (consumer)
/// threads. Lifetime: created once at startup, torn down at shutdown.
#[derive(Debug, Default)]
pub struct SimContext {
    pub queue: EventQueue,
    epoch: AtomicUsize,
    objects_created: AtomicUsize,
    arrivals_done: AtomicBool,
}

impl SimContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of arrival epochs started so far.
    pub fn current_epoch(&self) -> usize {
        self.epoch.load(Ordering::Acquire)
    }

    /// Starts a new arrival epoch, returning its 1-based number.
    pub fn advance_epoch(&self) -> usize {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Total objects created across the run.
    pub fn objects_created(&self) -> usize {
        self.objects_created.load(Ordering::Acquire)
    }

    pub fn add_objects(&self, count: usize) {
        self.objects_created.fetch_add(count, Ordering::AcqRel);
    }

    /// Whether the arrival thread has finished producing.
    pub fn arrivals_done(&self) -> bool {
        self.arrivals_done.load(Ordering::Acquire)
    }

    /// Marks the arrival side finished; the consumer drains and exits.
    pub fn finish_arrivals(&self) {
        self.arrivals_done.store(true, Ordering::Release);
    }
}
