//! # pointgate-sim: Discrete-event simulation harness for Pointgate
//!
//! Measures queueing and service latency of the policy-checked query path
//! under synthetic load:
//!
//! 1. An arrival thread draws Gaussian burst sizes and enqueues "drones"
//!    into the FCFS [`queue::EventQueue`], one burst per epoch.
//! 2. The service loop drains the queue; each object's service re-enforces
//!    a policy batch and sweeps the registered data points through the
//!    policy engine.
//! 3. The [`estimator::Estimator`] applies the regenerative method over
//!    completed epochs: live overall mean, deviation variance, and a 90%
//!    confidence half-width.
//!
//! Results stream to CSV through [`report::ReportSink`] implementations.

pub mod arrival;
pub mod context;
pub mod error;
pub mod estimator;
pub mod queue;
pub mod report;
pub mod service;

pub use arrival::{ArrivalPlan, Gaussian};
pub use context::SimContext;
pub use error::SimError;
pub use estimator::Estimator;
pub use queue::{EventQueue, QueuedObject};
pub use report::{CsvSink, NullSink, ReportRecord, ReportSink};
pub use service::{ServiceFactory, ServicePlan};
