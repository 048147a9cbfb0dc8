//! # pointgate-policy: Attribute-based access control for data points
//!
//! Evaluates access decisions for named, typed data points against a rule
//! set that is continuously reconciled from external policy files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Parsed rule batch (native or XACML-like)    │
//! └─────────────────┬───────────────────────────┘
//!                   │ ingest::RuleRecord
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Reconciler                                  │
//! │  ├─ put rule, mark roster slot seen          │
//! │  └─ housekeep: sweep unseen, reset marks     │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  RuleStore                                   │
//! │  (name / guid / policy indices + roster)     │
//! └─────────────────┬───────────────────────────┘
//!                   │ consulted per access request
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Engine: check(data point) -> Allow | Deny   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use pointgate_policy::{engine, reconciler, Decision, PolicyRule, RuleKind, RuleStore};
//! use pointgate_types::{DataPoint, SemanticType, Timestamp, Value};
//!
//! let mut store = RuleStore::default();
//! let rule = PolicyRule::new(RuleKind::Comparator, SemanticType::Temperature, "boston")
//!     .with_bounds(0.0, 100.0);
//! reconciler::apply(&mut store, rule).expect("roster has room");
//!
//! let dp = DataPoint::new("engineTemp", 1, Value::U16(50), Timestamp::from_secs(1_600_000_000))
//!     .with_tag("type:temperature")
//!     .with_tag("location:boston");
//!
//! assert_eq!(engine::check(&store, &dp), Decision::Allow);
//! ```

pub mod engine;
pub mod error;
pub mod ingest;
pub mod keys;
pub mod model;
pub mod reconciler;
pub mod store;

pub use engine::{Decision, check};
pub use error::PolicyError;
pub use ingest::RuleRecord;
pub use model::{PolicyRule, RuleKey, RuleKind};
pub use reconciler::BatchReport;
pub use store::RuleStore;
