//! Policy error types.
//!
//! Lookup misses are NOT errors: store lookups return `Option`. The variants
//! here cover capacity exhaustion, malformed input, and invalid arguments;
//! everything else is a normal outcome.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// A key buffer was too small for the encoded key.
    #[error("key capacity exceeded: need {required} bytes, have {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },

    /// The housekeeping roster has no free slot. The offending rule is still
    /// stored, but it will never be auto-evicted by a reconciliation sweep.
    #[error("housekeeping roster full ({capacity} slots); rule stored but untracked")]
    RosterFull { capacity: usize },

    /// Input that should have been well-formed was not (tag set, date string).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A required reference was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
