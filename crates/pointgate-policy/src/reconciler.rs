//! Policy reconciliation: ingest a freshly parsed rule batch and evict
//! whatever the batch no longer mentions.
//!
//! The protocol is two-phase, mark-and-sweep:
//!
//! 1. **Mark on insert** — [`apply`] puts each rule into the store and marks
//!    its roster slot seen (occupying a fresh slot for genuinely new rules,
//!    re-marking the superseded rule's slot otherwise).
//! 2. **Sweep unmarked, reset marks** — [`housekeep`] runs once after the
//!    whole batch, evicting every rule whose slot was not re-marked and
//!    clearing all marks for the next pass.
//!
//! The two phases are never fused: housekeeping mid-batch would evict rules
//! the batch simply had not reached yet. Between batches, every rule present
//! in consecutive batches survives, and rules omitted from the newest batch
//! are evicted exactly once.

use std::sync::Arc;

use crate::error::PolicyError;
use crate::ingest::RuleRecord;
use crate::model::PolicyRule;
use crate::store::RuleStore;

/// Summary of one reconciliation pass over a rule batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Rules inserted for the first time.
    pub inserted: usize,
    /// Rules that superseded an existing rule under the same key.
    pub superseded: usize,
    /// Rules stored while the roster was full; these are never auto-evicted.
    pub untracked: usize,
    /// Rules evicted by the housekeeping sweep.
    pub evicted: usize,
}

/// Applies one parsed rule to the store and marks it seen in the roster.
///
/// Returns `Err(PolicyError::RosterFull)` when a genuinely new rule cannot
/// be tracked: the rule IS stored and enforced, but it escapes housekeeping
/// forever, so the condition must reach the operator.
pub fn apply(store: &mut RuleStore, rule: PolicyRule) -> Result<(), PolicyError> {
    let rule = Arc::new(rule);
    let key = rule.key();

    match store.policy_put(Arc::clone(&rule), key) {
        None => store.roster_track(&rule).inspect_err(|err| {
            tracing::warn!(%err, location = %rule.location, "new rule escaped housekeeping");
        }),
        Some(previous) => {
            if !store.roster_replace(&previous, &rule) {
                // The superseded rule was itself never tracked (stored while
                // the roster was full); try to adopt a slot for the new one.
                return store.roster_track(&rule).inspect_err(|err| {
                    tracing::warn!(%err, location = %rule.location, "superseding rule escaped housekeeping");
                });
            }
            Ok(())
        }
    }
}

/// Sweeps the roster after a batch: evicts every rule the batch did not
/// re-mark, then resets the marks for the next reconciliation pass.
///
/// Returns the number of evicted rules.
pub fn housekeep(store: &mut RuleStore) -> usize {
    let evicted = store.roster_sweep();
    for rule in &evicted {
        tracing::debug!(
            location = %rule.location,
            semantic_type = ?rule.semantic_type,
            "evicted stale policy rule"
        );
    }
    evicted.len()
}

/// Reconciles one whole batch (one parsed policy file): applies every
/// record, then housekeeps.
pub fn apply_batch<I>(store: &mut RuleStore, records: I) -> BatchReport
where
    I: IntoIterator<Item = RuleRecord>,
{
    let mut report = BatchReport::default();

    for record in records {
        let rule = PolicyRule::from(record);
        let existed = store.policy_exists(&rule.key());
        match apply(store, rule) {
            Ok(()) if existed => report.superseded += 1,
            Ok(()) => report.inserted += 1,
            Err(_) => report.untracked += 1,
        }
    }

    report.evicted = housekeep(store);
    report
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleKind;
    use pointgate_types::SemanticType;

    fn comparator(location: &str) -> PolicyRule {
        PolicyRule::new(RuleKind::Comparator, SemanticType::Temperature, location)
            .with_bounds(0.0, 100.0)
    }

    fn keys(locations: &[&str]) -> Vec<crate::model::RuleKey> {
        locations.iter().map(|l| comparator(l).key()).collect()
    }

    #[test]
    fn test_apply_then_housekeep_keeps_batch() {
        let mut store = RuleStore::new(16, 8);
        apply(&mut store, comparator("a")).expect("apply a");
        apply(&mut store, comparator("b")).expect("apply b");
        assert_eq!(housekeep(&mut store), 0);
        assert_eq!(store.policy_count(), 2);
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let mut store = RuleStore::new(16, 8);

        for _ in 0..2 {
            apply(&mut store, comparator("a")).expect("apply a");
            apply(&mut store, comparator("b")).expect("apply b");
            apply(&mut store, comparator("c")).expect("apply c");
            housekeep(&mut store);
        }

        assert_eq!(store.policy_count(), 3);
        assert_eq!(store.roster_occupancy(), 3);
        for key in keys(&["a", "b", "c"]) {
            assert!(store.policy_exists(&key));
        }
    }

    #[test]
    fn test_omitted_rule_is_evicted_exactly_once() {
        let mut store = RuleStore::new(16, 8);

        // Batch 1 = {A, B, C}.
        apply(&mut store, comparator("a")).expect("apply a");
        apply(&mut store, comparator("b")).expect("apply b");
        apply(&mut store, comparator("c")).expect("apply c");
        assert_eq!(housekeep(&mut store), 0);

        // Batch 2 = {A, C}: B goes away, its slot is freed.
        apply(&mut store, comparator("a")).expect("apply a");
        apply(&mut store, comparator("c")).expect("apply c");
        assert_eq!(housekeep(&mut store), 1);

        assert_eq!(store.policy_count(), 2);
        assert_eq!(store.roster_occupancy(), 2);
        let [a, b, c]: [_; 3] = keys(&["a", "b", "c"]).try_into().expect("three keys");
        assert!(store.policy_exists(&a));
        assert!(!store.policy_exists(&b));
        assert!(store.policy_exists(&c));

        // A third pass with {A, C} evicts nothing further.
        apply(&mut store, comparator("a")).expect("apply a");
        apply(&mut store, comparator("c")).expect("apply c");
        assert_eq!(housekeep(&mut store), 0);
    }

    #[test]
    fn test_superseding_rule_survives_sweep() {
        let mut store = RuleStore::new(16, 8);
        apply(&mut store, comparator("a")).expect("apply");
        housekeep(&mut store);

        let replacement = comparator("a").with_bounds(10.0, 20.0);
        apply(&mut store, replacement).expect("supersede");
        assert_eq!(housekeep(&mut store), 0);

        let key = comparator("a").key();
        let stored = store.policy_find(&key).expect("rule present");
        assert_eq!(stored.min, 10.0);
        assert_eq!(stored.max, 20.0);
    }

    #[test]
    fn test_roster_exhaustion_is_surfaced_not_swallowed() {
        let mut store = RuleStore::new(16, 2);
        apply(&mut store, comparator("a")).expect("apply a");
        apply(&mut store, comparator("b")).expect("apply b");

        let err = apply(&mut store, comparator("c")).expect_err("roster full");
        assert_eq!(err, PolicyError::RosterFull { capacity: 2 });

        // The rule is stored and enforced despite being untracked.
        assert!(store.policy_exists(&comparator("c").key()));

        // Untracked rules survive sweeps indefinitely: the documented hazard.
        apply(&mut store, comparator("a")).expect("apply a");
        apply(&mut store, comparator("b")).expect("apply b");
        housekeep(&mut store);
        assert!(store.policy_exists(&comparator("c").key()));
    }

    #[test]
    fn test_apply_batch_reports_counts() {
        let mut store = RuleStore::new(16, 8);

        let batch_1 = vec![
            RuleRecord::from_rule(comparator("a")),
            RuleRecord::from_rule(comparator("b")),
            RuleRecord::from_rule(comparator("c")),
        ];
        let report = apply_batch(&mut store, batch_1);
        assert_eq!(
            report,
            BatchReport {
                inserted: 3,
                superseded: 0,
                untracked: 0,
                evicted: 0
            }
        );

        let batch_2 = vec![
            RuleRecord::from_rule(comparator("a")),
            RuleRecord::from_rule(comparator("c")),
        ];
        let report = apply_batch(&mut store, batch_2);
        assert_eq!(
            report,
            BatchReport {
                inserted: 0,
                superseded: 2,
                untracked: 0,
                evicted: 1
            }
        );
    }
}
