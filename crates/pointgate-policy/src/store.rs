//! The rule store: three independent hash indices plus the housekeeping
//! roster.
//!
//! Data points are indexed twice (by name key and, when a GUID is assigned,
//! by GUID key) so the resource manager can resolve either identifier with
//! one lookup. Policy rules live in a third index under their composite
//! [`RuleKey`].
//!
//! The roster is a fixed-capacity arena of slots, one per live rule,
//! tracking which rules were (re)seen during the current reconciliation
//! pass. Slots hold the same `Arc` the policy index holds; replacement
//! matching is by pointer identity.

use std::collections::HashMap;
use std::sync::Arc;

use pointgate_types::DataPoint;

use crate::error::PolicyError;
use crate::keys::{encode_guid_key, encode_name_key};
use crate::model::{PolicyRule, RuleKey};

/// Default pre-size hint for the data-point indices.
pub const ESTIMATED_DATA_POINTS: usize = 30_000;

/// Default housekeeping roster capacity (maximum tracked rules).
pub const ESTIMATED_RULES: usize = 200;

/// Key-buffer budget for name keys: longest accepted name plus the instance
/// suffix and a terminator.
const NAME_KEY_CAPACITY: usize = 256;

/// Key-buffer budget for GUID keys.
const GUID_KEY_CAPACITY: usize = 20;

// ============================================================================
// Roster
// ============================================================================

/// One housekeeping roster slot: a live rule and its seen-this-pass mark.
#[derive(Debug, Clone)]
struct RosterSlot {
    rule: Arc<PolicyRule>,
    seen: bool,
}

// ============================================================================
// RuleStore
// ============================================================================

/// Hash-indexed store for data-point references and policy rules.
#[derive(Debug)]
pub struct RuleStore {
    by_name: HashMap<String, Arc<DataPoint>>,
    by_guid: HashMap<String, Arc<DataPoint>>,
    policies: HashMap<RuleKey, Arc<PolicyRule>>,
    roster: Vec<Option<RosterSlot>>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(ESTIMATED_DATA_POINTS, ESTIMATED_RULES)
    }
}

impl RuleStore {
    /// Creates a store pre-sized for `estimated_data_points` entries with a
    /// housekeeping roster of `max_rules` slots.
    pub fn new(estimated_data_points: usize, max_rules: usize) -> Self {
        Self {
            by_name: HashMap::with_capacity(estimated_data_points),
            by_guid: HashMap::with_capacity(estimated_data_points),
            policies: HashMap::with_capacity(max_rules),
            roster: vec![None; max_rules],
        }
    }

    // ------------------------------------------------------------------
    // Data-point indices
    // ------------------------------------------------------------------

    /// Inserts a data point under its name key, and under its GUID key when
    /// a GUID is assigned (`guid != 0`).
    ///
    /// `name_override` substitutes for the data point's own name when
    /// building the name key (used for aliases).
    pub fn add(
        &mut self,
        data_point: Arc<DataPoint>,
        name_override: Option<&str>,
    ) -> Result<(), PolicyError> {
        let name = name_override.unwrap_or(&data_point.name);
        let key = encode_name_key(name, data_point.instance_id, NAME_KEY_CAPACITY)?;
        self.by_name.insert(key, Arc::clone(&data_point));

        if data_point.guid != 0 {
            let key = encode_guid_key(data_point.guid, data_point.instance_id, GUID_KEY_CAPACITY)?;
            self.by_guid.insert(key, data_point);
        }

        Ok(())
    }

    /// Looks up a data point by `(name, instance_id)`. A miss is `None`,
    /// not an error.
    pub fn find_by_name(&self, name: &str, instance_id: u32) -> Option<&Arc<DataPoint>> {
        let key = encode_name_key(name, instance_id, NAME_KEY_CAPACITY).ok()?;
        self.by_name.get(&key)
    }

    /// Looks up a data point by `(guid, instance_id)`.
    pub fn find_by_id(&self, guid: u32, instance_id: u32) -> Option<&Arc<DataPoint>> {
        let key = encode_guid_key(guid, instance_id, GUID_KEY_CAPACITY).ok()?;
        self.by_guid.get(&key)
    }

    /// Number of name-indexed data points.
    pub fn data_point_count(&self) -> usize {
        self.by_name.len()
    }

    /// Iterates the name-indexed data points (arbitrary order).
    pub fn data_points(&self) -> impl Iterator<Item = &Arc<DataPoint>> {
        self.by_name.values()
    }

    // ------------------------------------------------------------------
    // Policy index
    // ------------------------------------------------------------------

    /// Whether a rule exists under `key`.
    pub fn policy_exists(&self, key: &RuleKey) -> bool {
        self.policies.contains_key(key)
    }

    /// Inserts a rule, returning the previously stored rule if any.
    /// Last write wins; there are no merge semantics.
    pub fn policy_put(&mut self, rule: Arc<PolicyRule>, key: RuleKey) -> Option<Arc<PolicyRule>> {
        self.policies.insert(key, rule)
    }

    /// Removes and returns the rule stored under `key`.
    pub fn policy_remove(&mut self, key: &RuleKey) -> Option<Arc<PolicyRule>> {
        self.policies.remove(key)
    }

    /// Looks up the rule stored under `key`.
    pub fn policy_find(&self, key: &RuleKey) -> Option<&Arc<PolicyRule>> {
        self.policies.get(key)
    }

    /// Number of live rules in the policy index.
    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    // ------------------------------------------------------------------
    // Housekeeping roster
    // ------------------------------------------------------------------

    /// Tracks a genuinely new rule in the first free roster slot, marked
    /// seen.
    ///
    /// Errors with [`PolicyError::RosterFull`] when every slot is occupied;
    /// the rule remains in the policy index but will never be auto-evicted,
    /// so callers must surface this.
    pub(crate) fn roster_track(&mut self, rule: &Arc<PolicyRule>) -> Result<(), PolicyError> {
        match self.roster.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(RosterSlot {
                    rule: Arc::clone(rule),
                    seen: true,
                });
                Ok(())
            }
            None => Err(PolicyError::RosterFull {
                capacity: self.roster.len(),
            }),
        }
    }

    /// Re-marks the slot holding `previous` (matched by pointer identity)
    /// and swaps in the superseding rule. Returns `false` when no slot held
    /// the previous rule, which happens only if it was stored while the
    /// roster was full.
    pub(crate) fn roster_replace(
        &mut self,
        previous: &Arc<PolicyRule>,
        rule: &Arc<PolicyRule>,
    ) -> bool {
        for slot in self.roster.iter_mut().flatten() {
            if Arc::ptr_eq(&slot.rule, previous) {
                slot.rule = Arc::clone(rule);
                slot.seen = true;
                return true;
            }
        }
        false
    }

    /// Sweeps the roster: evicts every rule not seen since the last sweep
    /// from the policy index and clears its slot, then resets the remaining
    /// marks for the next reconciliation pass. Returns the evicted rules.
    pub(crate) fn roster_sweep(&mut self) -> Vec<Arc<PolicyRule>> {
        let mut evicted = Vec::new();

        for slot in &mut self.roster {
            if let Some(entry) = slot {
                if !entry.seen {
                    let key = entry.rule.key();
                    self.policies.remove(&key);
                    evicted.push(Arc::clone(&entry.rule));
                    *slot = None;
                }
            }
        }

        for entry in self.roster.iter_mut().flatten() {
            entry.seen = false;
        }

        evicted
    }

    /// Number of occupied roster slots.
    pub fn roster_occupancy(&self) -> usize {
        self.roster.iter().flatten().count()
    }

    /// Total roster capacity.
    pub fn roster_capacity(&self) -> usize {
        self.roster.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
