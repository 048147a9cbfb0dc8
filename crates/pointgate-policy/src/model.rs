//! Policy rule definitions.
//!
//! A rule is keyed by `(kind, semantic type, lowercased location)` and is
//! either an access rule (presence/attribute gate for password-like data) or
//! a comparator rule (value-bounds gate for physical measurements). Rules
//! are superseded in place when the same key reappears and evicted when a
//! reconciliation pass no longer sees them.

use pointgate_types::{GroupCode, SemanticType, Timestamp, UserCode};
use serde::{Deserialize, Serialize};

// ============================================================================
// RuleKind
// ============================================================================

/// The family a policy rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RuleKind {
    /// Boolean presence/attribute gate with no value bound.
    Access,
    /// Numeric value-bounds gate.
    Comparator,
    /// Unrecognized rule text; never matches a lookup key built by the engine.
    #[default]
    Invalid,
}

impl RuleKind {
    /// Stable numeric code used when composing rule hash keys.
    pub fn code(self) -> u8 {
        match self {
            Self::Invalid => 0,
            Self::Access => 1,
            Self::Comparator => 2,
        }
    }
}

// ============================================================================
// RuleKey
// ============================================================================

/// Composite hash key identifying a rule: kind code, then type code, then
/// the lowercased location, concatenated in that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleKey(String);

impl RuleKey {
    pub fn new(kind: RuleKind, semantic_type: SemanticType, location: &str) -> Self {
        Self(format!(
            "{}{}{}",
            kind.code(),
            semantic_type.code(),
            location.to_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// PolicyRule
// ============================================================================

/// An access/comparator constraint on a class of data points.
///
/// Wildcard encodings, preserved from the policy file formats:
/// - `location == ""` matches any location;
/// - `user == UserCode::Invalid` / `group == GroupCode::Invalid` match any
///   principal;
/// - `min == 0 && max == 0` disables the bounds check entirely (which makes
///   a genuine `[0, 0]` bound unrepresentable);
/// - `effective_since == None` disables the time gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub kind: RuleKind,
    pub semantic_type: SemanticType,
    pub min: f64,
    pub max: f64,
    pub location: String,
    pub user: UserCode,
    pub group: GroupCode,
    /// Earliest data-point update time the rule applies to.
    pub effective_since: Option<Timestamp>,
}

impl PolicyRule {
    /// An unbounded rule of the given kind/type/location with wildcard
    /// user, group, and time.
    pub fn new(kind: RuleKind, semantic_type: SemanticType, location: &str) -> Self {
        Self {
            kind,
            semantic_type,
            min: 0.0,
            max: 0.0,
            location: location.to_string(),
            user: UserCode::Invalid,
            group: GroupCode::Invalid,
            effective_since: None,
        }
    }

    /// Sets the value bounds.
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Sets the user scope.
    pub fn with_user(mut self, user: UserCode) -> Self {
        self.user = user;
        self
    }

    /// Sets the group scope.
    pub fn with_group(mut self, group: GroupCode) -> Self {
        self.group = group;
        self
    }

    /// Sets the time gate.
    pub fn with_effective_since(mut self, since: Timestamp) -> Self {
        self.effective_since = Some(since);
        self
    }

    /// The composite store key for this rule.
    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.kind, self.semantic_type, &self.location)
    }

    /// Whether the bounds check applies. `min == 0 && max == 0` means "no
    /// bound check", not "value must be zero".
    pub fn has_bounds(&self) -> bool {
        !(self.min == 0.0 && self.max == 0.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_key_lowercases_location() {
        let a = RuleKey::new(RuleKind::Comparator, SemanticType::Temperature, "Boston");
        let b = RuleKey::new(RuleKind::Comparator, SemanticType::Temperature, "boston");
        assert_eq!(a, b);
    }

    #[test]
    fn test_rule_key_separates_kinds_and_types() {
        let comp = RuleKey::new(RuleKind::Comparator, SemanticType::Temperature, "boston");
        let access = RuleKey::new(RuleKind::Access, SemanticType::Temperature, "boston");
        assert_ne!(comp, access);

        let volt = RuleKey::new(RuleKind::Comparator, SemanticType::Voltage, "boston");
        assert_ne!(comp, volt);

        let other = RuleKey::new(RuleKind::Comparator, SemanticType::Temperature, "vancouver");
        assert_ne!(comp, other);
    }

    #[test]
    fn test_rule_key_matches_rule_built_key() {
        let rule = PolicyRule::new(RuleKind::Access, SemanticType::Password, "LAB")
            .with_user(UserCode::Doug);
        assert_eq!(
            rule.key(),
            RuleKey::new(RuleKind::Access, SemanticType::Password, "lab")
        );
    }

    #[test]
    fn test_zero_bounds_are_wildcard() {
        let rule = PolicyRule::new(RuleKind::Comparator, SemanticType::Temperature, "");
        assert!(!rule.has_bounds());

        let bounded = rule.clone().with_bounds(0.0, 100.0);
        assert!(bounded.has_bounds());

        // The quirk this encoding accepts: a genuine [0, 0] bound reads as
        // "no bound".
        let zero_zero = rule.with_bounds(0.0, 0.0);
        assert!(!zero_zero.has_bounds());
    }

    #[test]
    fn test_rule_serialization_roundtrip() {
        let rule = PolicyRule::new(RuleKind::Comparator, SemanticType::Speed, "yard")
            .with_bounds(5.0, 45.0)
            .with_group(GroupCode::Technician)
            .with_effective_since(Timestamp::from_secs(1_500_000_000));
        let json = serde_json::to_string(&rule).expect("serialize rule");
        let back: PolicyRule = serde_json::from_str(&json).expect("deserialize rule");
        assert_eq!(back, rule);
    }
}
