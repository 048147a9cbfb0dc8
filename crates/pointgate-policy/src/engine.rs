//! Policy evaluation engine.
//!
//! Evaluates an access decision for one data point: classify it from its
//! tags, select the rule family, look up the applicable rule, then walk the
//! gates (time validity, value bounds, location/user/group scoping).
//!
//! Two deliberate asymmetries, both load-bearing for backward compatibility:
//!
//! - a data point whose `type:` tag is unrecognized passes unconditionally
//!   (no policy vocabulary exists for it yet), while
//! - a classified data point with no matching rule is denied.
//!
//! Malformed tag sets deny fail-closed and are logged as a potential
//! tampering signal.

use pointgate_types::{DataPoint, GroupCode, SemanticType, UserCode};

use crate::error::PolicyError;
use crate::model::{PolicyRule, RuleKey, RuleKind};
use crate::store::RuleStore;

// ============================================================================
// Decision
// ============================================================================

/// The outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

// ============================================================================
// Tag attributes
// ============================================================================

/// The policy-relevant attributes extracted from a data point's tags.
#[derive(Debug, Clone, PartialEq)]
struct TagAttributes {
    semantic_type: SemanticType,
    location: String,
    user: UserCode,
    group: GroupCode,
}

/// Tokenizes a data point's tags into policy attributes.
///
/// Tags are `namespace:value` strings; namespace matching is a
/// case-insensitive substring check for "type", "location", "user", and
/// "group", in that order. Unrecognized namespaces are ignored. A tag
/// without a `:` separator, or an empty tag set, is malformed.
fn tokenize_tags(data_point: &DataPoint) -> Result<TagAttributes, PolicyError> {
    if data_point.tags.is_empty() {
        return Err(PolicyError::MalformedInput(format!(
            "data point '{}' carries no tags",
            data_point.name
        )));
    }

    let mut attrs = TagAttributes {
        semantic_type: SemanticType::Invalid,
        location: String::new(),
        user: UserCode::Invalid,
        group: GroupCode::Invalid,
    };

    for tag in &data_point.tags {
        let Some((namespace, value)) = tag.split_once(':') else {
            return Err(PolicyError::MalformedInput(format!(
                "tag '{tag}' has no namespace separator"
            )));
        };

        let namespace = namespace.to_ascii_lowercase();
        if namespace.contains("type") {
            attrs.semantic_type = SemanticType::parse(value);
        } else if namespace.contains("location") {
            attrs.location = value.to_string();
        } else if namespace.contains("user") {
            attrs.user = UserCode::parse(value);
        } else if namespace.contains("group") {
            attrs.group = GroupCode::parse(value);
        }
    }

    Ok(attrs)
}

// ============================================================================
// Public API
// ============================================================================

/// Evaluates the access decision for `data_point` against the rules in
/// `store`.
pub fn check(store: &RuleStore, data_point: &DataPoint) -> Decision {
    let attrs = match tokenize_tags(data_point) {
        Ok(attrs) => attrs,
        Err(err) => {
            // A data point whose tags cannot be tokenized should not exist;
            // deny and flag it.
            tracing::warn!(
                data_point = %data_point.name,
                %err,
                "cannot tokenize tags; blocking access (possible tampering)"
            );
            return Decision::Deny;
        }
    };

    // Unclassified types have no policy vocabulary yet: wildcard by absence.
    if attrs.semantic_type == SemanticType::Invalid {
        return Decision::Allow;
    }

    let kind = if attrs.semantic_type.is_access_gated() {
        RuleKind::Access
    } else {
        RuleKind::Comparator
    };
    let key = RuleKey::new(kind, attrs.semantic_type, &attrs.location);

    // A classified type with no matching rule is denied.
    let Some(rule) = store.policy_find(&key) else {
        return Decision::Deny;
    };

    if let Some(since) = rule.effective_since {
        if data_point.timestamp < since {
            return Decision::Deny;
        }
    }

    if kind == RuleKind::Comparator && !bounds_pass(rule, data_point) {
        return Decision::Deny;
    }

    if attributes_match(rule, &attrs) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

// ============================================================================
// Gates
// ============================================================================

/// The value-bounds gate: passes when the rule declares no bounds, else when
/// the value sits in `[min, max]`. Array and conjugate values always fail a
/// bounded rule.
fn bounds_pass(rule: &PolicyRule, data_point: &DataPoint) -> bool {
    if !rule.has_bounds() {
        return true;
    }
    data_point.value.in_bounds(rule.min, rule.max)
}

/// The attribute gate: location AND user AND group must all match their
/// wildcard-or-equal checks.
fn attributes_match(rule: &PolicyRule, attrs: &TagAttributes) -> bool {
    location_matches(rule, &attrs.location)
        && user_matches(rule, attrs.user)
        && group_matches(rule, attrs.group)
}

fn location_matches(rule: &PolicyRule, location: &str) -> bool {
    rule.location.is_empty() || rule.location.eq_ignore_ascii_case(location)
}

fn user_matches(rule: &PolicyRule, user: UserCode) -> bool {
    rule.user.is_wildcard() || rule.user == user
}

fn group_matches(rule: &PolicyRule, group: GroupCode) -> bool {
    rule.group.is_wildcard() || rule.group == group
}

// ============================================================================
// Tests
// ============================================================================
