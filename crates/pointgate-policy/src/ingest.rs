//! Rule-record ingestion.
//!
//! Two external grammars feed the reconciler: the native rule-record format
//! (one record per rule: kind, type, location, bounds, time, user, group)
//! and an XACML-like nested format. The XML machinery itself is an external
//! collaborator; this module owns what both grammars funnel into — the
//! grammar-neutral [`RuleRecord`], the element-text mappings the XACML
//! grammar needs, and the timestamp tokenizer.

use chrono::{TimeZone, Utc};
use pointgate_types::{GroupCode, SemanticType, Timestamp, UserCode};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::model::{PolicyRule, RuleKind};

// ============================================================================
// RuleRecord
// ============================================================================

/// One parsed policy rule, as delivered by either grammar.
///
/// `time_secs == 0` means "no time gate" — the wire encoding both grammars
/// use for an absent timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub kind: RuleKind,
    pub semantic_type: SemanticType,
    pub location: String,
    pub min: f64,
    pub max: f64,
    pub time_secs: i64,
    pub user: UserCode,
    pub group: GroupCode,
}

impl RuleRecord {
    /// Builds a record back from a rule (test/simulation convenience).
    pub fn from_rule(rule: PolicyRule) -> Self {
        Self {
            kind: rule.kind,
            semantic_type: rule.semantic_type,
            location: rule.location,
            min: rule.min,
            max: rule.max,
            time_secs: rule.effective_since.map_or(0, Timestamp::as_secs),
            user: rule.user,
            group: rule.group,
        }
    }
}

impl From<RuleRecord> for PolicyRule {
    fn from(record: RuleRecord) -> Self {
        Self {
            kind: record.kind,
            semantic_type: record.semantic_type,
            min: record.min,
            max: record.max,
            location: record.location,
            user: record.user,
            group: record.group,
            effective_since: (record.time_secs != 0).then(|| Timestamp::from_secs(record.time_secs)),
        }
    }
}

// ============================================================================
// XACML-side element mappings
// ============================================================================

/// Maps a rule element's `Effect` attribute: `"Permit"` (any case) selects
/// the access family; anything else is unrecognized.
pub fn kind_from_effect(effect: &str) -> RuleKind {
    if effect.eq_ignore_ascii_case("permit") {
        RuleKind::Access
    } else {
        RuleKind::Invalid
    }
}

/// Maps a rule element's text, which names the kind explicitly.
pub fn kind_from_rule_text(text: &str) -> RuleKind {
    if text.eq_ignore_ascii_case("comparator") {
        RuleKind::Comparator
    } else if text.eq_ignore_ascii_case("access") {
        RuleKind::Access
    } else {
        RuleKind::Invalid
    }
}

/// Maps a subject `AttributeValue` to the semantic type.
pub fn semantic_type_from_subject(text: &str) -> SemanticType {
    SemanticType::parse(text)
}

/// Maps a resource `AttributeValue` to the rule location (case-folded).
pub fn location_from_resource(text: &str) -> String {
    text.to_lowercase()
}

// ============================================================================
// Timestamp tokenizer
// ============================================================================

/// Parses a rule-validity timestamp of the form
/// `YYYY-MM-DD[T ]HH:MM:SS[.mmm]` into a seconds-resolution [`Timestamp`].
///
/// - An empty (or whitespace-only) string is "no time gate": `Ok(None)`.
/// - A date with no time component means midnight.
/// - Fractional seconds are accepted and discarded.
/// - `/` is accepted as a date separator alongside `-`.
///
/// Anything else is [`PolicyError::MalformedInput`].
pub fn parse_rule_timestamp(input: &str) -> Result<Option<Timestamp>, PolicyError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (date_part, time_part) = match trimmed.split_once(['T', ' ']) {
        Some((date, time)) => (date, Some(time)),
        None => (trimmed, None),
    };

    let mut date_fields = date_part.split(['-', '/']);
    let year = parse_field(date_fields.next(), input)?;
    let month = parse_field(date_fields.next(), input)?;
    let day = parse_field(date_fields.next(), input)?;
    if date_fields.next().is_some() {
        return Err(malformed(input));
    }

    let (hour, minute, second) = match time_part {
        None => (0, 0, 0),
        Some(time) => {
            let mut fields = time.split(':');
            let hour = parse_field(fields.next(), input)?;
            let minute = fields.next().map_or(Ok(0), |f| parse_field(Some(f), input))?;
            let second = fields.next().map_or(Ok(0), |f| {
                // Strip a fractional-seconds suffix before parsing.
                let whole = f.split('.').next().unwrap_or(f);
                parse_field(Some(whole), input)
            })?;
            if fields.next().is_some() {
                return Err(malformed(input));
            }
            (hour, minute, second)
        }
    };

    let timestamp = Utc
        .with_ymd_and_hms(year, month as u32, day as u32, hour as u32, minute as u32, second as u32)
        .single()
        .ok_or_else(|| malformed(input))?;

    Ok(Some(Timestamp::from_secs(timestamp.timestamp())))
}

/// Current wall-clock time at seconds resolution. The documented fallback
/// for a timestamp element whose date portion is absent.
pub fn now() -> Timestamp {
    Timestamp::from_secs(Utc::now().timestamp())
}

fn parse_field(field: Option<&str>, input: &str) -> Result<i32, PolicyError> {
    field
        .ok_or_else(|| malformed(input))
        .and_then(|f| f.trim().parse::<i32>().map_err(|_| malformed(input)))
}

fn malformed(input: &str) -> PolicyError {
    PolicyError::MalformedInput(format!("unparsable timestamp '{input}'"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_record_to_rule_time_sentinel() {
        let record = RuleRecord {
            kind: RuleKind::Comparator,
            semantic_type: SemanticType::Voltage,
            location: "plant".to_string(),
            min: 110.0,
            max: 240.0,
            time_secs: 0,
            user: UserCode::Invalid,
            group: GroupCode::Invalid,
        };
        let rule = PolicyRule::from(record.clone());
        assert_eq!(rule.effective_since, None);

        let gated = RuleRecord {
            time_secs: 1_500_000_000,
            ..record
        };
        let rule = PolicyRule::from(gated);
        assert_eq!(
            rule.effective_since,
            Some(Timestamp::from_secs(1_500_000_000))
        );
    }

    #[test]
    fn test_record_rule_roundtrip() {
        let record = RuleRecord {
            kind: RuleKind::Access,
            semantic_type: SemanticType::Password,
            location: "lab".to_string(),
            min: 0.0,
            max: 0.0,
            time_secs: 42,
            user: UserCode::Doug,
            group: GroupCode::Engineering,
        };
        let back = RuleRecord::from_rule(PolicyRule::from(record.clone()));
        assert_eq!(back, record);
    }

    #[test_case("Permit", RuleKind::Access; "permit_titlecase")]
    #[test_case("permit", RuleKind::Access; "permit_lowercase")]
    #[test_case("Deny", RuleKind::Invalid; "deny_titlecase")]
    #[test_case("", RuleKind::Invalid; "empty")]
    fn test_kind_from_effect(effect: &str, expected: RuleKind) {
        assert_eq!(kind_from_effect(effect), expected);
    }

    #[test_case("comparator", RuleKind::Comparator; "comparator_lowercase")]
    #[test_case("COMPARATOR", RuleKind::Comparator; "comparator_uppercase")]
    #[test_case("access", RuleKind::Access; "access_lowercase")]
    #[test_case("Access", RuleKind::Access; "access_titlecase")]
    #[test_case("both", RuleKind::Invalid; "both")]
    fn test_kind_from_rule_text(text: &str, expected: RuleKind) {
        assert_eq!(kind_from_rule_text(text), expected);
    }

    #[test]
    fn test_location_from_resource_case_folds() {
        assert_eq!(location_from_resource("Boston"), "boston");
        assert_eq!(location_from_resource("LAB-7"), "lab-7");
    }

    #[test]
    fn test_timestamp_full_datetime() {
        // 2017-08-14 21:08:00 UTC.
        let ts = parse_rule_timestamp("2017-08-14 21:08:00")
            .expect("parse")
            .expect("present");
        assert_eq!(ts, Timestamp::from_secs(1_502_744_880));
    }

    #[test]
    fn test_timestamp_t_separator_equivalent_to_space() {
        let spaced = parse_rule_timestamp("2017-08-14 21:08:00").expect("parse");
        let tee = parse_rule_timestamp("2017-08-14T21:08:00").expect("parse");
        assert_eq!(spaced, tee);
    }

    #[test]
    fn test_timestamp_fractional_seconds_discarded() {
        let plain = parse_rule_timestamp("2017-08-14T21:08:05").expect("parse");
        let frac = parse_rule_timestamp("2017-08-14T21:08:05.750").expect("parse");
        assert_eq!(plain, frac);
    }

    #[test]
    fn test_timestamp_missing_time_is_midnight() {
        let midnight = parse_rule_timestamp("2017-08-14").expect("parse");
        let explicit = parse_rule_timestamp("2017-08-14 00:00:00").expect("parse");
        assert_eq!(midnight, explicit);
    }

    #[test]
    fn test_timestamp_slash_separators() {
        let slashed = parse_rule_timestamp("2017/08/14 06:30:00").expect("parse");
        let dashed = parse_rule_timestamp("2017-08-14 06:30:00").expect("parse");
        assert_eq!(slashed, dashed);
    }

    #[test]
    fn test_timestamp_empty_means_no_gate() {
        assert_eq!(parse_rule_timestamp("").expect("parse"), None);
        assert_eq!(parse_rule_timestamp("   ").expect("parse"), None);
    }

    #[test_case("not-a-date")]
    #[test_case("2017-08")]
    #[test_case("2017-08-14-02")]
    #[test_case("2017-13-40 99:99:99")]
    #[test_case("2017-08-14 10:00:00:00")]
    fn test_timestamp_malformed_inputs_error(input: &str) {
        let err = parse_rule_timestamp(input).expect_err("must fail");
        assert!(matches!(err, PolicyError::MalformedInput(_)));
    }
}
