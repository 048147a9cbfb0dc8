//! # pointgate-types: Core types for `Pointgate`
//!
//! This crate contains shared types used across the `Pointgate` system:
//! - Semantic classification of data points ([`SemanticType`])
//! - Tagged value union ([`Value`])
//! - Temporal types ([`Timestamp`])
//! - Closed principal sets ([`UserCode`], [`GroupCode`])
//! - The data-point record the policy core reads ([`DataPoint`])
//!
//! These are plain data types: no I/O, no policy logic. The policy engine
//! and the rule store live in `pointgate-policy`.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// ============================================================================
// Timestamp
// ============================================================================

/// A seconds-resolution wall-clock timestamp (Unix epoch).
///
/// Rule time gates and data-point update times both carry seconds resolution
/// only; sub-second components are discarded at the ingestion boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================================================
// SemanticType
// ============================================================================

/// The semantic classification of a data point, taken from its `type:` tag.
///
/// Physical measurements are bounds-gated (comparator rules); `Password`,
/// `Heading`, and `FuelLevel` are access-gated (presence/attribute rules).
/// Unrecognized classifications map to `Invalid`, which the policy engine
/// treats as "no policy exists yet" and passes unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    Temperature,
    Voltage,
    Current,
    Frequency,
    Power,
    Password,
    Heading,
    FuelLevel,
    PositionX,
    PositionY,
    Altitude,
    Speed,
    Invalid,
}

impl SemanticType {
    /// Parses a classification name, case-insensitively.
    ///
    /// Unrecognized names map to `Invalid` rather than failing: a data point
    /// tagged with a classification the policy vocabulary does not know is a
    /// normal occurrence, not an error.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "temperature" => Self::Temperature,
            "voltage" => Self::Voltage,
            "current" => Self::Current,
            "frequency" => Self::Frequency,
            "power" => Self::Power,
            "password" => Self::Password,
            "heading" => Self::Heading,
            "fuellevel" => Self::FuelLevel,
            "positionx" => Self::PositionX,
            "positiony" => Self::PositionY,
            "altitude" => Self::Altitude,
            "speed" => Self::Speed,
            _ => Self::Invalid,
        }
    }

    /// Whether this classification is gated by access rules rather than
    /// comparator (value-bounds) rules.
    pub fn is_access_gated(self) -> bool {
        matches!(self, Self::Password | Self::Heading | Self::FuelLevel)
    }

    /// Stable numeric code used when composing rule hash keys.
    pub fn code(self) -> u8 {
        match self {
            Self::Temperature => 1,
            Self::Voltage => 2,
            Self::Current => 3,
            Self::Frequency => 4,
            Self::Power => 5,
            Self::Password => 6,
            Self::Heading => 7,
            Self::FuelLevel => 8,
            Self::PositionX => 9,
            Self::PositionY => 10,
            Self::Altitude => 11,
            Self::Speed => 12,
            Self::Invalid => 0,
        }
    }
}

// ============================================================================
// UserCode / GroupCode
// ============================================================================

/// The closed set of users recognized by user-scoped policy rules.
///
/// `Invalid` doubles as the wildcard: a rule whose user is `Invalid` matches
/// every requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserCode {
    Gus,
    Doug,
    Mike,
    Tom,
    Jackie,
    Lilli,
    Bob,
    Madi,
    #[default]
    Invalid,
}

impl UserCode {
    /// Parses a user name, case-insensitively. Unrecognized names map to
    /// `Invalid` (wildcard).
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "gus" => Self::Gus,
            "doug" => Self::Doug,
            "mike" => Self::Mike,
            "tom" => Self::Tom,
            "jackie" => Self::Jackie,
            "lilli" => Self::Lilli,
            "bob" => Self::Bob,
            "madi" => Self::Madi,
            _ => Self::Invalid,
        }
    }

    pub fn is_wildcard(self) -> bool {
        self == Self::Invalid
    }
}

/// The closed set of groups recognized by group-scoped policy rules.
///
/// As with [`UserCode`], `Invalid` is the wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GroupCode {
    Manager,
    Engineering,
    Technician,
    Customer,
    #[default]
    Invalid,
}

impl GroupCode {
    /// Parses a group name, case-insensitively. Unrecognized names map to
    /// `Invalid` (wildcard).
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "manager" => Self::Manager,
            "engineering" => Self::Engineering,
            "technician" => Self::Technician,
            "customer" => Self::Customer,
            _ => Self::Invalid,
        }
    }

    pub fn is_wildcard(self) -> bool {
        self == Self::Invalid
    }
}

// ============================================================================
// Value
// ============================================================================

/// The tagged union over the value types a data point can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    Array16(Vec<u16>),
    Array32(Vec<u32>),
    /// Complex conjugate pair (real, imaginary).
    Conjugate(f32, f32),
}

impl Value {
    /// Checks this value against an inclusive `[min, max]` range.
    ///
    /// Scalar variants compare in their native numeric domain (every scalar
    /// variant is exactly representable in `f64`, so the comparison is
    /// lossless). Array and conjugate values are not supported by range
    /// policies and always fail.
    pub fn in_bounds(&self, min: f64, max: f64) -> bool {
        match self {
            Self::U16(v) => Self::scalar_in_bounds(f64::from(*v), min, max),
            Self::I16(v) => Self::scalar_in_bounds(f64::from(*v), min, max),
            Self::U32(v) => Self::scalar_in_bounds(f64::from(*v), min, max),
            Self::I32(v) => Self::scalar_in_bounds(f64::from(*v), min, max),
            Self::F32(v) => Self::scalar_in_bounds(f64::from(*v), min, max),
            Self::Array16(_) | Self::Array32(_) | Self::Conjugate(..) => false,
        }
    }

    fn scalar_in_bounds(v: f64, min: f64, max: f64) -> bool {
        v >= min && v <= max
    }
}

// ============================================================================
// DataPoint
// ============================================================================

/// A named, typed variable representing a sensor/actuator value.
///
/// Data points are owned by the external resource manager; the policy core
/// only reads them. Identification is `(name, instance_id)` plus an optional
/// 32-bit GUID (`0` means "no GUID assigned").
///
/// Tags are free-form `namespace:value` strings. The policy engine extracts
/// `type:`, `location:`, `user:`, and `group:` from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    pub name: String,
    pub instance_id: u32,
    pub guid: u32,
    pub value: Value,
    /// Last-update time of the value.
    pub timestamp: Timestamp,
    pub tags: Vec<String>,
}

impl DataPoint {
    /// Creates a data point with no GUID and no tags.
    pub fn new(name: &str, instance_id: u32, value: Value, timestamp: Timestamp) -> Self {
        Self {
            name: name.to_string(),
            instance_id,
            guid: 0,
            value,
            timestamp,
            tags: Vec::new(),
        }
    }

    /// Sets the GUID.
    pub fn with_guid(mut self, guid: u32) -> Self {
        self.guid = guid;
        self
    }

    /// Appends a `namespace:value` tag.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("temperature", SemanticType::Temperature; "temperature_lowercase")]
    #[test_case("TEMPERATURE", SemanticType::Temperature; "temperature_uppercase")]
    #[test_case("Voltage", SemanticType::Voltage)]
    #[test_case("current", SemanticType::Current)]
    #[test_case("frequency", SemanticType::Frequency)]
    #[test_case("power", SemanticType::Power)]
    #[test_case("password", SemanticType::Password)]
    #[test_case("heading", SemanticType::Heading)]
    #[test_case("fuelLevel", SemanticType::FuelLevel)]
    #[test_case("positionX", SemanticType::PositionX)]
    #[test_case("positionY", SemanticType::PositionY)]
    #[test_case("altitude", SemanticType::Altitude)]
    #[test_case("speed", SemanticType::Speed)]
    #[test_case("warpfactor", SemanticType::Invalid)]
    #[test_case("", SemanticType::Invalid)]
    fn test_semantic_type_parse(name: &str, expected: SemanticType) {
        assert_eq!(SemanticType::parse(name), expected);
    }

    #[test]
    fn test_access_gated_family() {
        assert!(SemanticType::Password.is_access_gated());
        assert!(SemanticType::Heading.is_access_gated());
        assert!(SemanticType::FuelLevel.is_access_gated());
        assert!(!SemanticType::Temperature.is_access_gated());
        assert!(!SemanticType::Speed.is_access_gated());
        assert!(!SemanticType::Invalid.is_access_gated());
    }

    #[test]
    fn test_semantic_type_codes_distinct() {
        let all = [
            SemanticType::Temperature,
            SemanticType::Voltage,
            SemanticType::Current,
            SemanticType::Frequency,
            SemanticType::Power,
            SemanticType::Password,
            SemanticType::Heading,
            SemanticType::FuelLevel,
            SemanticType::PositionX,
            SemanticType::PositionY,
            SemanticType::Altitude,
            SemanticType::Speed,
            SemanticType::Invalid,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code(), "{a:?} and {b:?} share a code");
            }
        }
    }

    #[test_case("doug", UserCode::Doug; "doug_lowercase")]
    #[test_case("DOUG", UserCode::Doug; "doug_uppercase")]
    #[test_case("gus", UserCode::Gus)]
    #[test_case("madi", UserCode::Madi)]
    #[test_case("nobody", UserCode::Invalid)]
    fn test_user_code_parse(name: &str, expected: UserCode) {
        assert_eq!(UserCode::parse(name), expected);
    }

    #[test_case("engineering", GroupCode::Engineering)]
    #[test_case("Manager", GroupCode::Manager)]
    #[test_case("technician", GroupCode::Technician)]
    #[test_case("customer", GroupCode::Customer)]
    #[test_case("aliens", GroupCode::Invalid)]
    fn test_group_code_parse(name: &str, expected: GroupCode) {
        assert_eq!(GroupCode::parse(name), expected);
    }

    #[test]
    fn test_wildcard_codes() {
        assert!(UserCode::Invalid.is_wildcard());
        assert!(!UserCode::Doug.is_wildcard());
        assert!(GroupCode::Invalid.is_wildcard());
        assert!(!GroupCode::Engineering.is_wildcard());
    }

    #[test]
    fn test_value_bounds_scalars() {
        assert!(Value::U16(50).in_bounds(0.0, 100.0));
        assert!(!Value::U16(150).in_bounds(0.0, 100.0));
        assert!(Value::I16(-5).in_bounds(-10.0, 0.0));
        assert!(Value::U32(4_000_000_000).in_bounds(0.0, 5_000_000_000.0));
        assert!(Value::I32(-40).in_bounds(-100.0, 100.0));
        assert!(Value::F32(99.5).in_bounds(0.0, 100.0));
        assert!(!Value::F32(100.5).in_bounds(0.0, 100.0));
        // Bounds are inclusive on both ends.
        assert!(Value::U16(0).in_bounds(0.0, 100.0));
        assert!(Value::U16(100).in_bounds(0.0, 100.0));
    }

    #[test]
    fn test_value_bounds_rejects_aggregates() {
        assert!(!Value::Array16(vec![1, 2]).in_bounds(0.0, 100.0));
        assert!(!Value::Array32(vec![1]).in_bounds(0.0, 100.0));
        assert!(!Value::Conjugate(1.0, 2.0).in_bounds(0.0, 100.0));
    }

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp::from_secs(100) < Timestamp::from_secs(200));
        assert_eq!(Timestamp::from_secs(0), Timestamp::default());
        assert_eq!(i64::from(Timestamp::from_secs(42)), 42);
    }

    #[test]
    fn test_data_point_builder() {
        let dp = DataPoint::new(
            "engineTemp",
            1,
            Value::U16(50),
            Timestamp::from_secs(1_500_000_000),
        )
        .with_guid(0x8000_07BC)
        .with_tag("type:temperature")
        .with_tag("location:boston");

        assert_eq!(dp.name, "engineTemp");
        assert_eq!(dp.instance_id, 1);
        assert_eq!(dp.guid, 0x8000_07BC);
        assert_eq!(dp.tags.len(), 2);
    }

    #[test]
    fn test_data_point_serialization_roundtrip() {
        let dp = DataPoint::new("fuel", 2, Value::F32(0.75), Timestamp::from_secs(1000))
            .with_tag("type:fuelLevel");
        let json = serde_json::to_string(&dp).expect("serialize data point");
        let back: DataPoint = serde_json::from_str(&json).expect("deserialize data point");
        assert_eq!(back.name, dp.name);
        assert_eq!(back.value, dp.value);
        assert_eq!(back.timestamp, dp.timestamp);
    }
}
