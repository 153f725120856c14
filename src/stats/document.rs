//! Untyped statistics tree as returned by the stats source.
//!
//! The runtime reports a nested JSON document whose shape drifts between API
//! versions. [`StatsDocument`] models it as a tagged union of mappings,
//! sequences and scalar leaves so that the normalizer and flattener can walk it
//! without inspecting `serde_json` values directly.
//!
//! Mappings are kept in a [`BTreeMap`], which fixes a lexicographic iteration
//! order for every traversal. JSON `null` carries no measurement and is dropped
//! on conversion, so a `null` field behaves exactly like an absent one.

use std::collections::BTreeMap;
use std::fmt;

/// A node of a statistics document.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsDocument {
    Mapping(BTreeMap<String, StatsDocument>),
    Sequence(Vec<StatsDocument>),
    Scalar(Scalar),
}

/// A leaf value of a statistics document.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Str(String),
}

impl StatsDocument {
    /// Returns an empty mapping node.
    pub fn empty_mapping() -> Self {
        StatsDocument::Mapping(BTreeMap::new())
    }

    /// Returns the mapping if this node is one.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, StatsDocument>> {
        match self {
            StatsDocument::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a direct child of a mapping node.
    pub fn get(&self, key: &str) -> Option<&StatsDocument> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Returns a short description of the node kind, used in schema errors.
    pub fn kind(&self) -> &'static str {
        match self {
            StatsDocument::Mapping(_) => "mapping",
            StatsDocument::Sequence(_) => "sequence",
            StatsDocument::Scalar(Scalar::Str(_)) => "string",
            StatsDocument::Scalar(Scalar::Bool(_)) => "boolean",
            StatsDocument::Scalar(_) => "number",
        }
    }

    /// Counts the scalar leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            StatsDocument::Mapping(map) => map.values().map(StatsDocument::leaf_count).sum(),
            StatsDocument::Sequence(items) => items.iter().map(StatsDocument::leaf_count).sum(),
            StatsDocument::Scalar(_) => 1,
        }
    }
}

impl From<serde_json::Value> for StatsDocument {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Object(map) => StatsDocument::Mapping(
                map.into_iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k, StatsDocument::from(v)))
                    .collect(),
            ),
            Value::Array(items) => StatsDocument::Sequence(
                items
                    .into_iter()
                    .filter(|v| !v.is_null())
                    .map(StatsDocument::from)
                    .collect(),
            ),
            Value::Bool(b) => StatsDocument::Scalar(Scalar::Bool(b)),
            Value::Number(n) => StatsDocument::Scalar(Scalar::from(n)),
            Value::String(s) => StatsDocument::Scalar(Scalar::Str(s)),
            // Only reachable for a top-level null.
            Value::Null => StatsDocument::empty_mapping(),
        }
    }
}

impl From<Scalar> for StatsDocument {
    fn from(value: Scalar) -> Self {
        StatsDocument::Scalar(value)
    }
}

impl From<serde_json::Number> for Scalar {
    fn from(n: serde_json::Number) -> Self {
        if let Some(u) = n.as_u64() {
            Scalar::UInt(u)
        } else if let Some(i) = n.as_i64() {
            Scalar::Int(i)
        } else {
            Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl Scalar {
    /// Returns `true` for numeric scalars.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::UInt(_) | Scalar::Int(_) | Scalar::Float(_))
    }

    /// Adds two numeric scalars.
    ///
    /// Unsigned counters stay unsigned while they fit, mixed integer signs fall
    /// back to `i64`, and anything involving a float (or overflowing) is summed
    /// as `f64`. Returns `None` if either side is not numeric.
    pub fn checked_add(&self, rhs: &Scalar) -> Option<Scalar> {
        match (self, rhs) {
            (Scalar::UInt(a), Scalar::UInt(b)) => Some(
                a.checked_add(*b)
                    .map(Scalar::UInt)
                    .unwrap_or(Scalar::Float(*a as f64 + *b as f64)),
            ),
            (Scalar::Int(a), Scalar::Int(b)) => Some(
                a.checked_add(*b)
                    .map(Scalar::Int)
                    .unwrap_or(Scalar::Float(*a as f64 + *b as f64)),
            ),
            (Scalar::UInt(u), Scalar::Int(i)) | (Scalar::Int(i), Scalar::UInt(u)) => Some(
                i64::try_from(*u)
                    .ok()
                    .and_then(|u| u.checked_add(*i))
                    .map(Scalar::Int)
                    .unwrap_or(Scalar::Float(*u as f64 + *i as f64)),
            ),
            _ => Some(Scalar::Float(self.as_f64()? + rhs.as_f64()?)),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::UInt(u) => Some(*u as f64),
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::UInt(u) => write!(f, "{u}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// API version string as reported by the stats source, e.g. `"1.21"`.
///
/// Version gates compare the raw strings lexicographically. This matches how
/// the gates have always been evaluated, and it misorders versions whose
/// minor parts differ in digit count (`"1.9"` sorts after `"1.21"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion(String);

impl ApiVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Returns `true` if this version is at or above `threshold`.
    pub fn at_least(&self, threshold: &str) -> bool {
        self.0.as_str() >= threshold
    }
}

impl AsRef<str> for ApiVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
