//! Insertion-ordered usage records.
//!
//! A [`UsageRecord`] is the flattened form of one usage report: every
//! `usageReports[].parameters[]` entry becomes a named [`MetricValue`].
//! Iteration follows the order the parameters appeared in the report, which
//! keeps the resolver's last-resort substring scan reproducible.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A single report parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// `boolValue`
    Bool(bool),
    /// `intValue` (int64, delivered as a JSON string or number)
    Int(i64),
    /// `stringValue`, `datetimeValue`, or an `intValue` that did not parse
    Str(String),
    /// Anything else (`msgValue`, missing value)
    Null,
}

impl MetricValue {
    /// Interpret the value as an integer.
    ///
    /// Strings must contain a plain integer; fractional strings and booleans
    /// are rejected.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Null => None,
        }
    }

    /// Interpret the value as a finite float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Str(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Bool(_) | Self::Null => None,
        }
    }

    /// Interpret the value as a boolean.
    ///
    /// Integers are true when non-zero; strings must spell `true` or `false`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Self::Null => None,
        }
    }

    /// Build a value from one raw report parameter object.
    fn from_parameter(param: &Value) -> Self {
        if let Some(v) = param.get("stringValue") {
            return match v {
                Value::String(s) => Self::Str(s.clone()),
                other => Self::Str(other.to_string()),
            };
        }
        if let Some(v) = param.get("intValue") {
            return match v {
                Value::Number(n) => n.as_i64().map_or_else(|| Self::Str(n.to_string()), Self::Int),
                Value::String(s) => s.trim().parse().map_or_else(|_| Self::Str(s.clone()), Self::Int),
                _ => Self::Null,
            };
        }
        if let Some(v) = param.get("boolValue") {
            return v.as_bool().map_or(Self::Null, Self::Bool);
        }
        if let Some(Value::String(s)) = param.get("datetimeValue") {
            return Self::Str(s.clone());
        }
        Self::Null
    }
}

/// Ordered mapping from metric name to value for one user and report date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageRecord {
    entries: Vec<(String, MetricValue)>,
}

impl UsageRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from raw report parameter objects.
    ///
    /// Each object carries a `name` and one of `stringValue`, `intValue`,
    /// `boolValue` or `datetimeValue`. Entries without a name are kept under
    /// the empty name, matching what the API reports.
    pub fn from_parameters<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut record = Self::new();
        for param in params {
            let name = param.get("name").and_then(Value::as_str).unwrap_or_default();
            record.insert(name, MetricValue::from_parameter(param));
        }
        record
    }

    /// Insert a value, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a value by exact name.
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Whether the record has an entry with this exact name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MetricValue)> for UsageRecord {
    fn from_iter<T: IntoIterator<Item = (K, MetricValue)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for UsageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
