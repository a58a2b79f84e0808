//! Argument values and validated argument records.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::schema::ArgKind;

// ── ArgValue ────────────────────────────────────────────────────

/// A single supplied argument value.
///
/// Deserializes untagged, so a JSON front end maps `2` to `Integer`,
/// `2.0` to `Real` and `"2"` to `Text`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// Signed integer.
    Integer(i64),
    /// Real number.
    Real(f64),
    /// Text.
    Text(String),
}

impl ArgValue {
    /// The type tag of this value.
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Integer(_) => ArgKind::Integer,
            Self::Real(_) => ArgKind::Real,
            Self::Text(_) => ArgKind::Text,
        }
    }

    /// Parse `text` as exactly one value of `kind`.
    ///
    /// Returns `None` for anything but a complete, locale-independent
    /// representation. Non-finite reals are refused.
    pub fn parse(kind: ArgKind, text: &str) -> Option<Self> {
        match kind {
            ArgKind::Integer => text.parse::<i64>().ok().map(Self::Integer),
            ArgKind::Real => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Real),
            ArgKind::Text => Some(Self::Text(text.to_owned())),
        }
    }

    /// The integer payload, if this is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// The real payload, if this is a `Real`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// The text payload, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Renders the value so that [`ArgValue::parse()`] with the same kind
/// yields it back unchanged. Reals use the shortest round-trip form.
impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

// ── ArgRecord ───────────────────────────────────────────────────

/// Post-validation arguments: one `(name, value)` per schema entry, in
/// schema order, every value of its declared type.
///
/// Only [`Schema::validate()`](crate::Schema::validate) creates records.
/// A role instance keeps the record it was built from and echoes it
/// verbatim, so feeding [`to_pairs()`](Self::to_pairs) back into the
/// same factory reproduces the instance.
///
/// Serializes as `[{"name": ..., "value": ...}, ...]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgRecord {
    entries: Vec<(String, ArgValue)>,
}

impl ArgRecord {
    pub(crate) fn from_validated(entries: Vec<(String, ArgValue)>) -> Self {
        Self { entries }
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` for a record of an argument-less module.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the named argument.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Values in schema order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &ArgValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Owned pairs suitable for re-invoking the factory.
    pub fn to_pairs(&self) -> Vec<(String, ArgValue)> {
        self.entries.clone()
    }
}

impl Serialize for ArgRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Entry<'a>(&'a str, &'a ArgValue);

        impl Serialize for Entry<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("name", self.0)?;
                map.serialize_entry("value", self.1)?;
                map.end()
            }
        }

        serializer.collect_seq(self.entries.iter().map(|(n, v)| Entry(n, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgSpec, Schema};
    use proptest::prelude::*;

    #[test]
    fn json_values_map_to_kinds() {
        let v: ArgValue = serde_json::from_str("2").unwrap();
        assert_eq!(v, ArgValue::Integer(2));
        let v: ArgValue = serde_json::from_str("2.0").unwrap();
        assert_eq!(v, ArgValue::Real(2.0));
        let v: ArgValue = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(v, ArgValue::Text("2".into()));
    }

    #[test]
    fn record_serializes_as_name_value_list() {
        let schema = Schema::new(vec![
            ArgSpec::new("n", ArgKind::Integer),
            ArgSpec::new("file", ArgKind::Text),
        ])
        .unwrap();
        let record = schema
            .validate([("file", ArgValue::from("a.txt")), ("n", ArgValue::from(2))])
            .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "n", "value": 2},
                {"name": "file", "value": "a.txt"},
            ])
        );
    }

    #[test]
    fn pairs_revalidate_to_identical_record() {
        let schema = Schema::new(vec![ArgSpec::new("h_max", ArgKind::Real)]).unwrap();
        let record = schema.validate([("h_max", ArgValue::Real(0.01))]).unwrap();
        let again = schema.validate(record.to_pairs()).unwrap();
        assert_eq!(record, again);
    }

    proptest! {
        #[test]
        fn real_display_parses_back_exactly(v in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let text = ArgValue::Real(v).to_string();
            prop_assert_eq!(ArgValue::parse(ArgKind::Real, &text), Some(ArgValue::Real(v)));
        }

        #[test]
        fn integer_display_parses_back_exactly(v in any::<i64>()) {
            let text = ArgValue::Integer(v).to_string();
            prop_assert_eq!(ArgValue::parse(ArgKind::Integer, &text), Some(ArgValue::Integer(v)));
        }
    }
}
