//! Ordered argument schemas and validation of supplied arguments.
//!
//! A [`Schema`] is the ordered list of `(name, type)` pairs a module
//! declares. Order is significant: it fixes the layout of the argument
//! block handed to the module's constructor and the order in which a
//! constructed instance echoes its arguments back.
//!
//! [`Schema::validate()`] is the trust boundary between untyped caller
//! input and a module. It checks, in this order:
//!
//! 1. every declared name is present (`Missing`),
//! 2. no undeclared name is present (`Unexpected`),
//! 3. every value has exactly the declared type (`Type`).
//!
//! Coercion is strict. A [`ArgValue::Text`] is never parsed into a
//! number and an integer never widens to a real. Front ends that start
//! from text (command lines, query strings) go through
//! [`Schema::parse_textual()`] instead, which parses each value exactly
//! against its declared type.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ArgumentError, SchemaError};
use crate::value::{ArgRecord, ArgValue};

// ── ArgKind ─────────────────────────────────────────────────────

/// Declared type of a single argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// Signed 64-bit integer.
    Integer,
    /// Double-precision real.
    Real,
    /// UTF-8 text.
    Text,
}

impl ArgKind {
    /// Wire name: `"integer"`, `"real"` or `"text"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ArgSpec ─────────────────────────────────────────────────────

/// One schema entry. Serializes as `{"name": ..., "type": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Argument name, unique within its schema.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub kind: ArgKind,
}

impl ArgSpec {
    /// Shorthand constructor.
    pub fn new(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ── Schema ──────────────────────────────────────────────────────

/// Ordered, duplicate-free argument schema.
///
/// Serializes as a bare JSON array of [`ArgSpec`]s; deserialization
/// re-runs the uniqueness check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ArgSpec>", into = "Vec<ArgSpec>")]
pub struct Schema {
    specs: Vec<ArgSpec>,
}

impl Schema {
    /// Build a schema, rejecting empty or repeated names.
    pub fn new(specs: Vec<ArgSpec>) -> Result<Self, SchemaError> {
        for (index, spec) in specs.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(SchemaError::EmptyName { index });
            }
            if specs[..index].iter().any(|s| s.name == spec.name) {
                return Err(SchemaError::DuplicateName {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(Self { specs })
    }

    /// The declared entries, in order.
    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    /// Number of declared arguments.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// `true` if the module takes no arguments.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Look up a declared argument by name.
    pub fn get(&self, name: &str) -> Option<&ArgSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Validate typed `(name, value)` pairs against this schema.
    ///
    /// On success the returned [`ArgRecord`] holds one entry per
    /// declared argument, in declared order, independent of the order
    /// the pairs were supplied in.
    ///
    /// # Errors
    ///
    /// - [`ArgumentError::Duplicate`] if the same name is supplied twice.
    /// - [`ArgumentError::Missing`] listing every absent declared name.
    /// - [`ArgumentError::Unexpected`] listing every undeclared name.
    /// - [`ArgumentError::Type`] for the first declared argument whose
    ///   value has a different type.
    pub fn validate<I, K>(&self, supplied: I) -> Result<ArgRecord, ArgumentError>
    where
        I: IntoIterator<Item = (K, ArgValue)>,
        K: Into<String>,
    {
        let supplied = collect_unique(supplied)?;
        self.check_names(&supplied)?;

        let mut entries = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            // Presence checked above.
            let Some(value) = supplied.get(spec.name.as_str()) else {
                return Err(ArgumentError::Missing {
                    names: vec![spec.name.clone()],
                });
            };
            if value.kind() != spec.kind {
                return Err(ArgumentError::Type {
                    name: spec.name.clone(),
                    expected: spec.kind,
                    actual: value.kind(),
                });
            }
            entries.push((spec.name.clone(), value.clone()));
        }
        Ok(ArgRecord::from_validated(entries))
    }

    /// Validate textual `(name, text)` pairs, parsing each value exactly
    /// against its declared type.
    ///
    /// This is the boundary-layer entry point for front ends whose
    /// input is text. Parsing is locale-independent and all-or-nothing:
    /// `"0.5"` is a valid real, `"0.5 "`, `"0,5"` and `"0.5s"` are not;
    /// non-finite reals are rejected.
    pub fn parse_textual<I, K, V>(&self, supplied: I) -> Result<ArgRecord, ArgumentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut typed = Vec::new();
        for (name, text) in supplied {
            let name = name.into();
            let text = text.as_ref();
            let value = match self.get(&name) {
                Some(spec) => ArgValue::parse(spec.kind, text).ok_or_else(|| {
                    ArgumentError::Parse {
                        name: name.clone(),
                        expected: spec.kind,
                        text: text.to_owned(),
                    }
                })?,
                // Undeclared; let validate() report it alongside the others.
                None => ArgValue::Text(text.to_owned()),
            };
            typed.push((name, value));
        }
        self.validate(typed)
    }

    fn check_names(&self, supplied: &IndexMap<String, ArgValue>) -> Result<(), ArgumentError> {
        let missing: Vec<String> = self
            .specs
            .iter()
            .filter(|s| !supplied.contains_key(s.name.as_str()))
            .map(|s| s.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ArgumentError::Missing { names: missing });
        }

        let unexpected: Vec<String> = supplied
            .keys()
            .filter(|name| self.get(name).is_none())
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(ArgumentError::Unexpected { names: unexpected });
        }
        Ok(())
    }
}

impl TryFrom<Vec<ArgSpec>> for Schema {
    type Error = SchemaError;

    fn try_from(specs: Vec<ArgSpec>) -> Result<Self, Self::Error> {
        Self::new(specs)
    }
}

impl From<Schema> for Vec<ArgSpec> {
    fn from(schema: Schema) -> Self {
        schema.specs
    }
}

fn collect_unique<I, K>(supplied: I) -> Result<IndexMap<String, ArgValue>, ArgumentError>
where
    I: IntoIterator<Item = (K, ArgValue)>,
    K: Into<String>,
{
    let mut map = IndexMap::new();
    for (name, value) in supplied {
        let name = name.into();
        if map.contains_key(&name) {
            return Err(ArgumentError::Duplicate { name });
        }
        map.insert(name, value);
    }
    Ok(map)
}
