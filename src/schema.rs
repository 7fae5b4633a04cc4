//! Generic home data schema.
//!
//! Canonical fields and the closed set of canonical values each one may take.
//! Everything a consumer sees is expressed in these types, whichever provider
//! the data came from.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{HomeDataError, Result};

/// Canonical field names understood by every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Sewer,
    HasSeptic,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 2] = [CanonicalField::Sewer, CanonicalField::HasSeptic];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Sewer => "sewer",
            CanonicalField::HasSeptic => "has_septic",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = HomeDataError;

    fn from_str(s: &str) -> Result<Self> {
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| HomeDataError::UnknownField(s.to_string()))
    }
}

/// Canonical sewer classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SewerType {
    Septic,
    Municipal,
    Storm,
    NoSewer,
    /// A sewer exists but its kind was not reported.
    TypeUnknown,
    /// Nothing is known about the sewer, including whether there is one.
    ExistenceUnknown,
}

/// A value drawn from one canonical field's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Sewer(SewerType),
    Flag(bool),
}

const SEWER_VALUES: [CanonicalValue; 6] = [
    CanonicalValue::Sewer(SewerType::Septic),
    CanonicalValue::Sewer(SewerType::Municipal),
    CanonicalValue::Sewer(SewerType::Storm),
    CanonicalValue::Sewer(SewerType::NoSewer),
    CanonicalValue::Sewer(SewerType::TypeUnknown),
    CanonicalValue::Sewer(SewerType::ExistenceUnknown),
];

const FLAG_VALUES: [CanonicalValue; 2] = [CanonicalValue::Flag(true), CanonicalValue::Flag(false)];

/// The closed set of valid values for `field`.
pub fn values(field: CanonicalField) -> &'static [CanonicalValue] {
    match field {
        CanonicalField::Sewer => &SEWER_VALUES,
        CanonicalField::HasSeptic => &FLAG_VALUES,
    }
}

/// Same as [`values`], keyed by the field's wire name.
pub fn values_for(name: &str) -> Result<&'static [CanonicalValue]> {
    Ok(values(name.parse()?))
}

/// The value a field falls back to when a provider value cannot be mapped.
pub fn fallback(field: CanonicalField) -> CanonicalValue {
    match field {
        CanonicalField::Sewer => CanonicalValue::Sewer(SewerType::ExistenceUnknown),
        CanonicalField::HasSeptic => CanonicalValue::Flag(false),
    }
}

pub fn is_valid(field: CanonicalField, value: &CanonicalValue) -> bool {
    values(field).contains(value)
}

/// Normalized home data keyed by canonical field.
pub type HomeData = BTreeMap<CanonicalField, CanonicalValue>;

/// The set of canonical fields a caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeSet<CanonicalField>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse field names, returning the recognised set and the names that were
    /// not part of the schema. Unrecognised names can never be produced, so
    /// callers are free to ignore them.
    pub fn parse_lenient<I, S>(names: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = FieldSet::new();
        let mut ignored = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            match name.parse::<CanonicalField>() {
                Ok(field) => {
                    set.insert(field);
                }
                Err(_) => ignored.push(name.to_string()),
            }
        }
        (set, ignored)
    }

    pub fn insert(&mut self, field: CanonicalField) -> bool {
        self.0.insert(field)
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<CanonicalField> for FieldSet {
    fn from_iter<T: IntoIterator<Item = CanonicalField>>(iter: T) -> Self {
        FieldSet(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[CanonicalField; N]> for FieldSet {
    fn from(fields: [CanonicalField; N]) -> Self {
        fields.into_iter().collect()
    }
}
