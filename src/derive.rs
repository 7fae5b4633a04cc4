//! Derived fields: canonical fields computed from other canonical fields.
//!
//! Derivations only ever read normalized data, so they work the same for every
//! provider.

use tracing::debug;

use crate::error::{HomeDataError, Result};
use crate::schema::{CanonicalField, CanonicalValue, HomeData, SewerType};

type Compute = fn(&HomeData) -> std::result::Result<CanonicalValue, String>;

/// A canonical field whose value is a pure function of other canonical fields.
pub struct DerivedField {
    pub field: CanonicalField,
    pub depends_on: &'static [CanonicalField],
    compute: Compute,
}

impl DerivedField {
    pub fn dependencies_met(&self, data: &HomeData) -> bool {
        self.depends_on.iter().all(|dep| data.contains_key(dep))
    }
}

static DERIVED_FIELDS: &[DerivedField] = &[DerivedField {
    field: CanonicalField::HasSeptic,
    depends_on: &[CanonicalField::Sewer],
    compute: has_septic,
}];

fn has_septic(data: &HomeData) -> std::result::Result<CanonicalValue, String> {
    match data.get(&CanonicalField::Sewer) {
        Some(CanonicalValue::Sewer(sewer)) => Ok(CanonicalValue::Flag(*sewer == SewerType::Septic)),
        other => Err(format!("expected a sewer value, found {other:?}")),
    }
}

/// All derived fields, in evaluation order.
pub fn derived_fields() -> &'static [DerivedField] {
    DERIVED_FIELDS
}

pub fn lookup(field: CanonicalField) -> Option<&'static DerivedField> {
    DERIVED_FIELDS.iter().find(|derived| derived.field == field)
}

pub fn is_derived(field: CanonicalField) -> bool {
    lookup(field).is_some()
}

/// Compute every derived field whose dependencies are present in `data`.
///
/// Fields with a missing dependency are skipped. A failing computation is a
/// logic error and aborts with [`HomeDataError::Derivation`].
pub fn apply(data: &mut HomeData) -> Result<usize> {
    apply_table(DERIVED_FIELDS, data)
}

fn apply_table(table: &[DerivedField], data: &mut HomeData) -> Result<usize> {
    let mut computed = 0;
    for derived in table {
        if !derived.dependencies_met(data) {
            debug!(field = %derived.field, "Skipping derived field, dependency missing");
            continue;
        }
        let value = (derived.compute)(data).map_err(|message| HomeDataError::Derivation {
            field: derived.field.to_string(),
            message,
        })?;
        data.insert(derived.field, value);
        computed += 1;
    }
    Ok(computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_sewer(sewer: SewerType) -> HomeData {
        let mut data = HomeData::new();
        data.insert(CanonicalField::Sewer, CanonicalValue::Sewer(sewer));
        data
    }

    #[test]
    fn has_septic_follows_sewer() {
        let mut data = with_sewer(SewerType::Septic);
        assert_eq!(apply(&mut data).unwrap(), 1);
        assert_eq!(data[&CanonicalField::HasSeptic], CanonicalValue::Flag(true));

        let mut data = with_sewer(SewerType::TypeUnknown);
        apply(&mut data).unwrap();
        assert_eq!(data[&CanonicalField::HasSeptic], CanonicalValue::Flag(false));
    }

    #[test]
    fn missing_dependency_is_skipped_silently() {
        let mut data = HomeData::new();
        assert_eq!(apply(&mut data).unwrap(), 0);
        assert!(data.is_empty());
    }

    #[test]
    fn repeated_application_is_idempotent() {
        let mut once = with_sewer(SewerType::Municipal);
        apply(&mut once).unwrap();
        let mut twice = once.clone();
        apply(&mut twice).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn compute_failure_surfaces_as_derivation_error() {
        let mut data = HomeData::new();
        data.insert(CanonicalField::Sewer, CanonicalValue::Flag(true));
        let err = apply(&mut data).unwrap_err();
        assert!(matches!(err, HomeDataError::Derivation { ref field, .. } if field == "has_septic"));
    }

    #[test]
    fn lookup_distinguishes_derived_fields() {
        assert!(is_derived(CanonicalField::HasSeptic));
        assert!(!is_derived(CanonicalField::Sewer));
        assert_eq!(lookup(CanonicalField::HasSeptic).unwrap().depends_on, &[CanonicalField::Sewer]);
    }

    #[test]
    fn custom_table_runs_in_order() {
        fn always_true(_: &HomeData) -> std::result::Result<CanonicalValue, String> {
            Ok(CanonicalValue::Flag(true))
        }
        let table = [DerivedField {
            field: CanonicalField::HasSeptic,
            depends_on: &[],
            compute: always_true,
        }];
        let mut data = HomeData::new();
        assert_eq!(apply_table(&table, &mut data).unwrap(), 1);
        assert_eq!(data[&CanonicalField::HasSeptic], CanonicalValue::Flag(true));
    }
}
