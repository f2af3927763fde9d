//! Table validation.
//!
//! Checks the structural invariants the schema builder relies on: a table has
//! a root as its first row, every other row lies under that root, paths are
//! unique, and every row's enclosing row is present.
//!
//! # Examples
//!
//! ```
//! use tabular_schema_core::*;
//!
//! let table = vec![
//!     Record::new("OBReadAccount1", "OBReadAccount1", "OBReadAccount1", Cardinality::OneToOne),
//!     Record::new("Data", "OBReadData1", "OBReadAccount1/Data", Cardinality::OneToOne),
//! ];
//! assert!(validate_table(&table).is_empty());
//!
//! // Orphan: the Data row is missing
//! let orphan = vec![
//!     table[0].clone(),
//!     Record::new("Account", "OBAccount1", "OBReadAccount1/Data/Account", Cardinality::ZeroToMany),
//! ];
//! assert!(!validate_table(&orphan).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Record, RecordPath};

/// Table validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The table has no rows.
    #[error("table has no records")]
    EmptyTable,
    /// A row has an empty or whitespace-only name.
    #[error("record at '{0}' has an empty name")]
    EmptyName(String),
    /// A row has no path segments.
    #[error("record '{0}' has an empty path")]
    EmptyPath(String),
    /// Occurrence text is not one of `0..1`, `1..1`, `0..n`, `1..n`.
    #[error("unknown cardinality: {0}")]
    UnknownCardinality(String),
    /// Two rows share a path.
    #[error("duplicate record path: {0}")]
    DuplicatePath(String),
    /// A row does not lie under the table's root row.
    #[error("record '{path}' is outside root '{root}'")]
    OutsideRoot { path: String, root: String },
    /// A row's enclosing row is missing from the table.
    #[error("record '{0}' has no parent record")]
    OrphanRecord(String),
}

/// Validates one table; the first row is the root.
///
/// Returns the first problem found (or none), mirroring the fail-fast style
/// of the converter: a table with a broken hierarchy cannot be converted.
pub fn validate_table(records: &[Record]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(root) = records.first() else {
        errors.push(ValidationError::EmptyTable);
        return errors;
    };

    let mut seen: HashSet<&RecordPath> = HashSet::new();
    for record in records {
        if record.path.is_empty() {
            errors.push(ValidationError::EmptyPath(record.name.clone()));
            return errors;
        }
        if record.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(record.path.to_string()));
            return errors;
        }
        if !seen.insert(&record.path) {
            errors.push(ValidationError::DuplicatePath(record.path.to_string()));
            return errors;
        }
    }

    for record in &records[1..] {
        if !record.path.is_under(&root.path) {
            errors.push(ValidationError::OutsideRoot {
                path: record.path.to_string(),
                root: root.path.to_string(),
            });
            return errors;
        }
        let has_parent = record
            .path
            .parent()
            .is_some_and(|parent| seen.contains(&parent));
        if !has_parent {
            errors.push(ValidationError::OrphanRecord(record.path.to_string()));
            return errors;
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cardinality;

    fn record(path: &str) -> Record {
        let name = path.rsplit('/').next().unwrap_or_default();
        Record::new(name, "Max35Text", path, Cardinality::OneToOne)
    }

    #[test]
    fn test_validate_table_rejects_empty_table() {
        assert_eq!(validate_table(&[]), vec![ValidationError::EmptyTable]);
    }

    #[test]
    fn test_validate_table_rejects_duplicate_paths() {
        let table = vec![record("Root"), record("Root/A"), record("Root/A")];
        assert_eq!(
            validate_table(&table),
            vec![ValidationError::DuplicatePath("Root/A".to_string())]
        );
    }

    #[test]
    fn test_validate_table_rejects_rows_outside_root() {
        let table = vec![record("Root"), record("Other/A")];
        assert_eq!(
            validate_table(&table),
            vec![ValidationError::OutsideRoot {
                path: "Other/A".to_string(),
                root: "Root".to_string(),
            }]
        );
    }

    #[test]
    fn test_validate_table_rejects_orphans() {
        let table = vec![record("Root"), record("Root/A/B")];
        assert_eq!(
            validate_table(&table),
            vec![ValidationError::OrphanRecord("Root/A/B".to_string())]
        );
    }

    #[test]
    fn test_validate_table_rejects_empty_names_and_paths() {
        let mut nameless = record("Root/A");
        nameless.name = " ".to_string();
        assert_eq!(
            validate_table(&[record("Root"), nameless]),
            vec![ValidationError::EmptyName("Root/A".to_string())]
        );

        let pathless = Record::new("X", "Max35Text", "", Cardinality::OneToOne);
        assert_eq!(
            validate_table(&[pathless]),
            vec![ValidationError::EmptyPath("X".to_string())]
        );
    }

    #[test]
    fn test_validate_table_accepts_well_formed_tree() {
        let table = vec![
            record("Root"),
            record("Root/A"),
            record("Root/A/B"),
            record("Root/C"),
        ];
        assert!(validate_table(&table).is_empty());
    }
}
