//! Full conversion runs.
//!
//! A [`Converter`] turns one or more tables into a single [`DefinitionSet`].
//! Tables are converted in the order given, sharing one
//! [`DefinitionRegistry`]; after the last table, colliding keys and common
//! types are removed from the merged output.

use tracing::{debug, info, warn};

use tabular_schema_core::{
    ConversionRules, DefinitionSet, Record, RecordPath, ValidationError, validate_table,
};

use crate::builder::{BuildContext, build};
use crate::error::{ConvertError, Result};
use crate::registry::DefinitionRegistry;
use crate::report::{Collision, ConversionReport, TableReport};

/// One named source table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    /// Name used in logs and reports, usually the file name.
    pub name: String,
    pub records: Vec<Record>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

/// Result of a full run.
#[derive(Debug, Clone, Default)]
pub struct ConversionOutcome {
    /// Documents to write, in first-appearance order.
    pub definitions: DefinitionSet,
    /// Keys dropped for ambiguous descriptions.
    pub collisions: Vec<Collision>,
    /// Common-type keys left out of the output.
    pub skipped_common_types: Vec<String>,
    pub tables: Vec<TableReport>,
}

impl ConversionOutcome {
    /// Builds the operator-facing report of this run.
    pub fn report(&self, tool_version: &str) -> ConversionReport {
        let mut report = ConversionReport::new(tool_version);
        report.tables = self.tables.clone();
        report.definitions = self.definitions.keys().map(String::from).collect();
        report.skipped_common_types = self.skipped_common_types.clone();
        report.collisions = self.collisions.clone();
        report
    }
}

/// Converts tables into schema definitions.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::{Cardinality, ConversionRules, Record};
/// use tabular_schema_convert::{Converter, SourceTable};
///
/// let table = SourceTable::new(
///     "Accounts.csv",
///     vec![
///         Record::new("OBReadAccount1", "OBReadAccount1", "OBReadAccount1", Cardinality::OneToOne),
///         Record::new("Data", "OBReadData1", "OBReadAccount1/Data", Cardinality::OneToOne),
///         Record::new("Account", "OBAccount1", "OBReadAccount1/Data/Account", Cardinality::ZeroToMany),
///         Record::new("AccountId", "Max40Text", "OBReadAccount1/Data/Account/AccountId", Cardinality::OneToOne),
///     ],
/// );
///
/// let converter = Converter::new(ConversionRules::default());
/// let outcome = converter.convert_tables(&[table], &[]).unwrap();
/// assert_eq!(
///     outcome.definitions.keys().collect::<Vec<_>>(),
///     ["OBReadAccount1", "OBReadData1", "OBAccount1"]
/// );
/// assert!(outcome.collisions.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    rules: ConversionRules,
    iso_description: String,
}

impl Converter {
    pub fn new(rules: ConversionRules) -> Self {
        Self {
            rules,
            iso_description: String::new(),
        }
    }

    /// Sets the text appended to ISO date-time field descriptions.
    pub fn with_iso_description(mut self, description: impl Into<String>) -> Self {
        self.iso_description = description.into();
        self
    }

    pub fn rules(&self) -> &ConversionRules {
        &self.rules
    }

    pub fn iso_description(&self) -> &str {
        &self.iso_description
    }

    /// Converts one table, registering its standalone nodes in `registry`.
    ///
    /// Returns the table's standalone documents. Collisions and common types
    /// are not filtered here; see [`Converter::convert_tables`].
    pub fn convert_table(
        &self,
        table: &SourceTable,
        permissions: &[RecordPath],
        registry: &mut DefinitionRegistry,
    ) -> Result<DefinitionSet> {
        if let Some(source) = validate_table(&table.records).into_iter().next() {
            return Err(ConvertError::InvalidTable {
                table: table.name.clone(),
                source,
            });
        }
        let Some(root) = table.records.first() else {
            return Err(ConvertError::InvalidTable {
                table: table.name.clone(),
                source: ValidationError::EmptyTable,
            });
        };

        let ctx = BuildContext {
            table: &table.records,
            permissions,
            rules: &self.rules,
            iso_description: &self.iso_description,
        };
        let built = build(root, &ctx, registry);
        let definitions: DefinitionSet = built.documents.into_iter().collect();

        debug!(
            table = %table.name,
            root = %root.path,
            definitions = definitions.len(),
            "converted table"
        );
        Ok(definitions)
    }

    /// Converts every table in order and resolves the merged output.
    ///
    /// Later tables replace earlier documents with the same key. Keys that
    /// collected conflicting descriptions anywhere in the run are dropped and
    /// reported, as are common types.
    pub fn convert_tables(
        &self,
        tables: &[SourceTable],
        permissions: &[RecordPath],
    ) -> Result<ConversionOutcome> {
        if tables.is_empty() {
            return Err(ConvertError::NoTables);
        }

        let mut registry = DefinitionRegistry::new();
        let mut outcome = ConversionOutcome::default();

        for table in tables {
            let definitions = self.convert_table(table, permissions, &mut registry)?;
            info!(
                table = %table.name,
                records = table.records.len(),
                definitions = definitions.len(),
                "table converted"
            );
            outcome.tables.push(TableReport {
                table: table.name.clone(),
                records: table.records.len(),
                definitions: definitions.len(),
            });
            outcome.definitions.extend(definitions);
        }

        outcome.collisions = registry.collisions();
        for collision in &outcome.collisions {
            warn!(
                key = %collision.key,
                descriptions = collision.descriptions.len(),
                paths = ?collision.paths,
                "conflicting descriptions; dropping definition"
            );
            outcome.definitions.remove(&collision.key);
        }

        let rules = &self.rules;
        let mut skipped = Vec::new();
        outcome.definitions.retain(|doc| {
            let common = rules.is_common_type(&doc.key);
            if common {
                skipped.push(doc.key.clone());
            }
            !common
        });
        outcome.skipped_common_types = skipped;

        info!(
            tables = tables.len(),
            definitions = outcome.definitions.len(),
            collisions = outcome.collisions.len(),
            skipped = outcome.skipped_common_types.len(),
            "conversion finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use tabular_schema_core::Cardinality;

    use super::*;

    fn rec(name: &str, class: &str, path: &str, cardinality: Cardinality) -> Record {
        Record::new(name, class, path, cardinality)
    }

    fn accounts_table(account_description: &str) -> SourceTable {
        SourceTable::new(
            "Accounts.csv",
            vec![
                rec("OBReadAccount1", "OBReadAccount1", "OBReadAccount1", Cardinality::OneToOne),
                rec("Data", "OBReadData1", "OBReadAccount1/Data", Cardinality::OneToOne),
                rec("Account", "OBAccount1", "OBReadAccount1/Data/Account", Cardinality::ZeroToMany)
                    .with_description(account_description),
                rec("AccountId", "Max40Text", "OBReadAccount1/Data/Account/AccountId", Cardinality::OneToOne),
                rec("Risk", "OBRisk2", "OBReadAccount1/Risk", Cardinality::OneToOne),
            ],
        )
    }

    #[test]
    fn test_common_types_are_skipped() {
        let outcome = Converter::default()
            .convert_tables(&[accounts_table("An account.")], &[])
            .unwrap();
        assert!(!outcome.definitions.contains("OBRisk2"));
        assert_eq!(outcome.skipped_common_types, ["OBRisk2"]);

        // References to common types stay in place.
        let root = outcome.definitions.get("OBReadAccount1").unwrap();
        assert_eq!(root.property("Risk").unwrap().referenced_key(), Some("OBRisk2"));
    }

    #[test]
    fn test_collision_across_tables_drops_key() {
        let mut balances = accounts_table("A different meaning.");
        balances.name = "Balances.csv".to_string();

        let outcome = Converter::default()
            .convert_tables(&[accounts_table("An account."), balances], &[])
            .unwrap();

        assert!(!outcome.definitions.contains("OBAccount1"));
        assert!(outcome.definitions.contains("OBReadAccount1"));
        assert_eq!(outcome.collisions.len(), 1);
        let collision = &outcome.collisions[0];
        assert_eq!(collision.key, "OBAccount1");
        assert_eq!(
            collision.descriptions,
            vec![
                Some("A different meaning.".to_string()),
                Some("An account.".to_string())
            ]
        );
    }

    #[test]
    fn test_identical_descriptions_do_not_collide() {
        let outcome = Converter::default()
            .convert_tables(&[accounts_table("An account."), accounts_table("An account.")], &[])
            .unwrap();
        assert!(outcome.collisions.is_empty());
        assert!(outcome.definitions.contains("OBAccount1"));
        assert_eq!(outcome.tables.len(), 2);
    }

    #[test]
    fn test_later_table_wins_at_first_position() {
        let first = SourceTable::new(
            "A.csv",
            vec![
                rec("R", "OBReadA1", "R", Cardinality::OneToOne),
                rec("Shared", "OBShared1", "R/Shared", Cardinality::ZeroToOne),
            ],
        );
        let second = SourceTable::new(
            "B.csv",
            vec![
                rec("S", "OBReadB1", "S", Cardinality::OneToOne),
                rec("Shared", "OBShared1", "S/Shared", Cardinality::ZeroToOne),
                rec("Flag", "xs:boolean", "S/Shared/Flag", Cardinality::OneToOne),
            ],
        );
        let outcome = Converter::default()
            .convert_tables(&[first, second], &[])
            .unwrap();

        assert_eq!(
            outcome.definitions.keys().collect::<Vec<_>>(),
            ["OBReadA1", "OBShared1", "OBReadB1"]
        );
        let shared = outcome.definitions.get("OBShared1").unwrap();
        assert!(shared.property("Flag").is_some());
    }

    #[test]
    fn test_invalid_table_is_an_error() {
        let table = SourceTable::new(
            "Broken.csv",
            vec![
                rec("R", "OBReadA1", "R", Cardinality::OneToOne),
                rec("Deep", "Max35Text", "R/Missing/Deep", Cardinality::OneToOne),
            ],
        );
        let err = Converter::default().convert_tables(&[table], &[]).unwrap_err();
        match err {
            ConvertError::InvalidTable { table, source } => {
                assert_eq!(table, "Broken.csv");
                assert_eq!(source, ValidationError::OrphanRecord("R/Missing/Deep".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_tables_is_an_error() {
        assert!(matches!(
            Converter::default().convert_tables(&[], &[]),
            Err(ConvertError::NoTables)
        ));
    }

    #[test]
    fn test_report_lists_output_keys() {
        let outcome = Converter::default()
            .with_iso_description("ISO 8601.")
            .convert_tables(&[accounts_table("An account.")], &[])
            .unwrap();
        let report = outcome.report("0.1.0");
        assert_eq!(report.definitions, ["OBReadAccount1", "OBReadData1", "OBAccount1"]);
        assert_eq!(report.tables[0].records, 5);
        assert_eq!(report.skipped_common_types, ["OBRisk2"]);
    }
}
