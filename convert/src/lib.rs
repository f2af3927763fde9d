//! Conversion of path-addressed data tables into JSON schema definitions.
//!
//! Each table is a flat list of [`Record`]s whose paths encode a hierarchy.
//! The converter rebuilds that hierarchy as nested schemas, files every
//! shareable composite under a canonical key, and emits one document per
//! standalone key. Documents refer to each other with
//! `$ref: "#/definitions/<key>"`.
//!
//! # Main entry points
//!
//! - [`Converter::convert_tables`]: convert a whole run of tables, resolving
//!   key collisions and dropping common types.
//! - [`Converter::convert_table`]: convert one table into an existing
//!   [`registry::DefinitionRegistry`].
//! - [`classify::classify`]: canonical key, kind, and constraints of one
//!   record.
//!
//! # Example
//!
//! ```
//! use tabular_schema_core::{Cardinality, Record, RecordPath};
//! use tabular_schema_convert::{Converter, SourceTable};
//!
//! let table = SourceTable::new(
//!     "Accounts.csv",
//!     vec![
//!         Record::new("Account", "OBAccount1", "Data/Account", Cardinality::OneToOne)
//!             .with_description("An account."),
//!         Record::new("AccountId", "Max40Text", "Data/Account/AccountId", Cardinality::OneToOne),
//!         Record::new("Account", "OBCashAccount5", "Data/Account/Account", Cardinality::ZeroToOne),
//!     ],
//! );
//! let permissions = [RecordPath::parse("Data/Account/Account")];
//!
//! let outcome = Converter::default()
//!     .convert_tables(&[table], &permissions)
//!     .unwrap();
//! assert_eq!(
//!     outcome.definitions.keys().collect::<Vec<_>>(),
//!     ["OBAccount1Basic", "OBAccount1", "OBAccount1Detail", "OBCashAccount5"]
//! );
//! ```
//!
//! [`Record`]: tabular_schema_core::Record

pub mod builder;
pub mod classify;
pub mod converter;
pub mod error;
pub mod output;
pub mod permissions;
pub mod registry;
pub mod report;

pub use converter::{ConversionOutcome, Converter, SourceTable};
pub use error::{ConvertError, Result};
pub use output::OutputFormat;
pub use report::{Collision, ConversionReport, TableReport};
