//! Core types for converting path-addressed data-standard tables into JSON
//! schema definitions.
//!
//! - [`Record`]: one table row with its declared class, [`RecordPath`],
//!   [`Cardinality`], and optional codes, pattern, and description.
//! - [`SchemaNode`]: a JSON-Schema-compatible fragment (reference,
//!   composition, or inline schema) with an insertion-ordered
//!   [`PropertyMap`].
//! - [`Document`] and [`DefinitionSet`]: named definitions and the ordered
//!   collection a conversion run produces.
//! - [`ConversionRules`]: the naming rules of the data standard.
//!
//! Validation ([`validate_table`]) catches broken hierarchies before a table
//! is converted.
//!
//! # Example
//!
//! ```
//! use tabular_schema_core::*;
//!
//! let table = vec![
//!     Record::new("OBReadAccount1", "OBReadAccount1", "OBReadAccount1", Cardinality::OneToOne),
//!     Record::new("Data", "OBReadData1", "OBReadAccount1/Data", Cardinality::OneToOne),
//! ];
//! assert!(validate_table(&table).is_empty());
//! assert!(table[1].is_child_of(&table[0]));
//!
//! let mut set = DefinitionSet::new();
//! set.insert(Document::new(AMOUNT_KEY, SchemaNode::of_kind(SchemaKind::String)));
//! assert!(set.contains("Amount"));
//! ```

mod node;
mod package;
mod rules;
mod types;
mod validate;

pub use node::{DEFINITIONS_PREFIX, PropertyMap, SchemaKind, SchemaNode, definition_ref};
pub use package::{DefinitionSet, Document};
pub use rules::{
    AMOUNT_KEY, AMOUNT_PATTERN, CURRENCY_AMOUNT_CLASS, CURRENCY_CODE_CLASS, ConversionRules,
    ISO_DATE_TIME_CLASS,
};
pub use types::{Cardinality, Record, RecordPath};
pub use validate::{ValidationError, validate_table};
