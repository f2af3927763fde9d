//! File boundary of the tabular schema converter.
//!
//! This crate reads `;`-delimited data-standard tables into records, loads
//! run configuration, and writes definition documents, the run report, and a
//! checksum manifest.
//!
//! # Quick start
//!
//! ```no_run
//! use tabular_schema_convert::{Converter, OutputFormat};
//! use tabular_schema_store::{ConvertConfig, DefinitionWriter, Manifest, loader};
//!
//! let config = ConvertConfig::default();
//! let (tables, permissions) = loader::load_directory("tables/", &config).unwrap();
//!
//! let outcome = Converter::new(config.rules.clone())
//!     .convert_tables(&tables, &permissions)
//!     .unwrap();
//!
//! let writer = DefinitionWriter::new(
//!     std::path::Path::new("out").join(&config.definitions_dir),
//!     OutputFormat::Yaml,
//! );
//! let written = writer.write_all(&outcome.definitions).unwrap();
//! Manifest::from_written("0.1.0", "yaml", &written)
//!     .save("out/manifest.json")
//!     .unwrap();
//! ```

mod config;
mod error;
pub mod loader;
mod manifest;
mod writer;

pub use config::ConvertConfig;
pub use error::{Result, StoreError};
pub use manifest::{DefinitionEntry, MANIFEST_VERSION, Manifest, ManifestDiff};
pub use writer::{DefinitionWriter, REPORT_STEM, WrittenFile, checksum};
