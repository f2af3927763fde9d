//! Conversion run configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! layout of the Open Banking read/write repository.
//!
//! # Example YAML
//!
//! ```yaml
//! definitions_dir: accounts/definitions
//! permissions_file: Permissions.csv
//! skip_files:
//!   - Enumerations.csv
//! iso_description_file: readwrite/definitions/ISODateTime.yaml
//! rules:
//!   separate_definitions:
//!     - AccountId
//!   mandatory_detail:
//!     OBAccount1: [Account]
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabular_schema_core::ConversionRules;

use crate::error::Result;

/// Top-level configuration of a conversion run.
///
/// # Examples
///
/// ```
/// use tabular_schema_store::ConvertConfig;
///
/// let config: ConvertConfig = serde_yaml::from_str("definitions_dir: defs").unwrap();
/// assert_eq!(config.definitions_dir, std::path::PathBuf::from("defs"));
/// assert_eq!(config.permissions_file, "Permissions.csv");
/// assert!(config.is_skipped("Enumerations.csv"));
/// assert!(config.is_skipped("Permissions.csv"));
/// assert!(!config.is_skipped("Accounts.csv"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Output directory for definition files, relative to the output root.
    pub definitions_dir: PathBuf,
    /// File name of the permissions table inside the input directory.
    pub permissions_file: String,
    /// Table files that are never converted.
    pub skip_files: Vec<String>,
    /// Document holding the shared ISO date-time description, relative to the
    /// output root.
    pub iso_description_file: PathBuf,
    pub rules: ConversionRules,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from("accounts/definitions"),
            permissions_file: "Permissions.csv".to_string(),
            skip_files: vec!["Enumerations.csv".to_string()],
            iso_description_file: PathBuf::from("readwrite/definitions/ISODateTime.yaml"),
            rules: ConversionRules::default(),
        }
    }
}

impl ConvertConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::StoreError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `file_name` is not a convertible table: the
    /// permissions table or one of `skip_files`.
    pub fn is_skipped(&self, file_name: &str) -> bool {
        file_name == self.permissions_file || self.skip_files.iter().any(|f| f == file_name)
    }
}
