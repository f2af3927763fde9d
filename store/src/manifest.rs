//! Checksum manifest of written definitions.
//!
//! The manifest records one SHA-256 checksum per written definition so that
//! two conversion runs can be compared key by key without re-reading every
//! file, and so that hand edits to generated files can be detected.
//!
//! # Examples
//!
//! ```no_run
//! use tabular_schema_store::Manifest;
//!
//! let mut manifest = Manifest::new("0.1.0", "yaml");
//! manifest.record("OBAccount1", "OBAccount1.yaml", "ab12...");
//! manifest.save("manifest.json").unwrap();
//!
//! let loaded = Manifest::load("manifest.json").unwrap();
//! assert!(loaded.contains("OBAccount1"));
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::writer::{WrittenFile, checksum};

/// Manifest format version.
pub const MANIFEST_VERSION: &str = "1.0";

/// Metadata of one written definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionEntry {
    /// File name relative to the definitions directory.
    pub file: String,
    /// SHA-256 hex digest of the file content.
    pub checksum: String,
}

/// Manifest of one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub tool_version: String,
    /// Extension of the definition files (`yaml` or `json`).
    pub format: String,
    /// RFC 3339 timestamp of the last update.
    pub updated_at: String,
    /// Entries keyed by canonical key.
    pub definitions: BTreeMap<String, DefinitionEntry>,
}

/// Key-level difference between two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    /// Keys only in the newer manifest.
    pub added: Vec<String>,
    /// Keys only in the older manifest.
    pub removed: Vec<String>,
    /// Keys in both whose checksum differs.
    pub changed: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of differing keys.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

impl Manifest {
    pub fn new(tool_version: &str, format: &str) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            tool_version: tool_version.to_string(),
            format: format.to_string(),
            updated_at: Utc::now().to_rfc3339(),
            definitions: BTreeMap::new(),
        }
    }

    /// Builds a manifest from the files of one run.
    pub fn from_written(tool_version: &str, format: &str, written: &[WrittenFile]) -> Self {
        let mut manifest = Self::new(tool_version, format);
        for file in written {
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.path.display().to_string());
            manifest.record(&file.key, &name, &file.checksum);
        }
        manifest
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, or [`JsonError`](crate::StoreError::JsonError) if the content is
    /// not valid manifest JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    /// Saves the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Inserts or updates the entry for `key` and refreshes `updated_at`.
    pub fn record(&mut self, key: &str, file: &str, checksum: &str) {
        self.definitions.insert(
            key.to_string(),
            DefinitionEntry {
                file: file.to_string(),
                checksum: checksum.to_string(),
            },
        );
        self.updated_at = Utc::now().to_rfc3339();
    }

    pub fn get(&self, key: &str) -> Option<&DefinitionEntry> {
        self.definitions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.definitions.contains_key(key)
    }

    /// Computes the SHA-256 hex digest of a file.
    pub fn calculate_checksum(path: impl AsRef<Path>) -> Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(checksum(&bytes))
    }

    /// Compares `self` (older) against `newer`, key by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabular_schema_store::Manifest;
    ///
    /// let mut old = Manifest::new("0.1.0", "yaml");
    /// old.record("A", "A.yaml", "1");
    /// old.record("B", "B.yaml", "2");
    ///
    /// let mut new = Manifest::new("0.1.0", "yaml");
    /// new.record("B", "B.yaml", "3");
    /// new.record("C", "C.yaml", "4");
    ///
    /// let diff = old.diff(&new);
    /// assert_eq!(diff.added, ["C"]);
    /// assert_eq!(diff.removed, ["A"]);
    /// assert_eq!(diff.changed, ["B"]);
    /// ```
    pub fn diff(&self, newer: &Manifest) -> ManifestDiff {
        let mut diff = ManifestDiff::default();
        for (key, entry) in &self.definitions {
            match newer.definitions.get(key) {
                None => diff.removed.push(key.clone()),
                Some(other) if other.checksum != entry.checksum => diff.changed.push(key.clone()),
                Some(_) => {}
            }
        }
        diff.added = newer
            .definitions
            .keys()
            .filter(|key| !self.definitions.contains_key(*key))
            .cloned()
            .collect();
        diff
    }

    /// Keys whose file in `dir` is missing or no longer matches its checksum.
    pub fn verify(&self, dir: impl AsRef<Path>) -> Result<Vec<String>> {
        let dir = dir.as_ref();
        let mut mismatched = Vec::new();
        for (key, entry) in &self.definitions {
            let path = dir.join(&entry.file);
            if !path.is_file() || Self::calculate_checksum(&path)? != entry.checksum {
                mismatched.push(key.clone());
            }
        }
        Ok(mismatched)
    }
}
