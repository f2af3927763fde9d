//! Writing definition documents.
//!
//! Every document lands in its own file, `<definitions dir>/<key>.<ext>`.
//! The run report is written next to the definitions directory as
//! `conversion-report.<ext>`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use tabular_schema_convert::output::{OutputFormat, format_document, format_report};
use tabular_schema_convert::ConversionReport;
use tabular_schema_core::{DefinitionSet, Document};

use crate::error::{Result, StoreError};

/// File stem of the run report.
pub const REPORT_STEM: &str = "conversion-report";

/// One written definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub key: String,
    pub path: PathBuf,
    /// SHA-256 hex digest of the written content.
    pub checksum: String,
}

/// Writes documents under one definitions directory.
///
/// # Examples
///
/// ```no_run
/// use tabular_schema_convert::OutputFormat;
/// use tabular_schema_core::{Document, SchemaKind, SchemaNode};
/// use tabular_schema_store::DefinitionWriter;
///
/// let writer = DefinitionWriter::new("out/accounts/definitions", OutputFormat::Yaml);
/// let written = writer
///     .write_document(&Document::new("Amount", SchemaNode::of_kind(SchemaKind::String)))
///     .unwrap();
/// assert!(written.path.ends_with("Amount.yaml"));
/// ```
#[derive(Debug, Clone)]
pub struct DefinitionWriter {
    dir: PathBuf,
    format: OutputFormat,
}

impl DefinitionWriter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{}", self.format.extension()))
    }

    /// Path of the run report.
    pub fn report_path(&self) -> PathBuf {
        let parent = self.dir.parent().unwrap_or(&self.dir);
        parent.join(format!("{REPORT_STEM}.{}", self.format.extension()))
    }

    /// Writes one document, creating the directory if needed.
    pub fn write_document(&self, document: &Document) -> Result<WrittenFile> {
        std::fs::create_dir_all(&self.dir)?;
        let content = format_document(document, self.format).map_err(StoreError::FormatError)?;
        let path = self.path_for(&document.key);
        std::fs::write(&path, &content)?;
        debug!(key = %document.key, path = %path.display(), "wrote definition");
        Ok(WrittenFile {
            key: document.key.clone(),
            path,
            checksum: checksum(content.as_bytes()),
        })
    }

    /// Writes every document of `definitions`, in set order.
    pub fn write_all(&self, definitions: &DefinitionSet) -> Result<Vec<WrittenFile>> {
        let written = definitions
            .iter()
            .map(|document| self.write_document(document))
            .collect::<Result<Vec<_>>>()?;
        info!(dir = %self.dir.display(), files = written.len(), "wrote definitions");
        Ok(written)
    }

    /// Deletes the files of `keys` left by earlier runs.
    ///
    /// Returns the paths that existed and were removed.
    pub fn remove_keys<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for key in keys {
            let path = self.path_for(key);
            if path.is_file() {
                std::fs::remove_file(&path)?;
                info!(key, path = %path.display(), "removed definition");
                removed.push(path);
            }
        }
        Ok(removed)
    }

    /// Writes the run report.
    pub fn write_report(&self, report: &ConversionReport) -> Result<PathBuf> {
        let path = self.report_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = format_report(report, self.format).map_err(StoreError::FormatError)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Reads a previously written document back.
    pub fn read_document(&self, key: &str) -> Result<Document> {
        let text = std::fs::read_to_string(self.path_for(key))?;
        let document = match self.format {
            OutputFormat::Yaml => serde_yaml::from_str(&text)?,
            OutputFormat::Json => serde_json::from_str(&text)?,
        };
        Ok(document)
    }
}

/// SHA-256 hex digest of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
