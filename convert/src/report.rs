//! Structured conversion reporting.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One canonical key that received conflicting descriptions.
///
/// The key's output is discarded; the report lists every distinct
/// description (an absent description is `None`) and where each came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub key: String,
    pub descriptions: Vec<Option<String>>,
    /// Record paths that registered the key, in processing order.
    pub paths: Vec<String>,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} distinct descriptions from {} records)",
            self.key,
            self.descriptions.len(),
            self.paths.len()
        )
    }
}

/// Per-table summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub records: usize,
    /// Standalone documents the table produced before cross-table merging.
    pub definitions: usize,
}

/// Report of one full conversion run, suitable for operator review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub tool_version: String,
    pub generated_at: String,
    pub tables: Vec<TableReport>,
    /// Keys of the documents in the final output, in output order.
    pub definitions: Vec<String>,
    /// Shared keys left out of per-table output.
    pub skipped_common_types: Vec<String>,
    pub collisions: Vec<Collision>,
}

impl ConversionReport {
    pub fn new(tool_version: &str) -> Self {
        Self {
            tool_version: tool_version.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            tables: Vec::new(),
            definitions: Vec::new(),
            skipped_common_types: Vec::new(),
            collisions: Vec::new(),
        }
    }

    /// Keys dropped because of collisions.
    pub fn collision_keys(&self) -> Vec<&str> {
        self.collisions.iter().map(|c| c.key.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_serializes_missing_description_as_null() {
        let collision = Collision {
            key: "OBAccount1".to_string(),
            descriptions: vec![None, Some("An account.".to_string())],
            paths: vec!["A/Account".to_string(), "B/Account".to_string()],
        };
        let json = serde_json::to_value(&collision).unwrap();
        assert_eq!(json["descriptions"][0], serde_json::Value::Null);
        assert_eq!(json["descriptions"][1], "An account.");
        assert_eq!(
            collision.to_string(),
            "OBAccount1 (2 distinct descriptions from 2 records)"
        );
    }

    #[test]
    fn test_report_collision_keys() {
        let mut report = ConversionReport::new("0.1.0");
        assert!(report.collision_keys().is_empty());
        report.collisions.push(Collision {
            key: "K".to_string(),
            descriptions: vec![Some("a".to_string()), Some("b".to_string())],
            paths: vec!["P".to_string()],
        });
        assert_eq!(report.collision_keys(), ["K"]);
        assert!(!report.generated_at.is_empty());
    }
}
