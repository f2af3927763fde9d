//! Output formatting for definition documents and reports.

use tabular_schema_core::{DefinitionSet, Document};

use crate::report::ConversionReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// Formats one document as the content of its definition file.
pub fn format_document(document: &Document, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut text| {
                text.push('\n');
                text
            })
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

/// Formats a whole set for display.
///
/// YAML output is a stream of single-definition documents separated by `---`;
/// JSON output is one object mapping every key to its schema.
pub fn format_definitions(definitions: &DefinitionSet, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(definitions)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            let mut out = String::new();
            for (idx, document) in definitions.iter().enumerate() {
                if idx > 0 {
                    out.push_str("---\n");
                }
                out.push_str(&format_document(document, format)?);
            }
            Ok(out)
        }
    }
}

/// Formats a conversion report in the requested output format.
pub fn format_report(report: &ConversionReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Collision;
    use tabular_schema_core::{SchemaKind, SchemaNode};

    fn amount() -> Document {
        Document::new(
            "Amount",
            SchemaNode::of_kind(SchemaKind::String).with_pattern(r"^\d{1,13}\.\d{1,5}$"),
        )
    }

    #[test]
    fn test_format_document_yaml() {
        let yaml = format_document(&amount(), OutputFormat::Yaml).unwrap();
        assert!(yaml.starts_with("Amount:\n"));
        assert!(yaml.contains("  type: string"));
        assert!(yaml.contains(r"\d{1,13}\.\d{1,5}"));
    }

    #[test]
    fn test_format_document_json() {
        let json = format_document(&amount(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Amount"]["type"], "string");
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn test_yaml_property_order_follows_insertion() {
        let mut node = SchemaNode::of_kind(SchemaKind::Object);
        node.properties = Some(
            [
                ("Zeta", SchemaNode::reference("Zeta")),
                ("Alpha", SchemaNode::reference("Alpha")),
            ]
            .into_iter()
            .collect(),
        );
        let yaml = format_document(&Document::new("OBThing1", node), OutputFormat::Yaml).unwrap();
        let zeta = yaml.find("Zeta:").unwrap();
        let alpha = yaml.find("Alpha:").unwrap();
        assert!(zeta < alpha);
        assert!(yaml.contains("#/definitions/Zeta"));
    }

    #[test]
    fn test_format_definitions() {
        let set: DefinitionSet = [
            amount(),
            Document::new("Flag", SchemaNode::of_kind(SchemaKind::Boolean)),
        ]
        .into_iter()
        .collect();

        let yaml = format_definitions(&set, OutputFormat::Yaml).unwrap();
        assert_eq!(yaml.matches("---\n").count(), 1);

        let json = format_definitions(&set, OutputFormat::Json).unwrap();
        assert!(json.find("\"Amount\"").unwrap() < json.find("\"Flag\"").unwrap());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Flag"]["type"], "boolean");
        assert_eq!(value["Amount"]["type"], "string");
    }

    #[test]
    fn test_format_report() {
        let mut report = ConversionReport::new("0.1.0");
        report.definitions = vec!["OBAccount1".to_string()];
        report.collisions.push(Collision {
            key: "OBBalance1".to_string(),
            descriptions: vec![Some("a".to_string()), Some("b".to_string())],
            paths: vec!["A/Balance".to_string(), "B/Balance".to_string()],
        });

        let yaml = format_report(&report, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("tool_version:"));
        assert!(yaml.contains("key: OBBalance1"));

        let json = format_report(&report, OutputFormat::Json).unwrap();
        assert!(json.contains("\"definitions\": ["));
    }

    #[test]
    fn test_extension() {
        assert_eq!(OutputFormat::Yaml.extension(), "yaml");
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert_eq!(OutputFormat::default(), OutputFormat::Yaml);
    }
}
