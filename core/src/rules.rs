//! Naming rules of the data standard.
//!
//! [`ConversionRules`] holds every list the converter consults by name: the
//! namespace that marks shareable composites, the container types that stay
//! inline, the allow-list of names that are always separate definitions, the
//! types whose field descriptions are embedded at the point of use, the
//! globally shared types that are never written per table, and the mandatory
//! fields of detail variants. The defaults reproduce the Open Banking
//! read/write standard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declared class of monetary amounts.
pub const CURRENCY_AMOUNT_CLASS: &str = "ActiveOrHistoricCurrencyAndAmount";
/// Declared class of currency codes.
pub const CURRENCY_CODE_CLASS: &str = "ActiveOrHistoricCurrencyCode";
/// Declared class of ISO-8601 timestamps.
pub const ISO_DATE_TIME_CLASS: &str = "ISODateTime";
/// Key of the shared monetary-string definition.
pub const AMOUNT_KEY: &str = "Amount";
/// Pattern of the shared monetary-string definition.
pub const AMOUNT_PATTERN: &str = r"^\d{1,13}\.\d{1,5}$";

/// Rule lists used to decide standalone definitions and special cases.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::ConversionRules;
///
/// let rules = ConversionRules::default();
/// assert!(rules.is_standalone("OBCashAccount5", "Account"));
/// assert!(!rules.is_standalone("OBReadDataAccount2", "Data"));
/// assert!(rules.is_standalone("OBReadData1", "Data"));
/// assert!(!rules.is_standalone("Max40Text", "Nickname"));
/// assert!(rules.is_common_type("Links"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionRules {
    /// Declared classes starting with this prefix are shareable composites.
    pub namespace_prefix: String,
    /// Declared classes starting with this prefix are containers of
    /// containers and stay inline.
    pub container_prefix: String,
    /// Containers that are standalone regardless of `container_prefix`.
    pub allowed_containers: Vec<String>,
    /// Record names that always become standalone definitions.
    pub separate_definitions: Vec<String>,
    /// Declared class that is never separated through the name allow-list.
    pub never_separate_class: String,
    /// Keys whose references carry the field description inline.
    pub embed_description: Vec<String>,
    /// Keys emitted once globally and never written per table.
    pub common_types: Vec<String>,
    /// Required fields added to `<Key>Detail` variants.
    pub mandatory_detail: BTreeMap<String, Vec<String>>,
}

impl Default for ConversionRules {
    fn default() -> Self {
        Self {
            namespace_prefix: "OB".to_string(),
            container_prefix: "OBReadData".to_string(),
            allowed_containers: vec!["OBReadData1".to_string(), "OBReadDataResponse1".to_string()],
            separate_definitions: Vec::new(),
            never_separate_class: CURRENCY_AMOUNT_CLASS.to_string(),
            embed_description: vec![
                "OBCashAccount1".to_string(),
                "OBBranchAndFinancialInstitutionIdentification2".to_string(),
                "OBCreditDebitCode".to_string(),
                "OBCashAccount2".to_string(),
            ],
            common_types: vec![
                "OBRisk2".to_string(),
                "Links".to_string(),
                ISO_DATE_TIME_CLASS.to_string(),
                "Meta".to_string(),
            ],
            mandatory_detail: BTreeMap::from([(
                "OBAccount1".to_string(),
                vec!["Account".to_string()],
            )]),
        }
    }
}

impl ConversionRules {
    /// Returns `true` when a node with this declared class and name becomes a
    /// standalone, `$ref`-able definition rather than an inline schema.
    pub fn is_standalone(&self, declared_class: &str, name: &str) -> bool {
        let namespaced = !self.namespace_prefix.is_empty()
            && declared_class.starts_with(&self.namespace_prefix)
            && (self.container_prefix.is_empty()
                || !declared_class.starts_with(&self.container_prefix)
                || self.allowed_containers.iter().any(|c| c == declared_class));

        namespaced
            || (self.separate_definitions.iter().any(|n| n == name)
                && declared_class != self.never_separate_class)
    }

    /// Returns `true` when references to `key` embed the field description.
    pub fn embeds_description(&self, key: &str) -> bool {
        self.embed_description.iter().any(|k| k == key)
    }

    /// Returns `true` when `key` is a globally shared type.
    pub fn is_common_type(&self, key: &str) -> bool {
        self.common_types.iter().any(|k| k == key)
    }

    /// Mandatory detail fields configured for `key` (empty when none).
    pub fn mandatory_detail_fields(&self, key: &str) -> &[String] {
        self.mandatory_detail
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_separates_plain_fields() {
        let rules = ConversionRules {
            separate_definitions: vec!["AccountId".to_string(), "Amount".to_string()],
            ..Default::default()
        };
        assert!(rules.is_standalone("Max40Text", "AccountId"));
        assert!(!rules.is_standalone(CURRENCY_AMOUNT_CLASS, "Amount"));
    }

    #[test]
    fn test_currency_exclusion_only_applies_to_allow_list() {
        let rules = ConversionRules {
            namespace_prefix: "Active".to_string(),
            ..Default::default()
        };
        assert!(rules.is_standalone(CURRENCY_AMOUNT_CLASS, "Amount"));
    }

    #[test]
    fn test_allowed_containers_override_container_prefix() {
        let rules = ConversionRules::default();
        assert!(rules.is_standalone("OBReadDataResponse1", "Data"));
        assert!(!rules.is_standalone("OBReadDataTransaction2", "Data"));
        assert!(!rules.is_standalone("", ""));
    }

    #[test]
    fn test_mandatory_detail_defaults() {
        let rules = ConversionRules::default();
        assert_eq!(rules.mandatory_detail_fields("OBAccount1"), ["Account"]);
        assert!(rules.mandatory_detail_fields("OBBalance1").is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let rules: ConversionRules =
            serde_yaml::from_str("separate_definitions: [AccountId]\n").unwrap();
        assert_eq!(rules.separate_definitions, ["AccountId"]);
        assert_eq!(rules.namespace_prefix, "OB");
        assert!(rules.embeds_description("OBCashAccount1"));
    }
}
