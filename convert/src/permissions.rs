//! Basic/detail splitting of permission-gated composites.
//!
//! Some fields of a composite are only visible under elevated access. For
//! such a node the converter emits three definitions instead of one:
//!
//! - `<Key>Basic`: the full schema minus the gated fields;
//! - `<Key>`: `allOf` of a reference to `<Key>Basic` and the gated
//!   properties;
//! - `<Key>Detail`: `allOf` of a reference to `<Key>`, plus the configured
//!   mandatory gated fields.

use tabular_schema_core::{Document, PropertyMap, Record, RecordPath, SchemaNode};

pub const BASIC_SUFFIX: &str = "Basic";
pub const DETAIL_SUFFIX: &str = "Detail";

/// Direct children of `node` that are gated by a permission path.
///
/// A child is gated when its path starts with a permission path lying
/// strictly under `node`. No matching permission entries means no gated
/// children.
pub fn detail_fields<'r>(
    node: &Record,
    children: &[&'r Record],
    permissions: &[RecordPath],
) -> Vec<&'r Record> {
    let scoped: Vec<&RecordPath> = permissions
        .iter()
        .filter(|permission| permission.is_under(&node.path))
        .collect();
    if scoped.is_empty() {
        return Vec::new();
    }
    children
        .iter()
        .copied()
        .filter(|child| scoped.iter().any(|p| child.path.starts_with(p)))
        .collect()
}

/// The three documents of a split node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSchemas {
    pub basic: Document,
    pub composite: Document,
    pub detail: Document,
}

impl SplitSchemas {
    /// Documents in output order: basic, composite, detail.
    pub fn into_documents(self) -> [Document; 3] {
        [self.basic, self.composite, self.detail]
    }
}

/// Splits the full schema of `key` on the gated property names.
///
/// The gated properties move out of the basic schema (and out of its
/// `required` list) into the composite; type, description, and scalar
/// constraints stay on the basic schema.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::{PropertyMap, SchemaKind, SchemaNode};
/// use tabular_schema_convert::permissions::split;
///
/// let mut full = SchemaNode::of_kind(SchemaKind::Object);
/// full.properties = Some(
///     [
///         ("AccountId", SchemaNode::reference("AccountId")),
///         ("Account", SchemaNode::reference("OBCashAccount5")),
///     ]
///     .into_iter()
///     .collect::<PropertyMap>(),
/// );
///
/// let split = split("OBAccount1", full, &["Account"], &["Account".to_string()]);
/// assert_eq!(split.basic.key, "OBAccount1Basic");
/// assert!(split.basic.schema.property("Account").is_none());
/// assert_eq!(split.composite.schema.referenced_keys(), ["OBAccount1Basic", "OBCashAccount5"]);
/// assert_eq!(split.detail.schema.all_of[1].required, ["Account"]);
/// ```
pub fn split(key: &str, full: SchemaNode, gated: &[&str], mandatory: &[String]) -> SplitSchemas {
    let basic_key = format!("{key}{BASIC_SUFFIX}");
    let mut basic = full;

    let mut detail_properties = PropertyMap::new();
    if let Some(properties) = basic.properties.as_mut() {
        for name in gated {
            if let Some(node) = properties.remove(name) {
                detail_properties.insert(*name, node);
            }
        }
    }
    basic.required.retain(|name| !gated.contains(&name.as_str()));

    let composite = SchemaNode::composition(vec![
        SchemaNode::reference(&basic_key),
        SchemaNode {
            properties: Some(detail_properties),
            ..Default::default()
        },
    ]);

    let mut detail_parts = vec![SchemaNode::reference(key)];
    if !mandatory.is_empty() {
        detail_parts.push(SchemaNode {
            required: mandatory.to_vec(),
            ..Default::default()
        });
    }

    SplitSchemas {
        basic: Document::new(basic_key, basic),
        composite: Document::new(key, composite),
        detail: Document::new(format!("{key}{DETAIL_SUFFIX}"), SchemaNode::composition(detail_parts)),
    }
}

#[cfg(test)]
mod tests {
    use tabular_schema_core::{Cardinality, SchemaKind};

    use super::*;

    fn record(path: &str) -> Record {
        let name = path.rsplit('/').next().unwrap_or_default();
        Record::new(name, "OBAccount1", path, Cardinality::ZeroToOne)
    }

    #[test]
    fn test_detail_fields_matches_permission_paths_under_node() {
        let node = record("R/Data/Account");
        let id = record("R/Data/Account/AccountId");
        let servicer = record("R/Data/Account/Servicer");
        let account = record("R/Data/Account/Account");
        let children = [&id, &servicer, &account];
        let permissions = vec![
            RecordPath::parse("R/Data/Account/Account"),
            RecordPath::parse("R/Data/Account/Servicer"),
            RecordPath::parse("R/Data/Other/Servicer"),
        ];

        let gated: Vec<&str> = detail_fields(&node, &children, &permissions)
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(gated, ["Servicer", "Account"]);
    }

    #[test]
    fn test_detail_fields_ignores_permission_on_node_itself() {
        let node = record("R/Data/Account");
        let id = record("R/Data/Account/AccountId");
        let permissions = vec![RecordPath::parse("R/Data/Account")];
        assert!(detail_fields(&node, &[&id], &permissions).is_empty());
        assert!(detail_fields(&node, &[&id], &[]).is_empty());
    }

    #[test]
    fn test_detail_fields_ignores_deeper_permission_paths() {
        let node = record("R/Data");
        let account = record("R/Data/Account");
        let permissions = vec![RecordPath::parse("R/Data/Account/Servicer")];
        assert!(detail_fields(&node, &[&account], &permissions).is_empty());
    }

    #[test]
    fn test_split_moves_required_gated_fields() {
        let mut full = SchemaNode::of_kind(SchemaKind::Object).with_description("An account.");
        full.properties = Some(
            [
                ("AccountId", SchemaNode::reference("AccountId")),
                ("Account", SchemaNode::reference("OBCashAccount5")),
            ]
            .into_iter()
            .collect(),
        );
        full.required = vec!["AccountId".to_string(), "Account".to_string()];
        full.additional_properties = Some(false);

        let split = split("OBAccount1", full, &["Account"], &[]);

        assert_eq!(split.basic.schema.required, ["AccountId"]);
        assert_eq!(split.basic.schema.description.as_deref(), Some("An account."));
        assert_eq!(split.basic.schema.kind, Some(SchemaKind::Object));
        assert_eq!(split.basic.schema.additional_properties, Some(false));

        assert_eq!(split.composite.key, "OBAccount1");
        assert_eq!(split.composite.schema.kind, None);
        assert_eq!(split.composite.schema.description, None);
        let gated = split.composite.schema.all_of[1].properties.as_ref().unwrap();
        assert_eq!(gated.keys().collect::<Vec<_>>(), ["Account"]);

        assert_eq!(split.detail.key, "OBAccount1Detail");
        assert_eq!(split.detail.schema.all_of.len(), 1);
        assert_eq!(split.detail.schema.referenced_keys(), ["OBAccount1"]);
    }
}
