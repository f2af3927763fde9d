//! Schema tree building.
//!
//! [`build`] reconstructs the nested schema of one record from a flat table,
//! post-order: children are built first, then assembled into the parent's
//! `properties`. Each child appears in its parent either as a `$ref` to its
//! standalone definition or as its inline schema, wrapped in an array when
//! its cardinality is repeated.
//!
//! Object schemas are closed (`additionalProperties: false`) and list as
//! `required` exactly the children whose minimum occurrence is not zero.

use tracing::debug;

use tabular_schema_core::{
    AMOUNT_KEY, AMOUNT_PATTERN, CURRENCY_AMOUNT_CLASS, ConversionRules, Document, PropertyMap,
    Record, RecordPath, SchemaKind, SchemaNode,
};

use crate::classify::{classify, describe};
use crate::permissions::{detail_fields, split};
use crate::registry::DefinitionRegistry;

/// Inputs shared by every node of one table.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// All records of the table.
    pub table: &'a [Record],
    /// Paths of permission-gated fields.
    pub permissions: &'a [RecordPath],
    pub rules: &'a ConversionRules,
    /// Appended to the description of ISO date-time fields.
    pub iso_description: &'a str,
}

/// Result of building one record.
#[derive(Debug, Clone)]
pub struct BuiltNode {
    /// Canonical key of the record.
    pub key: String,
    /// Schema used when the node is inlined into its parent. For split
    /// nodes this is the `<Key>` composition.
    pub schema: SchemaNode,
    /// Whether the node is referenced by `$ref` rather than inlined.
    pub standalone: bool,
    /// Standalone documents produced by this node and its descendants, own
    /// documents first.
    pub documents: Vec<Document>,
}

/// The shared monetary-string definition.
pub fn amount_definition() -> Document {
    Document::new(
        AMOUNT_KEY,
        SchemaNode::of_kind(SchemaKind::String).with_pattern(AMOUNT_PATTERN),
    )
}

/// `true` for composites that must expose the shared `Amount` field.
pub fn is_currency_amount_key(key: &str) -> bool {
    key.ends_with(CURRENCY_AMOUNT_CLASS)
}

/// Direct children of `record` in table order.
pub fn children_of<'a>(record: &Record, table: &'a [Record]) -> Vec<&'a Record> {
    table.iter().filter(|r| r.is_child_of(record)).collect()
}

/// Builds the schema of `record` and of everything below it.
///
/// Standalone nodes are registered in `registry` (except embed-description
/// types, whose description belongs to the referencing field).
pub fn build(record: &Record, ctx: &BuildContext<'_>, registry: &mut DefinitionRegistry) -> BuiltNode {
    let class = classify(record);
    let key = class.key;
    let standalone = ctx.rules.is_standalone(&record.declared_class, &record.name);
    let embeds_description = ctx.rules.embeds_description(&key);

    if standalone && !embeds_description {
        registry.register(&key, &record.path, record.description.as_deref());
    }

    let children = children_of(record, ctx.table);
    let built: Vec<BuiltNode> = children
        .iter()
        .map(|child| build(child, ctx, registry))
        .collect();

    let mut schema = SchemaNode::of_kind(class.kind);
    if !embeds_description {
        schema.description = describe(record, ctx.iso_description);
    }
    if class.kind == SchemaKind::Object {
        let mut properties: PropertyMap = children
            .iter()
            .zip(&built)
            .map(|(child, node)| (child.name.clone(), property_entry(child, node, ctx)))
            .collect();
        let mut required: Vec<String> = children
            .iter()
            .filter(|child| !child.cardinality.is_optional())
            .map(|child| child.name.clone())
            .collect();
        if is_currency_amount_key(&key) {
            properties.insert_first(AMOUNT_KEY, SchemaNode::reference(AMOUNT_KEY));
            if !required.iter().any(|name| name == AMOUNT_KEY) {
                required.insert(0, AMOUNT_KEY.to_string());
            }
        }
        schema.properties = Some(properties);
        schema.required = required;
        schema.additional_properties = Some(false);
    }
    class.constraints.apply(&mut schema);

    // Only standalone nodes split: an inline composite would reference a
    // `<Key>Basic` document that is never written.
    let gated = if standalone && class.kind == SchemaKind::Object {
        detail_fields(record, &children, ctx.permissions)
    } else {
        Vec::new()
    };

    let mut documents = Vec::new();
    let schema = if gated.is_empty() {
        if standalone {
            documents.push(Document::new(key.clone(), schema.clone()));
        }
        schema
    } else {
        let names: Vec<&str> = gated.iter().map(|r| r.name.as_str()).collect();
        debug!(key = %key, gated = ?names, "splitting permission-gated node");
        let split = split(&key, schema, &names, ctx.rules.mandatory_detail_fields(&key));
        let composite = split.composite.schema.clone();
        documents.extend(split.into_documents());
        composite
    };

    for child in built {
        documents.extend(child.documents);
    }
    if is_currency_amount_key(&key) {
        documents.push(amount_definition());
    }

    debug!(
        key = %key,
        path = %record.path,
        standalone,
        documents = documents.len(),
        "built schema node"
    );

    BuiltNode {
        key,
        schema,
        standalone,
        documents,
    }
}

/// The property entry a parent holds for `child`.
fn property_entry(child: &Record, node: &BuiltNode, ctx: &BuildContext<'_>) -> SchemaNode {
    let description = describe(child, ctx.iso_description);

    if child.cardinality.is_repeated() {
        let items = if node.standalone {
            SchemaNode::reference(&node.key)
        } else {
            // The array carries the field description.
            SchemaNode {
                description: None,
                ..node.schema.clone()
            }
        };
        let mut array = SchemaNode::array_of(items);
        array.description = description;
        array.min_items = child.cardinality.min_occurrence().filter(|min| *min > 0);
        return array;
    }

    if !node.standalone {
        return node.schema.clone();
    }
    let reference = SchemaNode::reference(&node.key);
    match description {
        Some(text) if ctx.rules.embeds_description(&node.key) => {
            SchemaNode::composition(vec![reference, SchemaNode::described(&text)])
        }
        _ => reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, class: &str, path: &str, cardinality: &str) -> Record {
        Record::new(name, class, path, cardinality.parse().unwrap())
    }

    fn build_root(table: &[Record], permissions: &[RecordPath]) -> (BuiltNode, DefinitionRegistry) {
        let rules = ConversionRules::default();
        let ctx = BuildContext {
            table,
            permissions,
            rules: &rules,
            iso_description: "ISO 8601 date-time.",
        };
        let mut registry = DefinitionRegistry::new();
        let node = build(&table[0], &ctx, &mut registry);
        (node, registry)
    }

    fn document<'a>(node: &'a BuiltNode, key: &str) -> &'a SchemaNode {
        &node
            .documents
            .iter()
            .find(|doc| doc.key == key)
            .unwrap_or_else(|| panic!("missing document {key}"))
            .schema
    }

    #[test]
    fn test_required_is_exactly_non_optional_children() {
        let table = vec![
            rec("Account", "OBAccount1", "R/Account", "1..1"),
            rec("AccountId", "Max40Text", "R/Account/AccountId", "1..1"),
            rec("Nickname", "Max70Text", "R/Account/Nickname", "0..1"),
            rec("Servicer", "OBBranchAndFinancialInstitutionIdentification4", "R/Account/Servicer", "0..1"),
            rec("Balance", "OBBalance1", "R/Account/Balance", "1..n"),
            rec("Tag", "Max35Text", "R/Account/Tag", "0..n"),
        ];
        let (node, _) = build_root(&table, &[]);

        let schema = document(&node, "OBAccount1");
        assert_eq!(schema.required, ["AccountId", "Balance"]);
        assert_eq!(schema.additional_properties, Some(false));
        assert_eq!(
            schema.properties.as_ref().unwrap().keys().collect::<Vec<_>>(),
            ["AccountId", "Nickname", "Servicer", "Balance", "Tag"]
        );
    }

    #[test]
    fn test_standalone_children_are_references_and_plain_ones_inline() {
        let table = vec![
            rec("Account", "OBAccount1", "R/Account", "1..1"),
            rec("AccountId", "Max40Text", "R/Account/AccountId", "1..1")
                .with_description("Identifier."),
            rec("Servicer", "OBBranchAndFinancialInstitutionIdentification4", "R/Account/Servicer", "0..1"),
        ];
        let (node, _) = build_root(&table, &[]);
        let schema = document(&node, "OBAccount1");

        let id = schema.property("AccountId").unwrap();
        assert_eq!(id.kind, Some(SchemaKind::String));
        assert_eq!(id.max_length, Some(40));
        assert_eq!(id.min_length, Some(1));
        assert_eq!(id.description.as_deref(), Some("Identifier."));

        let servicer = schema.property("Servicer").unwrap();
        assert_eq!(
            servicer.referenced_key(),
            Some("OBBranchAndFinancialInstitutionIdentification4")
        );
        assert!(node
            .documents
            .iter()
            .any(|d| d.key == "OBBranchAndFinancialInstitutionIdentification4"));
        assert!(!node.documents.iter().any(|d| d.key == "AccountId"));
    }

    #[test]
    fn test_array_min_items_only_for_one_to_many() {
        let table = vec![
            rec("Data", "OBReadData1", "R/Data", "1..1"),
            rec("Account", "OBAccount1", "R/Data/Account", "1..n").with_description("Accounts."),
            rec("Balance", "OBBalance1", "R/Data/Balance", "0..n"),
        ];
        let (node, _) = build_root(&table, &[]);
        let schema = document(&node, "OBReadData1");

        let accounts = schema.property("Account").unwrap();
        assert_eq!(accounts.kind, Some(SchemaKind::Array));
        assert_eq!(accounts.min_items, Some(1));
        assert_eq!(accounts.description.as_deref(), Some("Accounts."));
        assert_eq!(accounts.items.as_ref().unwrap().referenced_key(), Some("OBAccount1"));

        let balances = schema.property("Balance").unwrap();
        assert_eq!(balances.kind, Some(SchemaKind::Array));
        assert_eq!(balances.min_items, None);
    }

    #[test]
    fn test_inline_repeated_child_is_wrapped_in_array() {
        let table = vec![
            rec("Account", "OBAccount1", "R/Account", "1..1"),
            rec("Tag", "Max35Text", "R/Account/Tag", "1..n").with_description("Tags."),
        ];
        let (node, _) = build_root(&table, &[]);
        let tag = document(&node, "OBAccount1").property("Tag").unwrap();

        assert_eq!(tag.kind, Some(SchemaKind::Array));
        assert_eq!(tag.description.as_deref(), Some("Tags."));
        let items = tag.items.as_ref().unwrap();
        assert_eq!(items.kind, Some(SchemaKind::String));
        assert_eq!(items.max_length, Some(35));
        assert_eq!(items.description, None);
    }

    #[test]
    fn test_embed_description_wraps_reference() {
        let table = vec![
            rec("Transaction", "OBTransaction1", "R/Transaction", "1..1"),
            rec("CreditorAccount", "OBCashAccount1", "R/Transaction/CreditorAccount", "0..1")
                .with_description("Creditor side."),
        ];
        let (node, registry) = build_root(&table, &[]);
        let entry = document(&node, "OBTransaction1")
            .property("CreditorAccount")
            .unwrap();

        assert_eq!(entry.all_of.len(), 2);
        assert_eq!(entry.all_of[0].referenced_key(), Some("OBCashAccount1"));
        assert_eq!(entry.all_of[1].description.as_deref(), Some("Creditor side."));

        // The shared definition carries no field-specific description.
        assert_eq!(document(&node, "OBCashAccount1").description, None);
        assert!(!registry.contains("OBCashAccount1"));
    }

    #[test]
    fn test_currency_composite_exposes_required_amount() {
        let table = vec![
            rec("Initiation", "OBInitiation1", "Data/Initiation", "1..1"),
            rec("InstructedAmount", "OBActiveOrHistoricCurrencyAndAmount", "Data/Initiation/InstructedAmount", "1..1"),
            rec("Amount", "ActiveOrHistoricCurrencyAndAmount", "Data/Initiation/InstructedAmount/Amount", "1..1"),
            rec("Currency", "ActiveOrHistoricCurrencyCode", "Data/Initiation/InstructedAmount/Currency", "1..1")
                .with_pattern("^[A-Z]{3,3}$"),
        ];
        let (node, _) = build_root(&table, &[]);

        let composite = document(&node, "OBActiveOrHistoricCurrencyAndAmount");
        assert_eq!(composite.required, ["Amount", "Currency"]);

        let amount_field = composite.property("Amount").unwrap();
        assert_eq!(amount_field.kind, Some(SchemaKind::Object));
        assert_eq!(amount_field.required, ["Amount"]);
        assert_eq!(
            amount_field.property("Amount").unwrap().referenced_key(),
            Some("Amount")
        );

        let currency = composite.property("Currency").unwrap();
        assert_eq!(currency.kind, Some(SchemaKind::String));
        assert_eq!(currency.pattern.as_deref(), Some("^[A-Z]{3,3}$"));

        let amount = document(&node, "Amount");
        assert_eq!(amount.kind, Some(SchemaKind::String));
        assert_eq!(amount.pattern.as_deref(), Some(r"^\d{1,13}\.\d{1,5}$"));
    }

    #[test]
    fn test_currency_composite_without_amount_row_gets_one_inserted_first() {
        let table = vec![
            rec("Charge", "OBActiveOrHistoricCurrencyAndAmount", "R/Charge", "1..1"),
            rec("Currency", "ActiveOrHistoricCurrencyCode", "R/Charge/Currency", "1..1"),
        ];
        let (node, _) = build_root(&table, &[]);
        let schema = document(&node, "OBActiveOrHistoricCurrencyAndAmount");

        assert_eq!(
            schema.properties.as_ref().unwrap().keys().collect::<Vec<_>>(),
            ["Amount", "Currency"]
        );
        assert_eq!(schema.required, ["Amount", "Currency"]);
    }

    #[test]
    fn test_permission_split_produces_three_documents() {
        let table = vec![
            rec("Account", "OBAccount1", "R/Account", "1..1").with_description("An account."),
            rec("AccountId", "Max40Text", "R/Account/AccountId", "1..1"),
            rec("Account", "OBCashAccount5", "R/Account/Account", "0..1"),
        ];
        let permissions = vec![RecordPath::parse("R/Account/Account")];
        let (node, _) = build_root(&table, &permissions);

        let keys: Vec<&str> = node.documents.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(
            keys,
            ["OBAccount1Basic", "OBAccount1", "OBAccount1Detail", "OBCashAccount5"]
        );

        let basic = document(&node, "OBAccount1Basic");
        assert_eq!(basic.description.as_deref(), Some("An account."));
        assert_eq!(basic.kind, Some(SchemaKind::Object));
        assert!(basic.property("Account").is_none());

        let composite = document(&node, "OBAccount1");
        assert_eq!(composite.kind, None);
        assert_eq!(composite.referenced_keys(), ["OBAccount1Basic", "OBCashAccount5"]);

        let detail = document(&node, "OBAccount1Detail");
        assert_eq!(detail.all_of[0].referenced_key(), Some("OBAccount1"));
        assert_eq!(detail.all_of[1].required, ["Account"]);

        assert_eq!(node.schema, *composite);
    }

    #[test]
    fn test_gated_inline_container_is_not_split() {
        let table = vec![
            rec("R", "OBR1", "R", "1..1"),
            rec("Data", "OBReadDataFoo2", "R/Data", "1..1"),
            rec("X", "OBX1", "R/Data/X", "0..1"),
        ];
        let permissions = vec![RecordPath::parse("R/Data/X")];
        let (node, _) = build_root(&table, &permissions);

        let keys: Vec<&str> = node.documents.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, ["OBR1", "OBX1"]);
        for doc in &node.documents {
            for target in doc.schema.referenced_keys() {
                assert!(keys.contains(&target), "{} references missing {target}", doc.key);
            }
        }

        let data = document(&node, "OBR1").property("Data").unwrap();
        assert_eq!(data.kind, Some(SchemaKind::Object));
        assert_eq!(data.property("X").unwrap().referenced_key(), Some("OBX1"));
    }

    #[test]
    fn test_iso_date_time_field() {
        let table = vec![
            rec("Balance", "OBBalance1", "R/Balance", "1..1"),
            rec("DateTime", "ISODateTime", "R/Balance/DateTime", "1..1")
                .with_description("Balance date."),
        ];
        let (node, _) = build_root(&table, &[]);
        let field = document(&node, "OBBalance1").property("DateTime").unwrap();

        assert_eq!(field.kind, Some(SchemaKind::String));
        assert_eq!(field.format.as_deref(), Some("date-time"));
        assert_eq!(
            field.description.as_deref(),
            Some("Balance date.\nISO 8601 date-time.")
        );
    }

    #[test]
    fn test_registry_records_standalone_nodes_only() {
        let table = vec![
            rec("Account", "OBAccount1", "R/Account", "1..1").with_description("An account."),
            rec("Nickname", "Max70Text", "R/Account/Nickname", "0..1"),
        ];
        let (_, registry) = build_root(&table, &[]);
        assert!(registry.contains("OBAccount1"));
        assert!(!registry.contains("Nickname"));
        assert_eq!(registry.descriptions("OBAccount1"), Some(vec![Some("An account.")]));
    }

    #[test]
    fn test_children_skip_deeper_levels() {
        let table = vec![
            rec("R", "OBRoot1", "R", "1..1"),
            rec("A", "OBA1", "R/A", "1..1"),
            rec("B", "Max35Text", "R/A/B", "1..1"),
        ];
        let children = children_of(&table[0], &table);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "A");
    }
}
