//! JSON-Schema-compatible schema nodes.
//!
//! [`SchemaNode`] serializes directly to the schema fragment that is written
//! to disk: field names follow JSON Schema (`$ref`, `allOf`, `type`, `enum`,
//! `minLength`, ...) and absent constraints are skipped. Property maps keep
//! insertion order so that output is reproducible and mirrors table order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Prefix of every cross-document reference.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Returns the `$ref` target for a canonical key.
///
/// # Examples
///
/// ```
/// assert_eq!(tabular_schema_core::definition_ref("Amount"), "#/definitions/Amount");
/// ```
pub fn definition_ref(key: &str) -> String {
    format!("{DEFINITIONS_PREFIX}{key}")
}

/// Primitive JSON Schema type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Boolean,
    Object,
    Array,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// A schema fragment: a reference, a composition, or an inline schema.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::{SchemaKind, SchemaNode};
///
/// let amount = SchemaNode::of_kind(SchemaKind::String).with_pattern(r"^\d{1,13}\.\d{1,5}$");
/// let json = serde_json::to_value(&amount).unwrap();
/// assert_eq!(json["type"], "string");
/// assert!(json.get("properties").is_none());
///
/// let reference = SchemaNode::reference("Amount");
/// assert_eq!(serde_json::to_value(&reference).unwrap()["$ref"], "#/definitions/Amount");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl SchemaNode {
    /// An empty node of the given primitive type.
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// `{$ref: "#/definitions/<key>"}`.
    pub fn reference(key: &str) -> Self {
        Self {
            reference: Some(definition_ref(key)),
            ..Default::default()
        }
    }

    /// `{allOf: [...]}`.
    pub fn composition(parts: Vec<SchemaNode>) -> Self {
        Self {
            all_of: parts,
            ..Default::default()
        }
    }

    /// `{type: array, items: <items>}`.
    pub fn array_of(items: SchemaNode) -> Self {
        Self {
            kind: Some(SchemaKind::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// A node holding nothing but a description.
    pub fn described(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Target key of a `$ref` node.
    pub fn referenced_key(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|target| target.strip_prefix(DEFINITIONS_PREFIX))
    }

    /// Looks up a direct property by name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Every `$ref` target reachable from this node, in document order.
    pub fn referenced_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_references(&mut keys);
        keys
    }

    fn collect_references<'a>(&'a self, keys: &mut Vec<&'a str>) {
        if let Some(key) = self.referenced_key() {
            keys.push(key);
        }
        for part in &self.all_of {
            part.collect_references(keys);
        }
        if let Some(items) = &self.items {
            items.collect_references(keys);
        }
        if let Some(properties) = &self.properties {
            for (_, node) in properties.iter() {
                node.collect_references(keys);
            }
        }
    }
}

/// Insertion-ordered map of property name to schema node.
///
/// Inserting an existing name replaces the value in place.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::{PropertyMap, SchemaNode};
///
/// let mut props = PropertyMap::new();
/// props.insert("Currency", SchemaNode::reference("Currency"));
/// props.insert_first("Amount", SchemaNode::reference("Amount"));
/// assert_eq!(props.keys().collect::<Vec<_>>(), ["Amount", "Currency"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, SchemaNode)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a property, or replaces it in place if the name exists.
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) -> Option<SchemaNode> {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, node)),
            None => {
                self.entries.push((name, node));
                None
            }
        }
    }

    /// Inserts a property at the front unless the name already exists.
    pub fn insert_first(&mut self, name: impl Into<String>, node: SchemaNode) {
        let name = name.into();
        if self.position(&name).is_none() {
            self.entries.insert(0, (name, node));
        }
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<SchemaNode> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing == name)
    }
}

impl<S: Into<String>> FromIterator<(S, SchemaNode)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (S, SchemaNode)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, node) in iter {
            map.insert(name, node);
        }
        map
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyMapVisitor;

        impl<'de> Visitor<'de> for PropertyMapVisitor {
            type Value = PropertyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property names to schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = PropertyMap::new();
                while let Some((name, node)) = access.next_entry::<String, SchemaNode>()? {
                    map.insert(name, node);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(PropertyMapVisitor)
    }
}
