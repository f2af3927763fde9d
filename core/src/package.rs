use std::collections::HashMap;
use std::fmt;

use serde::de::{Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SchemaNode;

/// A named schema document: one canonical key and its schema.
///
/// Serializes as a single-entry mapping `{key: schema}`, which is the shape
/// of every written definition file.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::{Document, SchemaKind, SchemaNode};
///
/// let doc = Document::new("Amount", SchemaNode::of_kind(SchemaKind::String));
/// let json = serde_json::to_string(&doc).unwrap();
/// assert_eq!(json, r#"{"Amount":{"type":"string"}}"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Canonical key the schema is filed under.
    pub key: String,
    /// The schema itself.
    pub schema: SchemaNode,
}

impl Document {
    pub fn new(key: impl Into<String>, schema: SchemaNode) -> Self {
        Self {
            key: key.into(),
            schema,
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.schema)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a single-entry map of key to schema")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let Some((key, schema)) = access.next_entry::<String, SchemaNode>()? else {
                    return Err(A::Error::custom("document has no definition"));
                };
                if access.next_key::<String>()?.is_some() {
                    return Err(A::Error::custom("document has more than one definition"));
                }
                Ok(Document { key, schema })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

/// Insertion-ordered set of documents keyed by canonical key.
///
/// Inserting a key that is already present replaces the earlier document but
/// keeps its position, so output order is that of first appearance and a
/// later table's definition wins.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::*;
///
/// let mut set = DefinitionSet::new();
/// set.insert(Document::new("A", SchemaNode::of_kind(SchemaKind::String)));
/// set.insert(Document::new("B", SchemaNode::of_kind(SchemaKind::Object)));
/// set.insert(Document::new("A", SchemaNode::of_kind(SchemaKind::Boolean)));
///
/// assert_eq!(set.keys().collect::<Vec<_>>(), ["A", "B"]);
/// assert_eq!(set.get("A").unwrap().kind, Some(SchemaKind::Boolean));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl DefinitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document, returning the one it replaced.
    pub fn insert(&mut self, document: Document) -> Option<Document> {
        match self.index.get(&document.key) {
            Some(&idx) => Some(std::mem::replace(&mut self.documents[idx], document)),
            None => {
                self.index.insert(document.key.clone(), self.documents.len());
                self.documents.push(document);
                None
            }
        }
    }

    /// Inserts every document of `other`, later entries winning.
    pub fn extend(&mut self, other: DefinitionSet) {
        for document in other.documents {
            self.insert(document);
        }
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.index.get(key).map(|&idx| &self.documents[idx].schema)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Removes a document by key.
    pub fn remove(&mut self, key: &str) -> Option<Document> {
        let idx = self.index.remove(key)?;
        let removed = self.documents.remove(idx);
        for position in self.index.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Keeps only documents for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Document) -> bool) {
        self.documents.retain(|doc| keep(doc));
        self.index = self
            .documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| (doc.key.clone(), idx))
            .collect();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|doc| doc.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

/// Serializes as one mapping of key to schema, in set order.
impl Serialize for DefinitionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.documents.len()))?;
        for document in &self.documents {
            map.serialize_entry(&document.key, &document.schema)?;
        }
        map.end()
    }
}

impl IntoIterator for DefinitionSet {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl FromIterator<Document> for DefinitionSet {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut set = Self::new();
        for document in iter {
            set.insert(document);
        }
        set
    }
}
