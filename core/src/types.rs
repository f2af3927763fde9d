//! Table record types.
//!
//! A data-standard table is a flat list of [`Record`]s. Each record describes
//! one field of the standard and is addressed by a slash-delimited
//! [`RecordPath`]; the hierarchy is implied by path containment only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Slash-delimited, root-relative path of a record (e.g.
/// `OBReadAccount1/Data/Account`).
///
/// # Examples
///
/// ```
/// use tabular_schema_core::RecordPath;
///
/// let parent = RecordPath::parse("OBReadAccount1/Data");
/// let child = RecordPath::parse("OBReadAccount1/Data/Account");
/// assert!(child.is_child_of(&parent));
/// assert_eq!(child.parent_segment(), Some("Data"));
/// assert_eq!(child.to_string(), "OBReadAccount1/Data/Account");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RecordPath {
    segments: Vec<String>,
}

impl RecordPath {
    /// Parses a slash-delimited path. Empty segments are dropped.
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .trim()
                .split('/')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Returns the path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Second-to-last segment: the name of the enclosing composite.
    pub fn parent_segment(&self) -> Option<&str> {
        let len = self.segments.len();
        if len < 2 {
            return None;
        }
        Some(self.segments[len - 2].as_str())
    }

    /// Path of the enclosing record, or `None` for a root path.
    pub fn parent(&self) -> Option<RecordPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// `true` when `self` equals `parent` plus exactly one segment.
    pub fn is_child_of(&self, parent: &RecordPath) -> bool {
        self.segments.len() == parent.segments.len() + 1 && self.starts_with(parent)
    }

    /// Segment-wise prefix test (`a/bc` does not start with `a/b`).
    pub fn starts_with(&self, prefix: &RecordPath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// `true` when `self` lies strictly below `ancestor`.
    pub fn is_under(&self, ancestor: &RecordPath) -> bool {
        self.segments.len() > ancestor.segments.len() && self.starts_with(ancestor)
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for RecordPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for RecordPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<RecordPath> for String {
    fn from(path: RecordPath) -> Self {
        path.to_string()
    }
}

/// Minimum/maximum occurrence marker of a record.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::Cardinality;
///
/// let c: Cardinality = "1..n".parse().unwrap();
/// assert_eq!(c, Cardinality::OneToMany);
/// assert!(c.is_repeated());
/// assert!(!c.is_optional());
/// assert_eq!(c.min_occurrence(), Some(1));
///
/// assert!("2..5".parse::<Cardinality>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cardinality {
    /// `0..1`
    ZeroToOne,
    /// `1..1`
    OneToOne,
    /// `0..n`
    ZeroToMany,
    /// `1..n`
    OneToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroToOne => "0..1",
            Self::OneToOne => "1..1",
            Self::ZeroToMany => "0..n",
            Self::OneToMany => "1..n",
        }
    }

    /// Minimum occurrence is zero.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::ZeroToOne | Self::ZeroToMany)
    }

    /// Maximum occurrence is unbounded (`..n`).
    pub fn is_repeated(&self) -> bool {
        matches!(self, Self::ZeroToMany | Self::OneToMany)
    }

    /// Minimum occurrence of repeated cardinalities; `None` for single ones.
    pub fn min_occurrence(&self) -> Option<u32> {
        match self {
            Self::OneToMany => Some(1),
            Self::ZeroToMany => Some(0),
            Self::ZeroToOne | Self::OneToOne => None,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cardinality {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "0..1" => Ok(Self::ZeroToOne),
            "1..1" => Ok(Self::OneToOne),
            "0..n" => Ok(Self::ZeroToMany),
            "1..n" => Ok(Self::OneToMany),
            other => Err(ValidationError::UnknownCardinality(other.to_string())),
        }
    }
}

impl TryFrom<String> for Cardinality {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Cardinality> for String {
    fn from(cardinality: Cardinality) -> Self {
        cardinality.as_str().to_string()
    }
}

/// One row of a data-standard table.
///
/// Use [`Record::new`] and chain the `with_*` builders for the optional
/// columns.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::{Cardinality, Record};
///
/// let record = Record::new(
///     "Nickname",
///     "Max70Text",
///     "OBReadAccount1/Data/Account/Nickname",
///     Cardinality::ZeroToOne,
/// )
/// .with_description("The nickname of the account.");
///
/// assert_eq!(record.path.depth(), 4);
/// assert!(record.cardinality.is_optional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Field name (last path segment in well-formed tables).
    pub name: String,
    /// Declared class or data type of the field.
    pub declared_class: String,
    /// Hierarchical path of the field.
    pub path: RecordPath,
    /// Occurrence marker.
    pub cardinality: Cardinality,
    /// Enumerated literal values, in table order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codes: Option<Vec<String>>,
    /// Validation pattern text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Long-form definition text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Record {
    /// Creates a record with the mandatory columns.
    pub fn new(
        name: &str,
        declared_class: &str,
        path: impl Into<RecordPath>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.to_string(),
            declared_class: declared_class.to_string(),
            path: path.into(),
            cardinality,
            codes: None,
            pattern: None,
            description: None,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds enumerated codes.
    pub fn with_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codes = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a validation pattern.
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Returns `true` when `self` is a direct child of `parent`.
    pub fn is_child_of(&self, parent: &Record) -> bool {
        self.path.is_child_of(&parent.path)
    }
}
