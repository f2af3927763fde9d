//! Type classification of table records.
//!
//! Classification is table-driven: [`KEY_RULES`] and [`KIND_RULES`] are
//! evaluated top to bottom and the first matching rule wins. Constraint
//! derivation never fails; a token that is absent or malformed simply leaves
//! the constraint out.

use std::sync::LazyLock;

use regex::Regex;
use tabular_schema_core::{
    CURRENCY_AMOUNT_CLASS, CURRENCY_CODE_CLASS, ISO_DATE_TIME_CLASS, Record, SchemaKind,
    SchemaNode,
};

static MAX_LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Max(\d+)\D").expect("static regex must compile"));
static MIN_LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Min(\d+)\D").expect("static regex must compile"));
static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("static regex must compile"));

/// Primitive type aliases of the underlying XML schema.
pub const XS_BOOLEAN: &str = "xs:boolean";
pub const XS_STRING: &str = "xs:string";
pub const XS_ID: &str = "xs:ID";

/// Format assigned to ISO date-time fields.
pub const DATE_TIME_FORMAT: &str = "date-time";

/// Marker in pattern text for digit-count facets, which length bounds
/// already cover.
const TOTAL_DIGITS_MARKER: &str = "TotalDigits";

/// Declared-class matcher of a rule.
#[derive(Debug, Clone, Copy)]
pub enum ClassMatch {
    /// Class ends with the given suffix.
    Suffix(&'static str),
    /// Class is one of the given names.
    AnyOf(&'static [&'static str]),
}

impl ClassMatch {
    pub fn matches(&self, declared_class: &str) -> bool {
        match self {
            Self::Suffix(suffix) => declared_class.ends_with(suffix),
            Self::AnyOf(names) => names.iter().any(|name| *name == declared_class),
        }
    }
}

/// How a canonical key is formed from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    /// The record name.
    Name,
    /// `{name}_{declaredClass}`.
    NameAndClass,
    /// `{parentSegment}_{declaredClass}`.
    ParentAndClass,
    /// The declared class verbatim.
    Class,
}

/// One canonical-key rule.
#[derive(Debug, Clone, Copy)]
pub struct KeyRule {
    pub class: ClassMatch,
    pub form: KeyForm,
}

/// Canonical-key rules in priority order. Classes matching none use
/// [`KeyForm::Class`].
pub const KEY_RULES: &[KeyRule] = &[
    KeyRule {
        class: ClassMatch::Suffix("Text"),
        form: KeyForm::Name,
    },
    // Date fields share one base type; the name disambiguates them.
    KeyRule {
        class: ClassMatch::AnyOf(&[ISO_DATE_TIME_CLASS]),
        form: KeyForm::NameAndClass,
    },
    KeyRule {
        class: ClassMatch::AnyOf(&[XS_BOOLEAN, XS_STRING, XS_ID]),
        form: KeyForm::Name,
    },
    // Currency types appear under many composites; the composite name
    // disambiguates them.
    KeyRule {
        class: ClassMatch::AnyOf(&[CURRENCY_AMOUNT_CLASS, CURRENCY_CODE_CLASS]),
        form: KeyForm::ParentAndClass,
    },
];

/// Primitive-kind rules in priority order. Classes matching none are
/// [`SchemaKind::Object`].
pub const KIND_RULES: &[(ClassMatch, SchemaKind)] = &[
    (
        ClassMatch::AnyOf(&[ISO_DATE_TIME_CLASS, XS_STRING, XS_ID]),
        SchemaKind::String,
    ),
    (ClassMatch::Suffix("Text"), SchemaKind::String),
    (ClassMatch::Suffix("Code"), SchemaKind::String),
    (ClassMatch::AnyOf(&[XS_BOOLEAN]), SchemaKind::Boolean),
];

/// Scalar constraints derived from a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    pub enumeration: Option<Vec<String>>,
    /// Minimum occurrence of repeated records (`1` for `1..n`, `0` for `0..n`).
    pub min_occurrence: Option<u32>,
    pub format: Option<String>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub pattern: Option<String>,
}

impl Constraints {
    /// Copies the constraints onto `node`.
    ///
    /// `minProperties` is only set on object nodes and only for a positive
    /// minimum occurrence.
    pub fn apply(&self, node: &mut SchemaNode) {
        if let Some(values) = self.enumeration.as_ref().filter(|v| !v.is_empty()) {
            node.enumeration = Some(values.clone());
        }
        if node.kind == Some(SchemaKind::Object) {
            node.min_properties = self.min_occurrence.filter(|min| *min > 0);
        }
        node.min_length = self.min_length;
        node.max_length = self.max_length;
        node.format = self.format.clone();
        node.pattern = self.pattern.clone();
    }
}

/// Result of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Canonical key the record's schema is filed under.
    pub key: String,
    /// Primitive kind before cardinality is applied.
    pub kind: SchemaKind,
    pub constraints: Constraints,
}

/// Classifies a record into canonical key, primitive kind, and constraints.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::{Cardinality, Record, SchemaKind};
/// use tabular_schema_convert::classify::classify;
///
/// let record = Record::new(
///     "Amount",
///     "ActiveOrHistoricCurrencyAndAmount",
///     "Data/Initiation/InstructedAmount/Amount",
///     Cardinality::OneToOne,
/// );
/// let class = classify(&record);
/// assert_eq!(class.key, "InstructedAmount_ActiveOrHistoricCurrencyAndAmount");
/// assert_eq!(class.kind, SchemaKind::Object);
///
/// let text = Record::new("Nickname", "Max70Text", "Data/Account/Nickname", Cardinality::ZeroToOne);
/// let class = classify(&text);
/// assert_eq!(class.key, "Nickname");
/// assert_eq!(class.constraints.max_length, Some(70));
/// assert_eq!(class.constraints.min_length, Some(1));
/// ```
pub fn classify(record: &Record) -> Classification {
    Classification {
        key: canonical_key(record),
        kind: kind_for(&record.declared_class),
        constraints: constraints_for(record),
    }
}

/// First matching key form for a declared class.
pub fn key_form(declared_class: &str) -> KeyForm {
    KEY_RULES
        .iter()
        .find(|rule| rule.class.matches(declared_class))
        .map(|rule| rule.form)
        .unwrap_or(KeyForm::Class)
}

/// Canonical key of a record.
pub fn canonical_key(record: &Record) -> String {
    let class = &record.declared_class;
    match key_form(class) {
        KeyForm::Name => record.name.clone(),
        KeyForm::NameAndClass => format!("{}_{class}", record.name),
        KeyForm::ParentAndClass => {
            let parent = record.path.parent_segment().unwrap_or(&record.name);
            format!("{parent}_{class}")
        }
        KeyForm::Class => class.clone(),
    }
}

/// Primitive kind of a declared class.
pub fn kind_for(declared_class: &str) -> SchemaKind {
    KIND_RULES
        .iter()
        .find(|(class, _)| class.matches(declared_class))
        .map(|(_, kind)| *kind)
        .unwrap_or(SchemaKind::Object)
}

/// Derives the scalar constraints of a record.
pub fn constraints_for(record: &Record) -> Constraints {
    let class = record.declared_class.as_str();
    let max_length = length_token(&MAX_LENGTH_RE, class).filter(|&max| max > 0);
    Constraints {
        enumeration: record.codes.clone().filter(|codes| !codes.is_empty()),
        min_occurrence: record.cardinality.min_occurrence(),
        format: (class == ISO_DATE_TIME_CLASS).then(|| DATE_TIME_FORMAT.to_string()),
        min_length: max_length.map(|_| length_token(&MIN_LENGTH_RE, class).unwrap_or(1)),
        max_length,
        pattern: record
            .pattern
            .as_deref()
            .filter(|p| !p.is_empty() && !p.contains(TOTAL_DIGITS_MARKER))
            .map(String::from),
    }
}

fn length_token(re: &Regex, declared_class: &str) -> Option<u32> {
    re.captures(declared_class)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Field description of a record.
///
/// Runs of blank lines collapse to a single newline; ISO date-time fields get
/// the shared ISO description appended on its own line.
pub fn describe(record: &Record, iso_description: &str) -> Option<String> {
    let raw = record.description.as_deref().filter(|d| !d.is_empty())?;
    let mut description = BLANK_LINES_RE.replace_all(raw, "\n").into_owned();
    if record.declared_class == ISO_DATE_TIME_CLASS && !iso_description.is_empty() {
        description.push('\n');
        description.push_str(iso_description);
    }
    Some(description)
}
