use crate::codec::Attributes;
use crate::store::RawTerm;
use crate::validation::{sanitize_text, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The entity category sharing one ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Status,
    MetadataField,
}

impl Kind {
    pub fn all() -> &'static [Kind] {
        &[Kind::Status, Kind::MetadataField]
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Status => write!(f, "status"),
            Kind::MetadataField => write!(f, "metadata field"),
        }
    }
}

/// Identifier assigned by the term store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub u64);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TermId {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .map(TermId)
            .ok_or_else(|| ValidationError::InvalidId(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataType {
    Checkbox,
    Text,
}

/// Shape of the per-post value a metadata field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    String,
}

impl MetadataType {
    pub fn all() -> &'static [MetadataType] {
        &[MetadataType::Checkbox, MetadataType::Text]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataType::Checkbox => "checkbox",
            MetadataType::Text => "text",
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            MetadataType::Checkbox => ValueKind::Boolean,
            MetadataType::Text => ValueKind::String,
        }
    }

    /// Coerces a submitted value into the shape this field stores.
    pub fn sanitize_value(&self, raw: &str) -> Value {
        match self.value_kind() {
            ValueKind::Boolean => {
                let raw = raw.trim();
                let falsy = raw.is_empty()
                    || raw == "0"
                    || raw.eq_ignore_ascii_case("false")
                    || raw.eq_ignore_ascii_case("off")
                    || raw.eq_ignore_ascii_case("no");
                Value::Bool(!falsy)
            }
            ValueKind::String => Value::String(sanitize_text(raw)),
        }
    }
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MetadataType::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnsupportedType(s.to_string()))
    }
}

/// A live status or metadata field, fully decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: TermId,
    pub kind: Kind,
    pub name: String,
    pub slug: String,
    pub position: u32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_required: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub metadata_type: Option<MetadataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    /// Attributes this version does not interpret, kept for re-encoding.
    #[serde(skip)]
    pub extra: serde_json::Map<String, Value>,
}

impl Record {
    /// Builds the view of a raw term. `position` is the resolved slot in the
    /// ordered collection; it may differ from the stored attribute for legacy
    /// terms that never had one.
    pub(crate) fn from_parts(kind: Kind, raw: RawTerm, attrs: Attributes, position: u32) -> Self {
        let (review_required, metadata_type) = match kind {
            Kind::Status => (Some(attrs.review_required.unwrap_or(false)), None),
            Kind::MetadataField => (None, attrs.metadata_type),
        };
        Self {
            id: raw.id,
            kind,
            name: raw.name,
            slug: raw.slug,
            position,
            description: attrs.description,
            review_required,
            metadata_type,
            storage_key: attrs.storage_key,
            extra: attrs.extra,
        }
    }

    /// The attribute set that gets encoded back into the term description.
    pub fn attributes(&self) -> Attributes {
        Attributes {
            description: self.description.clone(),
            position: Some(self.position),
            metadata_type: self.metadata_type,
            review_required: self.review_required,
            storage_key: self.storage_key.clone(),
            extra: self.extra.clone(),
        }
    }

    pub fn is_review_required(&self) -> bool {
        self.review_required.unwrap_or(false)
    }
}

/// Field used by `get_by` lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Id(TermId),
    Slug(String),
    Name(String),
}

impl Lookup {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Lookup::Id(id) => record.id == *id,
            Lookup::Slug(slug) => record.slug == *slug,
            Lookup::Name(name) => record.name == *name,
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Id(id) => write!(f, "id {}", id),
            Lookup::Slug(slug) => write!(f, "slug '{}'", slug),
            Lookup::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

/// Input for a registry insert. The slug is derived by the caller.
#[derive(Debug, Clone, Default)]
pub struct NewTerm {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub position: Option<u32>,
    pub review_required: bool,
    pub metadata_type: Option<MetadataType>,
}

impl NewTerm {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_review_required(mut self, review_required: bool) -> Self {
        self.review_required = review_required;
        self
    }

    pub fn with_type(mut self, metadata_type: MetadataType) -> Self {
        self.metadata_type = Some(metadata_type);
        self
    }
}

/// Partial update: `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub position: Option<u32>,
    pub review_required: Option<bool>,
    pub metadata_type: Option<MetadataType>,
}

impl RecordUpdate {
    pub fn position(position: u32) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn touches_identity(&self) -> bool {
        self.name.is_some() || self.slug.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
