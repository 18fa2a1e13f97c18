//! Input policy for statuses and metadata fields.
//!
//! Checks run in a fixed order and stop at the first failure:
//! - name is not empty
//! - name is not purely numeric
//! - name is not on the kind's restricted list (case-insensitive)
//! - name fits the kind's length ceiling, if it has one
//! - slug is not taken by another live record
//! - name is not taken by another live record (case-insensitive)
//!
//! Nothing here touches storage; callers pass in the current collection.

use crate::model::{Kind, MetadataType, Record, TermId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a name.")]
    Empty,

    #[error("Please enter a valid, non-numeric name.")]
    Numeric,

    #[error("The name '{0}' is restricted. Please choose another name.")]
    Restricted(String),

    #[error("The name is too long. Please choose a name that is {max} characters or less.")]
    TooLong { max: usize, len: usize },

    #[error("The slug '{0}' conflicts with an existing term. Please choose another name.")]
    SlugConflict(String),

    #[error("The name '{0}' is already in use. Please choose another name.")]
    NameConflict(String),

    #[error("Please choose a metadata type.")]
    MissingType,

    #[error("Unsupported metadata type '{0}'. Supported types are: checkbox, text.")]
    UnsupportedType(String),

    #[error("The type of '{0}' cannot change once values are stored against it.")]
    TypeLocked(String),

    #[error("Invalid id '{0}'.")]
    InvalidId(String),

    #[error("Positions start at 1, got {0}.")]
    InvalidPosition(u32),

    #[error("Invalid reorder request: {0}")]
    Reorder(String),
}

/// Per-kind naming policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindPolicy {
    pub restricted_names: Vec<String>,
    pub max_name_len: Option<usize>,
}

impl KindPolicy {
    pub fn is_restricted(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.restricted_names
            .iter()
            .any(|restricted| restricted.to_lowercase() == lowered)
    }
}

/// A create or update candidate. `updating` is the id of the record being
/// changed, which is allowed to keep its own name and slug.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub updating: Option<TermId>,
}

pub fn validate(
    policy: &KindPolicy,
    candidate: Candidate<'_>,
    existing: &[Record],
) -> Result<(), ValidationError> {
    let name = candidate.name;

    if name.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    if is_numeric(name) {
        return Err(ValidationError::Numeric);
    }

    if policy.is_restricted(name) || policy.is_restricted(candidate.slug) {
        return Err(ValidationError::Restricted(name.to_string()));
    }

    if let Some(max) = policy.max_name_len {
        let len = name.chars().count();
        if len > max {
            return Err(ValidationError::TooLong { max, len });
        }
    }

    let others = || {
        existing
            .iter()
            .filter(move |r| Some(r.id) != candidate.updating)
    };

    if others().any(|r| r.slug == candidate.slug) {
        return Err(ValidationError::SlugConflict(candidate.slug.to_string()));
    }

    let lowered = name.to_lowercase();
    if others().any(|r| r.name.to_lowercase() == lowered) {
        return Err(ValidationError::NameConflict(name.to_string()));
    }

    Ok(())
}

/// Rejects a type change on a field that already has a storage key.
pub fn check_type_change(
    record: &Record,
    requested: Option<MetadataType>,
) -> Result<(), ValidationError> {
    match (requested, record.metadata_type, &record.storage_key) {
        (Some(new), Some(old), Some(_)) if new != old => {
            Err(ValidationError::TypeLocked(record.name.clone()))
        }
        _ => Ok(()),
    }
}

pub fn require_type(
    kind: Kind,
    metadata_type: Option<MetadataType>,
) -> Result<(), ValidationError> {
    if kind == Kind::MetadataField && metadata_type.is_none() {
        return Err(ValidationError::MissingType);
    }
    Ok(())
}

/// Numeric strings in the loose sense: optional sign, digits, an optional
/// fraction and exponent, surrounding whitespace allowed.
pub fn is_numeric(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || !s.bytes().any(|b| b.is_ascii_digit()) {
        return false;
    }
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-');
    s.chars().all(allowed) && s.parse::<f64>().is_ok()
}

/// Derives a URL-safe slug from a display name.
///
/// # Examples
/// ```
/// use edflow::validation::slugify;
///
/// assert_eq!(slugify("Pending Review"), "pending-review");
/// assert_eq!(slugify("  In   Progress!! "), "in-progress");
/// assert_eq!(slugify("Word_Count"), "word_count");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in sanitize_text(name).chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Trims and strips anything that looks like an HTML tag.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    out.trim().to_string()
}
