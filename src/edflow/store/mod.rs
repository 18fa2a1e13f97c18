//! # Storage Layer
//!
//! Two collaborators sit underneath the registry:
//!
//! 1. [`TermStore`]: a plain hierarchical term store. Each term has an id, a
//!    name, a slug and one free-text description, nothing else. Every call is
//!    atomic on its own; there are no multi-term transactions.
//! 2. [`ValueStore`]: per-post values for metadata fields, keyed by a field's
//!    storage key.
//!
//! The registry never assumes more than this. Positions, types and flags are
//! packed into the description by [`crate::codec`].
//!
//! ## Implementations
//!
//! - [`memory::MemTermStore`] / [`memory::MemValueStore`]: for tests, with
//!   write-error simulation and write counting.
//! - [`fs::FileTermStore`] / [`fs::FileValueStore`]: JSON files in a data
//!   directory, each write replaces the file atomically.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── config.json    # EdflowConfig
//! ├── terms.json     # All terms of every kind
//! └── values.json    # storage key -> post id -> value
//! ```

use crate::error::Result;
use crate::model::{Kind, TermId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod fs;
pub mod memory;

/// A term as the store sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTerm {
    pub id: TermId,
    pub name: String,
    pub slug: String,
    pub description: String,
}

/// Fields to overwrite in `update_term`. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFields {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl TermFields {
    pub fn description(description: String) -> Self {
        Self {
            description: Some(description),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(&self, term: &mut RawTerm) {
        if let Some(name) = &self.name {
            term.name = name.clone();
        }
        if let Some(slug) = &self.slug {
            term.slug = slug.clone();
        }
        if let Some(description) = &self.description {
            term.description = description.clone();
        }
    }
}

/// Abstract interface for the term storage engine.
///
/// Implementations reject a slug already used by another term of the same
/// kind, and report unknown ids as `NotFound`.
pub trait TermStore {
    /// Create a term and return its newly assigned id.
    fn create_term(&mut self, kind: Kind, name: &str, slug: &str, description: &str)
        -> Result<TermId>;

    /// Overwrite the given fields of an existing term.
    fn update_term(&mut self, kind: Kind, id: TermId, fields: &TermFields) -> Result<()>;

    /// Remove a term permanently.
    fn delete_term(&mut self, kind: Kind, id: TermId) -> Result<()>;

    /// All terms of a kind, in the store's own order.
    fn query_terms(&self, kind: Kind) -> Result<Vec<RawTerm>>;
}

/// Abstract interface for per-post metadata values.
pub trait ValueStore {
    /// Store `value` for `post_id` under `key`, replacing any previous value.
    fn set_value(&mut self, key: &str, post_id: u64, value: Value) -> Result<()>;

    /// Every value stored for a post, by storage key.
    fn values_for_post(&self, post_id: u64) -> Result<BTreeMap<String, Value>>;

    /// Remove every value stored under `key`. Returns how many were removed;
    /// calling it for a key with no values is fine.
    fn delete_values_by_key(&mut self, key: &str) -> Result<usize>;
}

pub(crate) fn slug_taken(
    terms: &[(Kind, RawTerm)],
    kind: Kind,
    slug: &str,
    except: Option<TermId>,
) -> bool {
    terms
        .iter()
        .any(|(k, t)| *k == kind && t.slug == slug && Some(t.id) != except)
}

pub(crate) type ValueMap = BTreeMap<String, BTreeMap<u64, Value>>;
