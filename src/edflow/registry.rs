//! # Ordered Term Registry
//!
//! CRUD over one ordered collection per [`Kind`], built on a plain
//! [`TermStore`]. The registry owns:
//!
//! - **Ordering**: every live record has a 1-based `position`. After each
//!   insert, update and delete the positions of a kind are `1..=N`; a
//!   `reorder` that fails halfway may leave duplicates until the next delete.
//! - **Validation**: [`crate::validation`] runs before any write that sets a
//!   name or slug. Nothing is written when it fails.
//! - **Caching**: reads go through [`TermCache`]; every path that reaches the
//!   store invalidates the kind's entry, including failing ones.
//!
//! ## Renumbering
//!
//! `delete` re-reads the remaining records in order and writes positions
//! `1..=N` to each record whose position is off. This walks the whole
//! collection rather than the neighbours of the removed record, which also
//! repairs duplicate or missing positions left by earlier failures.
//!
//! ## Concurrency
//!
//! None at this layer. Two processes inserting at the same time may both pick
//! `N + 1`; the duplicate stays visible until a delete renumbers the kind.

use crate::cache::{storage_key, TermCache};
use crate::codec::{self, Attributes};
use crate::config::EdflowConfig;
use crate::defaults::defaults_for;
use crate::error::{EdflowError, Result};
use crate::model::{Kind, Lookup, NewTerm, Record, RecordUpdate, TermId};
use crate::store::{TermFields, TermStore, ValueStore};
use crate::validation::{self, Candidate, ValidationError};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

pub struct OrderedRegistry<S: TermStore, V: ValueStore> {
    store: S,
    values: V,
    cache: RefCell<TermCache>,
    config: EdflowConfig,
}

impl<S: TermStore, V: ValueStore> OrderedRegistry<S, V> {
    pub fn new(store: S, values: V, config: EdflowConfig) -> Self {
        let cache = TermCache::new(config.storage_key_prefix.clone());
        Self {
            store,
            values,
            cache: RefCell::new(cache),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn values(&self) -> &V {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut V {
        &mut self.values
    }

    pub fn config(&self) -> &EdflowConfig {
        &self.config
    }

    /// The ordered, decoded collection of a kind.
    pub fn list(&self, kind: Kind) -> Result<Vec<Record>> {
        let mut cache = self.cache.borrow_mut();
        Ok(cache.get_all(kind, &self.store)?.to_vec())
    }

    /// Finds a live record. A miss is `Ok(None)`, not an error.
    pub fn get_by(&self, kind: Kind, lookup: &Lookup) -> Result<Option<Record>> {
        Ok(self.list(kind)?.into_iter().find(|r| lookup.matches(r)))
    }

    pub fn require(&self, kind: Kind, id: TermId) -> Result<Record> {
        self.get_by(kind, &Lookup::Id(id))?
            .ok_or_else(|| EdflowError::not_found(kind, id))
    }

    pub fn insert(&mut self, kind: Kind, new: NewTerm) -> Result<Record> {
        let existing = self.list(kind)?;

        validation::require_type(kind, new.metadata_type)?;
        validation::validate(
            &self.config.policy(kind),
            Candidate {
                name: &new.name,
                slug: &new.slug,
                updating: None,
            },
            &existing,
        )?;
        let end = existing.len() as u32 + 1;
        let position = new.position.unwrap_or(end);
        if position == 0 || position > end {
            return Err(ValidationError::InvalidPosition(position).into());
        }

        let mut attrs = Attributes {
            description: new.description,
            position: Some(position),
            ..Default::default()
        };
        match kind {
            Kind::Status => attrs.review_required = Some(new.review_required),
            Kind::MetadataField => attrs.metadata_type = new.metadata_type,
        }

        let created = self
            .store
            .create_term(kind, &new.name, &new.slug, &codec::encode(&attrs));
        self.invalidate(kind);
        let id = created?;

        // The storage key embeds the id, so it can only be written now.
        if let Some(metadata_type) = attrs.metadata_type {
            attrs.storage_key = Some(storage_key(
                &self.config.storage_key_prefix,
                metadata_type,
                id,
            ));
            let written = self.store.update_term(
                kind,
                id,
                &TermFields::description(codec::encode(&attrs)),
            );
            self.invalidate(kind);
            written?;
        }

        info!(target: "edflow::registry", %kind, %id, name = %new.name, position, "Inserted term");
        self.require(kind, id)
    }

    /// Applies `update` over the record's current attributes. Fields left as
    /// `None` are kept. A type on a status or a review flag on a metadata
    /// field is ignored.
    pub fn update(&mut self, kind: Kind, id: TermId, update: RecordUpdate) -> Result<Record> {
        let existing = self.list(kind)?;
        let current = existing
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| EdflowError::not_found(kind, id))?;

        if let Some(position) = update.position {
            if position == 0 || position as usize > existing.len() {
                return Err(ValidationError::InvalidPosition(position).into());
            }
        }
        if kind == Kind::MetadataField {
            validation::check_type_change(&current, update.metadata_type)?;
        }
        if update.touches_identity() {
            let name = update.name.as_deref().unwrap_or(&current.name);
            let slug = update.slug.as_deref().unwrap_or(&current.slug);
            validation::validate(
                &self.config.policy(kind),
                Candidate {
                    name,
                    slug,
                    updating: Some(id),
                },
                &existing,
            )?;
        }

        let merged = merge(&current, &update);
        if merged == current {
            debug!(target: "edflow::registry", %kind, %id, "Skipping no-op update");
            return Ok(current);
        }

        let fields = TermFields {
            name: (merged.name != current.name).then(|| merged.name.clone()),
            slug: (merged.slug != current.slug).then(|| merged.slug.clone()),
            description: Some(codec::encode(&merged.attributes())),
        };
        let written = self.store.update_term(kind, id, &fields);
        self.invalidate(kind);
        written?;

        debug!(target: "edflow::registry", %kind, %id, position = merged.position, "Updated term");
        self.require(kind, id)
    }

    /// Removes a record and its stored values, then renumbers the kind.
    /// Returns the record as it was before deletion.
    pub fn delete(&mut self, kind: Kind, id: TermId) -> Result<Record> {
        let record = self.require(kind, id)?;

        if let Some(key) = &record.storage_key {
            let purged = self.values.delete_values_by_key(key)?;
            debug!(target: "edflow::registry", %kind, %id, key = %key, purged, "Purged stored values");
        }

        let deleted = self.store.delete_term(kind, id);
        self.invalidate(kind);
        deleted?;

        let renumbered = self.renumber(kind)?;
        info!(target: "edflow::registry", %kind, %id, name = %record.name, renumbered, "Deleted term");
        Ok(record)
    }

    /// Rewrites positions to `1..=N` in current order. Returns how many
    /// records were written.
    pub fn renumber(&mut self, kind: Kind) -> Result<usize> {
        let records = self.list(kind)?;
        let mut written = 0;
        for (index, record) in records.iter().enumerate() {
            let target = index as u32 + 1;
            if record.position != target {
                self.update(kind, record.id, RecordUpdate::position(target))?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Moves records to the given 0-based ranks, one update at a time in
    /// rank order.
    ///
    /// The payload is checked up front: not empty, no id twice, every rank
    /// below the collection size. Ids are checked as they are applied: the
    /// first failing entry stops the run and earlier entries stay applied.
    /// Re-list after an error to see the resulting order.
    pub fn reorder(
        &mut self,
        kind: Kind,
        ranks: &BTreeMap<usize, TermId>,
    ) -> Result<Vec<Record>> {
        if ranks.is_empty() {
            return Err(ValidationError::Reorder("no positions given".into()).into());
        }
        let len = self.list(kind)?.len();
        let mut seen = HashSet::new();
        let mut moves = Vec::with_capacity(ranks.len());
        for (rank, id) in ranks {
            if !seen.insert(*id) {
                let reason = format!("id {} is listed more than once", id);
                return Err(ValidationError::Reorder(reason).into());
            }
            let Some(position) = rank
                .checked_add(1)
                .filter(|p| *p <= len)
                .and_then(|p| u32::try_from(p).ok())
            else {
                let reason = format!("rank {} is out of range", rank);
                return Err(ValidationError::Reorder(reason).into());
            };
            moves.push((*id, position));
        }

        for (applied, (id, position)) in moves.into_iter().enumerate() {
            if let Err(err) = self.update(kind, id, RecordUpdate::position(position)) {
                warn!(target: "edflow::registry", %kind, %id, applied, error = %err, "Reorder stopped partway");
                return Err(err);
            }
        }

        info!(target: "edflow::registry", %kind, entries = ranks.len(), "Reordered terms");
        self.list(kind)
    }

    /// Inserts the stock terms of a kind whose slugs are not taken yet.
    pub fn install_defaults(&mut self, kind: Kind) -> Result<Vec<Record>> {
        let mut installed = Vec::new();
        for term in defaults_for(kind) {
            if self.get_by(kind, &Lookup::Slug(term.slug.clone()))?.is_some() {
                continue;
            }
            installed.push(self.insert(kind, term)?);
        }
        Ok(installed)
    }

    /// The status that follows `slug` in workflow order. `None` for the last
    /// status or an unknown slug.
    pub fn next_status(&self, slug: &str) -> Result<Option<Record>> {
        let statuses = self.list(Kind::Status)?;
        Ok(statuses
            .iter()
            .position(|r| r.slug == slug)
            .and_then(|index| statuses.get(index + 1).cloned()))
    }

    pub fn invalidate(&self, kind: Kind) {
        self.cache.borrow_mut().invalidate(kind);
    }
}

fn merge(current: &Record, update: &RecordUpdate) -> Record {
    let mut merged = current.clone();
    if let Some(name) = &update.name {
        merged.name = name.clone();
    }
    if let Some(slug) = &update.slug {
        merged.slug = slug.clone();
    }
    if let Some(description) = &update.description {
        merged.description = description.clone();
    }
    if let Some(position) = update.position {
        merged.position = position;
    }
    match current.kind {
        Kind::Status => {
            if let Some(review_required) = update.review_required {
                merged.review_required = Some(review_required);
            }
        }
        Kind::MetadataField => {
            if let Some(metadata_type) = update.metadata_type {
                merged.metadata_type = Some(metadata_type);
            }
        }
    }
    merged
}
