//! Per-process cache of decoded, ordered collections.
//!
//! One entry per [`Kind`]. An entry is built on the first read after it was
//! invalidated: every term is read from the store, decoded, and sorted by
//! position. Terms with equal positions keep the store's order. Terms with no
//! usable position go after all positioned ones, in store order, and are given
//! the next free positions.
//!
//! The cache has no lifecycle of its own. Anything that writes to the store
//! must call [`TermCache::invalidate`] before returning.

use crate::codec;
use crate::error::Result;
use crate::model::{Kind, MetadataType, Record, TermId};
use crate::store::TermStore;
use std::collections::HashMap;
use tracing::debug;

pub struct TermCache {
    entries: HashMap<Kind, Vec<Record>>,
    storage_key_prefix: String,
}

impl TermCache {
    pub fn new(storage_key_prefix: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            storage_key_prefix: storage_key_prefix.into(),
        }
    }

    pub fn get_all<S: TermStore>(&mut self, kind: Kind, store: &S) -> Result<&[Record]> {
        if !self.entries.contains_key(&kind) {
            let records = self.load(kind, store)?;
            self.entries.insert(kind, records);
        }
        Ok(self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn invalidate(&mut self, kind: Kind) {
        self.entries.remove(&kind);
    }

    pub fn is_cached(&self, kind: Kind) -> bool {
        self.entries.contains_key(&kind)
    }

    fn load<S: TermStore>(&self, kind: Kind, store: &S) -> Result<Vec<Record>> {
        let raw = store.query_terms(kind)?;
        debug!(target: "edflow::cache", %kind, terms = raw.len(), "Rebuilding term cache");

        let mut positioned = Vec::new();
        let mut unpositioned = Vec::new();
        for term in raw {
            let attrs = codec::decode(&term.description);
            match attrs.position {
                Some(position) if position > 0 => positioned.push((position, term, attrs)),
                _ => unpositioned.push((term, attrs)),
            }
        }
        // Stable: equal positions keep store order.
        positioned.sort_by_key(|(position, _, _)| *position);

        let mut next = positioned.last().map(|(p, _, _)| *p).unwrap_or(0);
        let mut records = Vec::with_capacity(positioned.len() + unpositioned.len());
        for (position, term, attrs) in positioned {
            records.push(Record::from_parts(kind, term, attrs, position));
        }
        for (term, attrs) in unpositioned {
            next += 1;
            records.push(Record::from_parts(kind, term, attrs, next));
        }

        if kind == Kind::MetadataField {
            for record in records.iter_mut().filter(|r| r.storage_key.is_none()) {
                record.storage_key = record
                    .metadata_type
                    .map(|t| storage_key(&self.storage_key_prefix, t, record.id));
            }
        }

        Ok(records)
    }
}

/// Key under which per-post values of a metadata field are stored.
pub fn storage_key(prefix: &str, metadata_type: MetadataType, id: TermId) -> String {
    format!("{}_{}_{}", prefix, metadata_type, id)
}
