use super::{slug_taken, RawTerm, TermFields, TermStore, ValueMap, ValueStore};
use crate::error::{EdflowError, Result};
use crate::model::{Kind, TermId};
use serde_json::Value;
use std::collections::BTreeMap;

/// In-memory term store for testing.
///
/// Terms are returned in creation order. Ids are shared across kinds, the
/// way a real term table assigns them.
#[derive(Debug)]
pub struct MemTermStore {
    terms: Vec<(Kind, RawTerm)>,
    next_id: u64,
    writes: usize,
    write_budget: Option<usize>,
}

impl Default for MemTermStore {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            next_id: 1,
            writes: 0,
            write_budget: None,
        }
    }
}

impl MemTermStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful create/update/delete calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// The stored description of a term, exactly as persisted.
    pub fn raw_description(&self, id: TermId) -> Option<&str> {
        self.terms
            .iter()
            .find(|(_, t)| t.id == id)
            .map(|(_, t)| t.description.as_str())
    }

    fn check_write(&mut self) -> Result<()> {
        match self.write_budget {
            Some(0) => Err(EdflowError::Store("Simulated write error".to_string())),
            Some(ref mut left) => {
                *left -= 1;
                self.writes += 1;
                Ok(())
            }
            None => {
                self.writes += 1;
                Ok(())
            }
        }
    }

    fn find_mut(&mut self, kind: Kind, id: TermId) -> Result<&mut RawTerm> {
        self.terms
            .iter_mut()
            .find(|(k, t)| *k == kind && t.id == id)
            .map(|(_, t)| t)
            .ok_or_else(|| EdflowError::not_found(kind, id))
    }
}

#[cfg(any(test, feature = "test_utils"))]
impl MemTermStore {
    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&mut self, simulate: bool) {
        self.write_budget = if simulate { Some(0) } else { None };
    }

    /// Let `n` more writes succeed, then fail every write after that.
    pub fn fail_writes_after(&mut self, n: usize) {
        self.write_budget = Some(n);
    }
}

impl TermStore for MemTermStore {
    fn create_term(
        &mut self,
        kind: Kind,
        name: &str,
        slug: &str,
        description: &str,
    ) -> Result<TermId> {
        if slug_taken(&self.terms, kind, slug, None) {
            return Err(EdflowError::Store(format!("A term with slug '{}' already exists", slug)));
        }
        self.check_write()?;

        let id = TermId(self.next_id);
        self.next_id += 1;
        self.terms.push((
            kind,
            RawTerm {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
            },
        ));
        Ok(id)
    }

    fn update_term(&mut self, kind: Kind, id: TermId, fields: &TermFields) -> Result<()> {
        self.find_mut(kind, id)?;
        if let Some(slug) = &fields.slug {
            if slug_taken(&self.terms, kind, slug, Some(id)) {
                return Err(EdflowError::Store(format!(
                    "A term with slug '{}' already exists",
                    slug
                )));
            }
        }
        self.check_write()?;
        fields.apply_to(self.find_mut(kind, id)?);
        Ok(())
    }

    fn delete_term(&mut self, kind: Kind, id: TermId) -> Result<()> {
        self.find_mut(kind, id)?;
        self.check_write()?;
        self.terms.retain(|(k, t)| !(*k == kind && t.id == id));
        Ok(())
    }

    fn query_terms(&self, kind: Kind) -> Result<Vec<RawTerm>> {
        Ok(self
            .terms
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, t)| t.clone())
            .collect())
    }
}

/// In-memory value store for testing.
#[derive(Debug, Default)]
pub struct MemValueStore {
    values: ValueMap,
}

impl MemValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_for_key(&self, key: &str) -> usize {
        self.values.get(key).map(|posts| posts.len()).unwrap_or(0)
    }
}

impl ValueStore for MemValueStore {
    fn set_value(&mut self, key: &str, post_id: u64, value: Value) -> Result<()> {
        self.values
            .entry(key.to_string())
            .or_default()
            .insert(post_id, value);
        Ok(())
    }

    fn values_for_post(&self, post_id: u64) -> Result<BTreeMap<String, Value>> {
        Ok(self
            .values
            .iter()
            .filter_map(|(key, posts)| posts.get(&post_id).map(|v| (key.clone(), v.clone())))
            .collect())
    }

    fn delete_values_by_key(&mut self, key: &str) -> Result<usize> {
        Ok(self.values.remove(key).map(|posts| posts.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_increasing_ids_across_kinds() {
        let mut store = MemTermStore::new();
        let a = store.create_term(Kind::Status, "Pitch", "pitch", "").unwrap();
        let b = store
            .create_term(Kind::MetadataField, "Assignment", "assignment", "")
            .unwrap();
        assert_eq!(a, TermId(1));
        assert_eq!(b, TermId(2));
        assert_eq!(store.query_terms(Kind::Status).unwrap().len(), 1);
        assert_eq!(store.query_terms(Kind::MetadataField).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_slug_rejected_per_kind() {
        let mut store = MemTermStore::new();
        store.create_term(Kind::Status, "Pitch", "pitch", "").unwrap();
        assert!(store.create_term(Kind::Status, "Pitch 2", "pitch", "").is_err());
        assert!(store
            .create_term(Kind::MetadataField, "Pitch", "pitch", "")
            .is_ok());
    }

    #[test]
    fn test_update_overwrites_only_given_fields() {
        let mut store = MemTermStore::new();
        let id = store.create_term(Kind::Status, "Pitch", "pitch", "old").unwrap();
        store
            .update_term(Kind::Status, id, &TermFields::description("new".into()))
            .unwrap();
        let terms = store.query_terms(Kind::Status).unwrap();
        assert_eq!(terms[0].name, "Pitch");
        assert_eq!(terms[0].description, "new");
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let mut store = MemTermStore::new();
        let err = store
            .update_term(Kind::Status, TermId(9), &TermFields::default())
            .unwrap_err();
        assert!(matches!(err, EdflowError::NotFound { .. }));
    }

    #[test]
    fn test_delete_wrong_kind_is_not_found() {
        let mut store = MemTermStore::new();
        let id = store.create_term(Kind::Status, "Pitch", "pitch", "").unwrap();
        assert!(store.delete_term(Kind::MetadataField, id).is_err());
        assert!(store.delete_term(Kind::Status, id).is_ok());
        assert!(store.query_terms(Kind::Status).unwrap().is_empty());
    }

    #[test]
    fn test_simulated_write_error() {
        let mut store = MemTermStore::new();
        store.set_simulate_write_error(true);
        let err = store.create_term(Kind::Status, "Pitch", "pitch", "").unwrap_err();
        assert!(err.is_storage());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_write_budget() {
        let mut store = MemTermStore::new();
        store.fail_writes_after(1);
        assert!(store.create_term(Kind::Status, "A", "a", "").is_ok());
        assert!(store.create_term(Kind::Status, "B", "b", "").is_err());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_value_store_delete_by_key_is_idempotent() {
        let mut values = MemValueStore::new();
        values.set_value("k", 1, Value::Bool(true)).unwrap();
        values.set_value("k", 2, Value::Bool(false)).unwrap();
        values.set_value("other", 1, Value::from("x")).unwrap();

        assert_eq!(values.delete_values_by_key("k").unwrap(), 2);
        assert_eq!(values.delete_values_by_key("k").unwrap(), 0);

        let post = values.values_for_post(1).unwrap();
        assert_eq!(post.len(), 1);
        assert_eq!(post["other"], Value::from("x"));
    }
}
