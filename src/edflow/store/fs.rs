use super::{slug_taken, RawTerm, TermFields, TermStore, ValueMap, ValueStore};
use crate::error::{EdflowError, Result};
use crate::model::{Kind, TermId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const TERMS_FILENAME: &str = "terms.json";
const VALUES_FILENAME: &str = "values.json";

#[derive(Debug, Serialize, Deserialize)]
struct TermFile {
    next_id: u64,
    terms: Vec<StoredTerm>,
}

impl Default for TermFile {
    fn default() -> Self {
        Self {
            next_id: 1,
            terms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTerm {
    kind: Kind,
    #[serde(flatten)]
    term: RawTerm,
}

/// Term store backed by a single `terms.json` in the data directory.
///
/// Every call reads the file, applies one change and writes it back through a
/// temp file + rename, so a crash never leaves a half-written file.
pub struct FileTermStore {
    root: PathBuf,
}

impl FileTermStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self) -> Result<TermFile> {
        load_json(&self.root.join(TERMS_FILENAME))
    }

    fn save(&self, file: &TermFile) -> Result<()> {
        save_json(&self.root, TERMS_FILENAME, file)
    }

    fn pairs(file: &TermFile) -> Vec<(Kind, RawTerm)> {
        file.terms
            .iter()
            .map(|s| (s.kind, s.term.clone()))
            .collect()
    }
}

impl TermStore for FileTermStore {
    fn create_term(
        &mut self,
        kind: Kind,
        name: &str,
        slug: &str,
        description: &str,
    ) -> Result<TermId> {
        let mut file = self.load()?;
        if slug_taken(&Self::pairs(&file), kind, slug, None) {
            return Err(EdflowError::Store(format!("A term with slug '{}' already exists", slug)));
        }

        let id = TermId(file.next_id);
        file.next_id += 1;
        file.terms.push(StoredTerm {
            kind,
            term: RawTerm {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
            },
        });
        self.save(&file)?;
        Ok(id)
    }

    fn update_term(&mut self, kind: Kind, id: TermId, fields: &TermFields) -> Result<()> {
        let mut file = self.load()?;
        if let Some(slug) = &fields.slug {
            if slug_taken(&Self::pairs(&file), kind, slug, Some(id)) {
                return Err(EdflowError::Store(format!(
                    "A term with slug '{}' already exists",
                    slug
                )));
            }
        }

        let stored = file
            .terms
            .iter_mut()
            .find(|s| s.kind == kind && s.term.id == id)
            .ok_or_else(|| EdflowError::not_found(kind, id))?;
        fields.apply_to(&mut stored.term);
        self.save(&file)
    }

    fn delete_term(&mut self, kind: Kind, id: TermId) -> Result<()> {
        let mut file = self.load()?;
        let before = file.terms.len();
        file.terms.retain(|s| !(s.kind == kind && s.term.id == id));
        if file.terms.len() == before {
            return Err(EdflowError::not_found(kind, id));
        }
        self.save(&file)
    }

    fn query_terms(&self, kind: Kind) -> Result<Vec<RawTerm>> {
        Ok(self
            .load()?
            .terms
            .into_iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.term)
            .collect())
    }
}

/// Value store backed by `values.json` in the data directory.
pub struct FileValueStore {
    root: PathBuf,
}

impl FileValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load(&self) -> Result<ValueMap> {
        load_json(&self.root.join(VALUES_FILENAME))
    }

    fn save(&self, values: &ValueMap) -> Result<()> {
        save_json(&self.root, VALUES_FILENAME, values)
    }
}

impl ValueStore for FileValueStore {
    fn set_value(&mut self, key: &str, post_id: u64, value: Value) -> Result<()> {
        let mut values = self.load()?;
        values
            .entry(key.to_string())
            .or_default()
            .insert(post_id, value);
        self.save(&values)
    }

    fn values_for_post(&self, post_id: u64) -> Result<BTreeMap<String, Value>> {
        Ok(self
            .load()?
            .into_iter()
            .filter_map(|(key, mut posts)| posts.remove(&post_id).map(|v| (key, v)))
            .collect())
    }

    fn delete_values_by_key(&mut self, key: &str) -> Result<usize> {
        let mut values = self.load()?;
        match values.remove(key) {
            Some(posts) => {
                self.save(&values)?;
                Ok(posts.len())
            }
            None => Ok(0),
        }
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).map_err(EdflowError::Io)?;
    let data = serde_json::from_str(&content).map_err(EdflowError::Serialization)?;
    Ok(data)
}

fn save_json<T: Serialize>(root: &Path, filename: &str, data: &T) -> Result<()> {
    if !root.exists() {
        fs::create_dir_all(root).map_err(EdflowError::Io)?;
    }
    let content = serde_json::to_string_pretty(data).map_err(EdflowError::Serialization)?;
    let tmp = root.join(format!("{}.tmp", filename));
    fs::write(&tmp, content).map_err(EdflowError::Io)?;
    fs::rename(&tmp, root.join(filename)).map_err(EdflowError::Io)?;
    Ok(())
}
