//! # API Facade
//!
//! [`WorkflowApi`] is the single entry point for callers: the CLI today, an
//! HTTP surface tomorrow. It sits on top of [`OrderedRegistry`] and only deals
//! with raw caller input:
//!
//! - **Names** are trimmed and must not be empty.
//! - **Descriptions** have HTML tags stripped.
//! - **Slugs** are derived from names, never taken from the caller.
//! - **Ids** arrive as strings and are parsed into [`TermId`].
//! - **Metadata types** arrive as strings and are parsed into [`MetadataType`].
//!
//! Ordering, validation and storage stay in the registry. Results come back as
//! a [`CmdResult`] with the affected or listed records plus user-facing
//! messages; errors can be turned into an [`ErrorResponse`] with [`respond`].
//!
//! ## Reorder
//!
//! Unlike [`OrderedRegistry::reorder`], the facade resolves every id before
//! the first write. A request naming an unknown id changes nothing. Storage
//! failures halfway through can still leave earlier moves applied.

use crate::error::{EdflowError, ErrorResponse, Result};
use crate::model::{Kind, Lookup, MetadataType, NewTerm, Record, RecordUpdate, TermId};
use crate::registry::OrderedRegistry;
use crate::store::{TermStore, ValueStore};
use crate::validation::{sanitize_text, slugify, ValidationError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

/// A stored value of one metadata field for one post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub field: String,
    pub slug: String,
    pub value: Value,
}

#[derive(Debug, Default, Serialize)]
pub struct CmdResult {
    /// Records created, changed or removed by the call.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affected: Vec<Record>,
    /// A full ordered collection (list, reorder).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub listed: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<FieldValue>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected(mut self, records: Vec<Record>) -> Self {
        self.affected = records;
        self
    }

    pub fn with_listed(mut self, records: Vec<Record>) -> Self {
        self.listed = records;
        self
    }
}

/// Optional attributes of a create or edit request.
#[derive(Debug, Clone, Default)]
pub struct TermInput {
    pub description: Option<String>,
    pub review_required: Option<bool>,
    pub metadata_type: Option<String>,
    pub position: Option<u32>,
}

/// Converts a facade result into the wire contract: the value, or a
/// structured error with a machine-readable code.
pub fn respond<T>(result: Result<T>) -> std::result::Result<T, ErrorResponse> {
    result.map_err(|err| err.response())
}

pub struct WorkflowApi<S: TermStore, V: ValueStore> {
    registry: OrderedRegistry<S, V>,
}

impl<S: TermStore, V: ValueStore> WorkflowApi<S, V> {
    pub fn new(registry: OrderedRegistry<S, V>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &OrderedRegistry<S, V> {
        &self.registry
    }

    pub fn list(&self, kind: Kind) -> Result<CmdResult> {
        Ok(CmdResult::default().with_listed(self.registry.list(kind)?))
    }

    /// Looks a record up by id, then slug, then exact name.
    pub fn get(&self, kind: Kind, key: &str) -> Result<CmdResult> {
        let record = self.find(kind, key)?;
        Ok(CmdResult::default().with_affected(vec![record]))
    }

    pub fn create(&mut self, kind: Kind, name: &str, input: TermInput) -> Result<CmdResult> {
        let name = clean_name(name)?;
        let mut term = NewTerm::new(name.clone(), derive_slug(&name));
        if let Some(description) = &input.description {
            term = term.with_description(sanitize_text(description));
        }
        if let Some(position) = input.position {
            term = term.with_position(position);
        }
        match kind {
            Kind::Status => {
                term = term.with_review_required(input.review_required.unwrap_or(false));
            }
            Kind::MetadataField => {
                if let Some(metadata_type) = parse_type(input.metadata_type.as_deref())? {
                    term = term.with_type(metadata_type);
                }
            }
        }

        let record = self.registry.insert(kind, term)?;
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::success(format!(
            "Created {} '{}' at position {}",
            kind, record.name, record.position
        )));
        Ok(result.with_affected(vec![record]))
    }

    pub fn update(
        &mut self,
        kind: Kind,
        id: &str,
        name: Option<&str>,
        input: TermInput,
    ) -> Result<CmdResult> {
        let id = parse_id(id)?;
        let mut update = RecordUpdate {
            description: input.description.as_deref().map(sanitize_text),
            position: input.position,
            ..Default::default()
        };
        if let Some(name) = name {
            let name = clean_name(name)?;
            update.slug = Some(derive_slug(&name));
            update.name = Some(name);
        }
        match kind {
            Kind::Status => update.review_required = input.review_required,
            Kind::MetadataField => {
                update.metadata_type = parse_type(input.metadata_type.as_deref())?;
            }
        }

        let mut result = CmdResult::default();
        if update.is_empty() {
            let record = self.registry.require(kind, id)?;
            let message = format!("Nothing to change for '{}'", record.name);
            result.add_message(CmdMessage::info(message));
            return Ok(result.with_affected(vec![record]));
        }

        let record = self.registry.update(kind, id, update)?;
        result.add_message(CmdMessage::success(format!("Updated {} '{}'", kind, record.name)));
        Ok(result.with_affected(vec![record]))
    }

    pub fn delete(&mut self, kind: Kind, id: &str) -> Result<CmdResult> {
        let id = parse_id(id)?;
        let record = self.registry.delete(kind, id)?;
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::success(format!("Deleted {} '{}'", kind, record.name)));
        Ok(result.with_affected(vec![record]))
    }

    /// Moves records to 0-based ranks. Every id must parse and exist before
    /// anything is written.
    pub fn reorder(&mut self, kind: Kind, ranks: &BTreeMap<usize, String>) -> Result<CmdResult> {
        let mut resolved = BTreeMap::new();
        for (rank, raw) in ranks {
            let id = parse_id(raw)?;
            self.registry.require(kind, id)?;
            resolved.insert(*rank, id);
        }

        let ordered = self.registry.reorder(kind, &resolved)?;
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::success(format!(
            "Reordered {} {}",
            resolved.len(),
            plural(kind, resolved.len())
        )));
        Ok(result.with_listed(ordered))
    }

    /// Same as [`WorkflowApi::reorder`] with ranks taken from list order.
    pub fn reorder_ids<I: AsRef<str>>(&mut self, kind: Kind, ids: &[I]) -> Result<CmdResult> {
        let ranks = ids
            .iter()
            .enumerate()
            .map(|(rank, id)| (rank, id.as_ref().to_string()))
            .collect();
        self.reorder(kind, &ranks)
    }

    pub fn next_status(&self, slug: &str) -> Result<CmdResult> {
        let current = self.find(Kind::Status, slug)?;
        let mut result = CmdResult::default();
        match self.registry.next_status(&current.slug)? {
            Some(next) => result.affected.push(next),
            None => result.add_message(CmdMessage::info(format!(
                "'{}' is the last status in the workflow",
                current.name
            ))),
        }
        Ok(result)
    }

    /// Installs the stock statuses and metadata fields that are missing.
    pub fn install_defaults(&mut self) -> Result<CmdResult> {
        let mut installed = Vec::new();
        for kind in Kind::all() {
            installed.extend(self.registry.install_defaults(*kind)?);
        }

        let mut result = CmdResult::default();
        if installed.is_empty() {
            result.add_message(CmdMessage::info("Default terms already installed"));
        } else {
            result.add_message(CmdMessage::success(format!(
                "Installed {} default terms",
                installed.len()
            )));
        }
        Ok(result.with_affected(installed))
    }

    /// Stores a value for a post, coerced to the field's type.
    pub fn set_field_value(&mut self, post_id: u64, field: &str, raw: &str) -> Result<CmdResult> {
        let record = self.find(Kind::MetadataField, field)?;
        let (Some(metadata_type), Some(key)) = (record.metadata_type, record.storage_key.clone())
        else {
            return Err(ValidationError::MissingType.into());
        };

        let value = metadata_type.sanitize_value(raw);
        self.registry.values_mut().set_value(&key, post_id, value.clone())?;

        let mut result = CmdResult::default();
        result.add_message(CmdMessage::success(format!(
            "Set '{}' on post {}",
            record.name, post_id
        )));
        result.values.push(FieldValue {
            field: record.name,
            slug: record.slug,
            value,
        });
        Ok(result)
    }

    /// Values stored for a post, in field order. Values whose field no longer
    /// exists are reported as a warning.
    pub fn post_values(&self, post_id: u64) -> Result<CmdResult> {
        let mut stored = self.registry.values().values_for_post(post_id)?;
        let mut result = CmdResult::default();

        for field in self.registry.list(Kind::MetadataField)? {
            let Some(key) = &field.storage_key else {
                continue;
            };
            if let Some(value) = stored.remove(key) {
                result.values.push(FieldValue {
                    field: field.name,
                    slug: field.slug,
                    value,
                });
            }
        }

        for key in stored.keys() {
            result.add_message(CmdMessage::warning(format!(
                "Value under '{}' has no matching field",
                key
            )));
        }
        if result.values.is_empty() && result.messages.is_empty() {
            result.add_message(CmdMessage::info(format!("No values for post {}", post_id)));
        }
        Ok(result)
    }

    fn find(&self, kind: Kind, key: &str) -> Result<Record> {
        let key = key.trim();
        let mut lookups = Vec::with_capacity(3);
        if let Ok(id) = key.parse::<TermId>() {
            lookups.push(Lookup::Id(id));
        }
        lookups.push(Lookup::Slug(key.to_string()));
        lookups.push(Lookup::Name(key.to_string()));

        for lookup in &lookups {
            if let Some(record) = self.registry.get_by(kind, lookup)? {
                return Ok(record);
            }
        }
        Err(EdflowError::not_found(kind, key))
    }
}

fn clean_name(name: &str) -> Result<String> {
    let name = sanitize_text(name);
    if name.is_empty() {
        return Err(ValidationError::Empty.into());
    }
    Ok(name)
}

/// Slug for a name. Names with no ASCII alphanumerics fall back to a
/// lowercased, dash-joined form of the name itself.
fn derive_slug(name: &str) -> String {
    let slug = slugify(name);
    if !slug.is_empty() {
        return slug;
    }
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn parse_id(raw: &str) -> Result<TermId> {
    Ok(raw.parse::<TermId>()?)
}

fn parse_type(raw: Option<&str>) -> Result<Option<MetadataType>> {
    Ok(raw.map(str::parse::<MetadataType>).transpose()?)
}

fn plural(kind: Kind, count: usize) -> String {
    let noun = match kind {
        Kind::Status => "status",
        Kind::MetadataField => "field",
    };
    match (kind, count) {
        (_, 1) => noun.to_string(),
        (Kind::Status, _) => "statuses".to_string(),
        (Kind::MetadataField, _) => "fields".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EdflowConfig;
    use crate::store::memory::{MemTermStore, MemValueStore};

    type TestApi = WorkflowApi<MemTermStore, MemValueStore>;

    fn api() -> TestApi {
        WorkflowApi::new(OrderedRegistry::new(
            MemTermStore::new(),
            MemValueStore::new(),
            EdflowConfig::default(),
        ))
    }

    fn create_status(api: &mut TestApi, name: &str) -> Record {
        api.create(Kind::Status, name, TermInput::default())
            .unwrap()
            .affected
            .remove(0)
    }

    fn field_input(metadata_type: &str) -> TermInput {
        TermInput {
            metadata_type: Some(metadata_type.to_string()),
            ..Default::default()
        }
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_create_trims_and_derives_slug() {
        let mut api = api();
        let result = api
            .create(
                Kind::Status,
                "  Copy Edit  ",
                TermInput {
                    description: Some("<b>Line</b> edits".into()),
                    review_required: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let record = &result.affected[0];
        assert_eq!(record.name, "Copy Edit");
        assert_eq!(record.slug, "copy-edit");
        assert_eq!(record.description, "Line edits");
        assert!(record.is_review_required());
        assert!(matches!(result.messages[0].level, MessageLevel::Success));
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let mut api = api();
        let err = api.create(Kind::Status, "   ", TermInput::default()).unwrap_err();
        assert!(matches!(err, EdflowError::Validation(ValidationError::Empty)));
        assert_eq!(err.response().code, "invalid");
    }

    #[test]
    fn test_create_field_parses_type() {
        let mut api = api();
        let result = api
            .create(Kind::MetadataField, "Needs Photo", field_input("Checkbox"))
            .unwrap();
        assert_eq!(result.affected[0].metadata_type, Some(MetadataType::Checkbox));

        let err = api
            .create(Kind::MetadataField, "Due", field_input("date"))
            .unwrap_err();
        assert!(matches!(
            err,
            EdflowError::Validation(ValidationError::UnsupportedType(_))
        ));

        let err = api
            .create(Kind::MetadataField, "Due", TermInput::default())
            .unwrap_err();
        assert!(matches!(
            err,
            EdflowError::Validation(ValidationError::MissingType)
        ));
    }

    #[test]
    fn test_non_ascii_name_gets_a_slug() {
        let mut api = api();
        let record = create_status(&mut api, "Überprüfung");
        assert_eq!(record.slug, "berpr-fung");
        let record = create_status(&mut api, "校对 中");
        assert_eq!(record.slug, "校对-中");
    }

    #[test]
    fn test_update_rejects_bad_id() {
        let mut api = api();
        let err = api
            .update(Kind::Status, "bad-id", Some("Draft"), TermInput::default())
            .unwrap_err();
        assert!(matches!(
            err,
            EdflowError::Validation(ValidationError::InvalidId(_))
        ));
    }

    #[test]
    fn test_update_rename_rederives_slug() {
        let mut api = api();
        let record = create_status(&mut api, "Pitch");
        let result = api
            .update(
                Kind::Status,
                &record.id.to_string(),
                Some("Pitched Idea"),
                TermInput::default(),
            )
            .unwrap();
        assert_eq!(result.affected[0].slug, "pitched-idea");
    }

    #[test]
    fn test_update_without_changes_reports_info() {
        let mut api = api();
        let record = create_status(&mut api, "Pitch");
        let result = api
            .update(Kind::Status, &record.id.to_string(), None, TermInput::default())
            .unwrap();
        assert!(matches!(result.messages[0].level, MessageLevel::Info));
        assert_eq!(result.affected[0], record);
    }

    #[test]
    fn test_delete_unknown_id_is_not_found() {
        let mut api = api();
        create_status(&mut api, "Pitch");
        let err = api.delete(Kind::Status, "77").unwrap_err();
        assert_eq!(err.http_status(), 404);
        assert_eq!(respond::<()>(Err(err)).unwrap_err().code, "invalid");
    }

    #[test]
    fn test_reorder_prevalidates_every_id() {
        let mut api = api();
        let ids: Vec<String> = ["A", "B", "C"]
            .iter()
            .map(|n| create_status(&mut api, n).id.to_string())
            .collect();
        let writes = api.registry().store().writes();

        let err = api
            .reorder_ids(Kind::Status, &[ids[2].as_str(), "999", ids[0].as_str()])
            .unwrap_err();
        assert!(matches!(err, EdflowError::NotFound { .. }));
        assert_eq!(api.registry().store().writes(), writes);

        let err = api
            .reorder_ids(Kind::Status, &[ids[2].as_str(), "bad-id"])
            .unwrap_err();
        assert!(matches!(
            err,
            EdflowError::Validation(ValidationError::InvalidId(_))
        ));
        assert_eq!(api.registry().store().writes(), writes);
    }

    #[test]
    fn test_reorder_returns_ordered_collection() {
        let mut api = api();
        let ids: Vec<String> = ["A", "B", "C"]
            .iter()
            .map(|n| create_status(&mut api, n).id.to_string())
            .collect();

        let result = api
            .reorder_ids(Kind::Status, &[&ids[1], &ids[2], &ids[0]])
            .unwrap();
        assert_eq!(names(&result.listed), vec!["B", "C", "A"]);
        assert_eq!(result.messages[0].content, "Reordered 3 statuses");
    }

    #[test]
    fn test_get_by_id_slug_or_name() {
        let mut api = api();
        let record = create_status(&mut api, "In Progress");
        for key in [record.id.to_string(), "in-progress".into(), "In Progress".into()] {
            assert_eq!(api.get(Kind::Status, &key).unwrap().affected[0].id, record.id);
        }
        assert!(matches!(
            api.get(Kind::Status, "missing").unwrap_err(),
            EdflowError::NotFound { .. }
        ));
    }

    #[test]
    fn test_next_status() {
        let mut api = api();
        api.install_defaults().unwrap();

        let result = api.next_status("draft").unwrap();
        assert_eq!(result.affected[0].slug, "pending");

        let result = api.next_status("pending").unwrap();
        assert!(result.affected.is_empty());
        assert!(matches!(result.messages[0].level, MessageLevel::Info));

        assert!(api.next_status("nope").is_err());
    }

    #[test]
    fn test_install_defaults_twice() {
        let mut api = api();
        assert_eq!(api.install_defaults().unwrap().affected.len(), 8);
        let again = api.install_defaults().unwrap();
        assert!(again.affected.is_empty());
        assert_eq!(again.messages[0].content, "Default terms already installed");
    }

    #[test]
    fn test_field_values_are_sanitized_and_listed_in_field_order() {
        let mut api = api();
        api.install_defaults().unwrap();

        api.set_field_value(10, "word-count", " 1200 ").unwrap();
        api.set_field_value(10, "needs-photo", "off").unwrap();
        api.set_field_value(10, "Assignment", "<i>Profile</i> of the mayor")
            .unwrap();

        let result = api.post_values(10).unwrap();
        let values: Vec<(&str, &Value)> = result
            .values
            .iter()
            .map(|v| (v.slug.as_str(), &v.value))
            .collect();
        assert_eq!(
            values,
            vec![
                ("assignment", &Value::from("Profile of the mayor")),
                ("needs-photo", &Value::Bool(false)),
                ("word-count", &Value::from("1200")),
            ]
        );
    }

    #[test]
    fn test_deleting_field_drops_its_values() {
        let mut api = api();
        let field = api
            .create(Kind::MetadataField, "Needs Photo", field_input("checkbox"))
            .unwrap()
            .affected
            .remove(0);
        api.set_field_value(3, "needs-photo", "yes").unwrap();
        assert_eq!(api.post_values(3).unwrap().values.len(), 1);

        api.delete(Kind::MetadataField, &field.id.to_string()).unwrap();
        let result = api.post_values(3).unwrap();
        assert!(result.values.is_empty());
        assert_eq!(result.messages[0].content, "No values for post 3");
    }

    #[test]
    fn test_set_value_on_unknown_field() {
        let mut api = api();
        let err = api.set_field_value(1, "ghost", "x").unwrap_err();
        assert!(matches!(err, EdflowError::NotFound { .. }));
    }
}
