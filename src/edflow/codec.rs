//! # Attribute Codec
//!
//! The term store gives each record exactly one free-text field. Statuses and
//! metadata fields need more than that (a position, a type, flags, a storage
//! key), so all of it is packed into that one field.
//!
//! ## Blob Format
//!
//! ```text
//! edflow:v1:<base64 of a JSON object>
//! ```
//!
//! The JSON object carries the user's free-text description under
//! `description` next to the structured keys. Keys this version does not
//! know are kept in [`Attributes::extra`] and written back untouched.
//!
//! Anything that does not carry the prefix, or fails to decode, is treated as
//! plain text: the whole blob becomes the description and no structured
//! attributes are reported. Decoding never fails.

use crate::model::MetadataType;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::warn;

pub const BLOB_PREFIX: &str = "edflow:v1:";

const KEY_DESCRIPTION: &str = "description";
const KEY_POSITION: &str = "position";
const KEY_TYPE: &str = "type";
const KEY_REVIEW_REQUIRED: &str = "review_required";
const KEY_STORAGE_KEY: &str = "storage_key";

/// Structured attributes layered onto a term's description.
///
/// `extra` must not repeat one of the recognized keys; those always come
/// from the typed fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub description: String,
    pub position: Option<u32>,
    pub metadata_type: Option<MetadataType>,
    pub review_required: Option<bool>,
    pub storage_key: Option<String>,
    pub extra: Map<String, Value>,
}

impl Attributes {
    pub fn plain(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// True when nothing beyond the free-text description is set.
    pub fn is_unstructured(&self) -> bool {
        self.position.is_none()
            && self.metadata_type.is_none()
            && self.review_required.is_none()
            && self.storage_key.is_none()
            && self.extra.is_empty()
    }
}

pub fn encode(attrs: &Attributes) -> String {
    let mut map = attrs.extra.clone();
    map.insert(
        KEY_DESCRIPTION.to_string(),
        Value::String(attrs.description.clone()),
    );
    if let Some(position) = attrs.position {
        map.insert(KEY_POSITION.to_string(), Value::from(position));
    }
    if let Some(metadata_type) = attrs.metadata_type {
        map.insert(
            KEY_TYPE.to_string(),
            Value::String(metadata_type.as_str().to_string()),
        );
    }
    if let Some(review_required) = attrs.review_required {
        map.insert(KEY_REVIEW_REQUIRED.to_string(), Value::Bool(review_required));
    }
    if let Some(storage_key) = &attrs.storage_key {
        map.insert(KEY_STORAGE_KEY.to_string(), Value::String(storage_key.clone()));
    }

    let json = Value::Object(map).to_string();
    format!("{}{}", BLOB_PREFIX, STANDARD.encode(json))
}

pub fn decode(blob: &str) -> Attributes {
    let Some(body) = blob.strip_prefix(BLOB_PREFIX) else {
        return Attributes::plain(blob);
    };

    match decode_body(body) {
        Some(map) => from_map(map),
        None => {
            warn!(
                target: "edflow::codec",
                len = blob.len(),
                "Undecodable attribute blob, keeping it as plain text"
            );
            Attributes::plain(blob)
        }
    }
}

fn decode_body(body: &str) -> Option<Map<String, Value>> {
    let bytes = STANDARD.decode(body.trim()).ok()?;
    let json = String::from_utf8(bytes).ok()?;
    match serde_json::from_str::<Value>(&json).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn from_map(mut map: Map<String, Value>) -> Attributes {
    let mut attrs = Attributes::default();

    // Recognized keys holding a value of the wrong shape stay in `extra`.
    if let Some(Value::String(description)) = map.get(KEY_DESCRIPTION) {
        attrs.description = description.clone();
        map.remove(KEY_DESCRIPTION);
    }
    if let Some(position) = map.get(KEY_POSITION).and_then(parse_position) {
        attrs.position = Some(position);
        map.remove(KEY_POSITION);
    }
    if let Some(metadata_type) = map
        .get(KEY_TYPE)
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<MetadataType>().ok())
    {
        attrs.metadata_type = Some(metadata_type);
        map.remove(KEY_TYPE);
    }
    if let Some(review_required) = map.get(KEY_REVIEW_REQUIRED).and_then(Value::as_bool) {
        attrs.review_required = Some(review_required);
        map.remove(KEY_REVIEW_REQUIRED);
    }
    if let Some(Value::String(storage_key)) = map.get(KEY_STORAGE_KEY) {
        attrs.storage_key = Some(storage_key.clone());
        map.remove(KEY_STORAGE_KEY);
    }

    attrs.extra = map;
    attrs
}

fn parse_position(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}
