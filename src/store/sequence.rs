//! Didactic sequences
//!
//! Sequence ids come from a per-collection allocator that starts at 1 and
//! only moves forward (except on reset/import). Allocation and insertion
//! happen under one write lock, so concurrent creates get distinct,
//! contiguous ids.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use super::query::{ListQuery, SEQUENCE_SORT};
use super::Comment;
use crate::types::{EntityKind, ServiceError};

/// Alternate field names accepted on input, mapped to their canonical name
const FIELD_ALIASES: [(&str, &str); 8] = [
    ("titulo", "title"),
    ("modalidad", "modality"),
    ("niveau", "level"),
    ("langue", "language"),
    ("dialecte", "dialect"),
    ("contexte_culturel", "cultural_context"),
    ("support_audio", "audio_support"),
    ("support_video", "video_support"),
];

/// Rewrite aliased keys to their canonical names. A later key wins when
/// both spellings are present.
pub fn canonicalize(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| {
            let canonical = FIELD_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key)
                .map(|(_, name)| name.to_string())
                .unwrap_or(key);
            (canonical, value)
        })
        .collect()
}

fn canonical_name(key: &str) -> &str {
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or(key, |(_, name)| *name)
}

fn default_dialect() -> String {
    "yucatèque".to_string()
}

fn default_cultural_context() -> String {
    "scolaire".to_string()
}

/// Collaborative editing state of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    InEdit,
    Validated,
}

impl WorkflowStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "draft" => Some(Self::Draft),
            "in-edit" => Some(Self::InEdit),
            "validated" => Some(Self::Validated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub id: u64,
    #[serde(alias = "titulo", default)]
    pub title: String,
    #[serde(alias = "modalidad", default)]
    pub modality: String,
    #[serde(alias = "niveau", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(alias = "langue", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "dialecte", default = "default_dialect")]
    pub dialect: String,
    #[serde(alias = "contexte_culturel", default = "default_cultural_context")]
    pub cultural_context: String,
    #[serde(alias = "support_audio", default)]
    pub audio_support: Option<Value>,
    #[serde(alias = "support_video", default)]
    pub video_support: Option<Value>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: WorkflowStatus,
    /// Free-form fields kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sequence {
    /// Minimal valid record; id is assigned on insertion
    pub fn new(title: impl Into<String>, modality: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            modality: modality.into(),
            level: None,
            theme: None,
            language: None,
            description: None,
            dialect: default_dialect(),
            cultural_context: default_cultural_context(),
            audio_support: None,
            video_support: None,
            comments: Vec::new(),
            tags: Vec::new(),
            status: WorkflowStatus::Draft,
            extra: Map::new(),
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build a record from client-supplied fields. Any client id is dropped.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, ServiceError> {
        let mut fields = canonicalize(fields);
        fields.remove("id");
        let sequence: Sequence = serde_json::from_value(Value::Object(fields))
            .map_err(|e| ServiceError::BadRequest(format!("Invalid sequence: {}", e)))?;
        sequence.validate()?;
        Ok(sequence)
    }

    /// Build a record keeping its id (bulk import)
    pub fn from_value_with_id(value: Value) -> Result<Self, ServiceError> {
        let Value::Object(fields) = value else {
            return Err(ServiceError::BadRequest("Sequence must be a JSON object".into()));
        };
        let sequence: Sequence = serde_json::from_value(Value::Object(canonicalize(fields)))
            .map_err(|e| ServiceError::BadRequest(format!("Invalid sequence: {}", e)))?;
        sequence.validate()?;
        Ok(sequence)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "Missing required field 'title'".into(),
            ));
        }
        if self.modality.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "Missing required field 'modality'".into(),
            ));
        }
        Ok(())
    }

    /// Apply a partial update. The id never changes; an invalid result is
    /// an error and `self` is left untouched.
    pub fn merged(&self, patch: Map<String, Value>) -> Result<Self, ServiceError> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(ServiceError::Internal("Sequence did not serialize to an object".into())),
            Err(e) => return Err(ServiceError::Internal(format!("Failed to serialize sequence: {}", e))),
        };

        for (key, value) in canonicalize(patch) {
            if key != "id" {
                fields.insert(key, value);
            }
        }

        let mut updated: Sequence = serde_json::from_value(Value::Object(fields))
            .map_err(|e| ServiceError::BadRequest(format!("Invalid sequence: {}", e)))?;
        updated.id = self.id;
        updated.validate()?;
        Ok(updated)
    }

    /// Add a tag unless already present
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Value of a filterable/sortable field, if set
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(self.title.as_str()),
            "modality" => Some(self.modality.as_str()),
            "level" => self.level.as_deref(),
            "theme" => self.theme.as_deref(),
            _ => None,
        }
    }

    /// One flat map of all fields, used by CSV export
    pub fn to_fields(&self) -> Result<Map<String, Value>, ServiceError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ServiceError::Internal("Sequence did not serialize to an object".into())),
            Err(e) => Err(ServiceError::Internal(format!("Failed to serialize sequence: {}", e))),
        }
    }
}

/// Reserved upper bound of the allocator; never assigned to a record
pub const MAX_SEQUENCE_ID: u64 = u64::MAX;

/// Exact-match filters accepted by the sequence listing
pub const SEQUENCE_FILTERS: [&str; 3] = ["level", "theme", "modality"];

#[derive(Debug)]
struct SequenceTable {
    records: Vec<Sequence>,
    next_id: u64,
}

impl Default for SequenceTable {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }
}

/// The sequence collection with its id allocator
#[derive(Debug, Default)]
pub struct SequenceCollection {
    table: RwLock<SequenceTable>,
}

impl SequenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id, build the record with it, append.
    /// `u64::MAX` is never handed out; reaching it is an error.
    pub fn insert_with<F>(&self, build: F) -> Result<Sequence, ServiceError>
    where
        F: FnOnce(u64) -> Sequence,
    {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let id = table.next_id;
        if id == MAX_SEQUENCE_ID {
            return Err(ServiceError::BadRequest(
                "No sequence id left to allocate".into(),
            ));
        }
        let mut sequence = build(id);
        sequence.id = id;
        table.next_id = id + 1;
        table.records.push(sequence.clone());
        debug!("Created sequence {}", id);
        Ok(sequence)
    }

    /// Validate client fields and append with a fresh id
    pub fn create(&self, fields: Map<String, Value>) -> Result<Sequence, ServiceError> {
        let draft = Sequence::from_fields(fields)?;
        self.insert_with(move |_| draft)
    }

    pub fn get(&self, id: u64) -> Result<Sequence, ServiceError> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .records
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(EntityKind::Sequence, id))
    }

    pub fn exists(&self, id: u64) -> bool {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.records.iter().any(|s| s.id == id)
    }

    /// Run `f` against the record under the write lock
    pub fn modify<T, F>(&self, id: u64, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Sequence) -> Result<T, ServiceError>,
    {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let record = table
            .records
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ServiceError::not_found(EntityKind::Sequence, id))?;
        f(record)
    }

    pub fn update(&self, id: u64, patch: Map<String, Value>) -> Result<Sequence, ServiceError> {
        self.modify(id, |record| {
            let updated = record.merged(patch)?;
            *record = updated.clone();
            Ok(updated)
        })
    }

    pub fn delete(&self, id: u64) -> Result<Sequence, ServiceError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let index = table
            .records
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ServiceError::not_found(EntityKind::Sequence, id))?;
        Ok(table.records.remove(index))
    }

    pub fn add_tag(&self, id: u64, tag: &str) -> Result<Sequence, ServiceError> {
        self.modify(id, |record| {
            record.add_tag(tag);
            Ok(record.clone())
        })
    }

    pub fn add_comment(&self, id: u64, comment: Comment) -> Result<Sequence, ServiceError> {
        self.modify(id, |record| {
            record.comments.push(comment);
            Ok(record.clone())
        })
    }

    pub fn set_status(&self, id: u64, status: WorkflowStatus) -> Result<Sequence, ServiceError> {
        self.modify(id, |record| {
            record.status = status;
            Ok(record.clone())
        })
    }

    /// Filter, sort and paginate
    pub fn search(&self, params: &HashMap<String, String>) -> Vec<Sequence> {
        let query = ListQuery::from_params(params, SEQUENCE_SORT);
        let filters: Vec<(&str, &str)> = SEQUENCE_FILTERS
            .iter()
            .filter_map(|name| params.get(*name).map(|v| (*name, v.as_str())))
            .collect();

        let mut matched: Vec<Sequence> = {
            let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
            table
                .records
                .iter()
                .filter(|s| query.matches_text(&s.title, s.description.as_deref()))
                .filter(|s| filters.iter().all(|(name, value)| s.field(name) == Some(*value)))
                .cloned()
                .collect()
        };

        matched.sort_by(|a, b| query.order.apply(compare_by(a, b, query.sort_by)));
        query.paginate(matched)
    }

    /// Unpaginated multi-field search. The text query is matched against
    /// the whole serialized record; filters accept their aliased names.
    pub fn advanced_search(&self, params: &HashMap<String, String>) -> Vec<Sequence> {
        let query = ListQuery::from_params(params, SEQUENCE_SORT);
        let filters: Vec<(&str, &str)> = params
            .iter()
            .map(|(key, value)| (canonical_name(key), value.trim()))
            .filter(|(name, value)| SEQUENCE_FILTERS.contains(name) && !value.is_empty())
            .collect();

        let mut matched: Vec<Sequence> = {
            let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
            table
                .records
                .iter()
                .filter(|s| filters.iter().all(|(name, value)| s.field(name) == Some(*value)))
                .filter(|s| match &query.text {
                    None => true,
                    Some(needle) => serde_json::to_string(s)
                        .map(|record| record.to_lowercase().contains(needle))
                        .unwrap_or(false),
                })
                .cloned()
                .collect()
        };

        matched.sort_by(|a, b| query.order.apply(compare_by(a, b, query.sort_by)));
        matched
    }

    pub fn all(&self) -> Vec<Sequence> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone()
    }

    /// Records whose id is in `ids`, in collection order
    pub fn select(&self, ids: &[u64]) -> Vec<Sequence> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .records
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id the next insertion will receive
    pub fn next_id(&self) -> u64 {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .next_id
    }

    /// Replace every record. The allocator restarts after the highest id.
    pub fn replace_all(&self, records: Vec<Sequence>) {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.next_id = records
            .iter()
            .map(|s| s.id)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        table.records = records;
    }
}

fn compare_by(a: &Sequence, b: &Sequence, field: &str) -> Ordering {
    match field {
        "id" => a.id.cmp(&b.id),
        other => a.field(other).cmp(&b.field(other)).then(a.id.cmp(&b.id)),
    }
}
