//! In-memory resource store
//!
//! Owns every shared collection: sequences, library documents, community
//! resources, the share/favorite ledgers and notification inboxes. Each
//! collection carries its own lock; no operation holds two at once.

pub mod catalog;
pub mod csv;
pub mod ledger;
pub mod query;
pub mod seed;
pub mod sequence;

pub use catalog::{Catalog, CatalogItem};
pub use ledger::{Inbox, ItemSet, Ledger};
pub use query::{ListQuery, SortOrder};
pub use sequence::{Sequence, SequenceCollection, WorkflowStatus, MAX_SEQUENCE_ID};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::info;

use crate::types::{EntityKind, ServiceError};

/// A remark left on a sequence or resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }
}

/// Full dump of the content collections
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub sequences: Vec<Sequence>,
    pub library_documents: Vec<CatalogItem>,
    pub internet_resources: Vec<CatalogItem>,
}

/// Import payload; records are validated one by one before anything is
/// replaced
#[derive(Debug, Default, Deserialize)]
pub struct SnapshotInput {
    #[serde(default)]
    pub sequences: Vec<Value>,
    #[serde(default)]
    pub library_documents: Vec<Value>,
    #[serde(default)]
    pub internet_resources: Vec<Value>,
}

/// Collection addressed by the CSV endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvTarget {
    Sequences,
    Resources,
}

impl FromStr for CsvTarget {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "sequences" => Ok(CsvTarget::Sequences),
            "resources" => Ok(CsvTarget::Resources),
            other => Err(ServiceError::BadRequest(format!(
                "Unknown 'what' parameter '{}' (expected sequences or resources)",
                other
            ))),
        }
    }
}

pub struct ResourceStore {
    pub sequences: SequenceCollection,
    pub documents: Catalog,
    pub resources: Catalog,
    pub shares: Ledger,
    pub favorites: Ledger,
    pub notifications: Inbox,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore {
    /// Store with every collection empty
    pub fn new() -> Self {
        Self {
            sequences: SequenceCollection::new(),
            documents: Catalog::new(EntityKind::Document),
            resources: Catalog::new(EntityKind::Resource),
            shares: Ledger::new(),
            favorites: Ledger::new(),
            notifications: Inbox::new(),
        }
    }

    /// Store holding the default document and resource catalogue
    pub fn with_default_catalogue() -> Self {
        let store = Self::new();
        store.documents.replace_all(seed::default_documents());
        store.resources.replace_all(seed::default_resources());
        store
    }

    /// Drop all sequences, restart the allocator and restore the default
    /// catalogue. Ledgers and inboxes are untouched.
    pub fn reset(&self) {
        self.sequences.replace_all(Vec::new());
        self.documents.replace_all(seed::default_documents());
        self.resources.replace_all(seed::default_resources());
        info!("Content collections reset to defaults");
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sequences: self.sequences.all(),
            library_documents: self.documents.all(),
            internet_resources: self.resources.all(),
        }
    }

    /// Replace all three content collections. Nothing changes unless every
    /// record is valid.
    pub fn import(&self, input: SnapshotInput) -> Result<(), ServiceError> {
        let sequences = import_sequences(input.sequences)?;
        let documents = import_catalog(input.library_documents, EntityKind::Document)?;
        let resources = import_catalog(input.internet_resources, EntityKind::Resource)?;

        info!(
            "Imported {} sequences, {} documents, {} resources",
            sequences.len(),
            documents.len(),
            resources.len()
        );
        self.sequences.replace_all(sequences);
        self.documents.replace_all(documents);
        self.resources.replace_all(resources);
        Ok(())
    }

    /// Append CSV rows to a collection, returning how many were added.
    /// Sequences always get fresh ids.
    pub fn import_csv(&self, target: CsvTarget, text: &str) -> Result<usize, ServiceError> {
        let rows = csv::parse(text)?;
        match target {
            CsvTarget::Sequences => {
                let drafts = rows
                    .into_iter()
                    .map(Sequence::from_fields)
                    .collect::<Result<Vec<_>, _>>()?;
                let count = drafts.len();
                for draft in drafts {
                    self.sequences.insert_with(move |_| draft)?;
                }
                Ok(count)
            }
            CsvTarget::Resources => {
                let items = rows
                    .into_iter()
                    .map(|row| CatalogItem::from_value(Value::Object(row)))
                    .collect::<Result<Vec<_>, _>>()?;
                let count = items.len();
                for item in items {
                    self.resources.insert(item)?;
                }
                Ok(count)
            }
        }
    }

    /// CSV dump of a collection; `None` when it is empty
    pub fn export_csv(&self, target: CsvTarget) -> Result<Option<String>, ServiceError> {
        let rows: Vec<Map<String, Value>> = match target {
            CsvTarget::Sequences => self
                .sequences
                .all()
                .iter()
                .map(Sequence::to_fields)
                .collect::<Result<_, _>>()?,
            CsvTarget::Resources => self
                .resources
                .all()
                .iter()
                .map(CatalogItem::to_fields)
                .collect::<Result<_, _>>()?,
        };
        Ok(csv::write(&rows))
    }
}

fn import_sequences(values: Vec<Value>) -> Result<Vec<Sequence>, ServiceError> {
    let mut records = values
        .into_iter()
        .map(Sequence::from_value_with_id)
        .collect::<Result<Vec<_>, _>>()?;

    if records.iter().any(|s| s.id == MAX_SEQUENCE_ID) {
        return Err(ServiceError::BadRequest(format!(
            "Sequence id {} is reserved",
            MAX_SEQUENCE_ID
        )));
    }

    let mut seen = HashSet::new();
    for record in records.iter().filter(|s| s.id != 0) {
        if !seen.insert(record.id) {
            return Err(ServiceError::BadRequest(format!(
                "Duplicate sequence id {} in import",
                record.id
            )));
        }
    }

    // records without an id are numbered after the highest one
    let mut last = records.iter().map(|s| s.id).max().unwrap_or(0);
    for record in records.iter_mut().filter(|s| s.id == 0) {
        last = last
            .checked_add(1)
            .filter(|id| *id < MAX_SEQUENCE_ID)
            .ok_or_else(|| ServiceError::BadRequest("No sequence id left to allocate".into()))?;
        record.id = last;
    }
    Ok(records)
}

fn import_catalog(values: Vec<Value>, kind: EntityKind) -> Result<Vec<CatalogItem>, ServiceError> {
    let staging = Catalog::new(kind);
    for value in values {
        staging.insert(CatalogItem::from_value(value)?)?;
    }
    Ok(staging.all())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reset_restores_defaults() {
        let store = ResourceStore::with_default_catalogue();
        store.sequences.insert_with(seed::auto_sequence).unwrap();
        store.documents.delete("1").unwrap();

        store.reset();
        assert!(store.sequences.is_empty());
        assert_eq!(store.sequences.next_id(), 1);
        assert_eq!(store.documents.len(), 4);
        assert_eq!(store.resources.len(), 4);
    }

    #[test]
    fn test_import_replaces_and_moves_allocator() {
        let store = ResourceStore::with_default_catalogue();
        let input: SnapshotInput = serde_json::from_value(json!({
            "sequences": [
                {"id": 7, "titulo": "Importée", "modalidad": "en ligne"},
                {"title": "Sans id", "modality": "présentiel"}
            ],
            "internet_resources": [{"title": "R"}]
        }))
        .unwrap();

        store.import(input).unwrap();
        assert_eq!(store.sequences.len(), 2);
        assert_eq!(store.sequences.get(8).unwrap().title, "Sans id");
        assert_eq!(store.sequences.next_id(), 9);
        assert!(store.documents.is_empty());
        assert_eq!(store.resources.get("1").unwrap().title, "R");
    }

    #[test]
    fn test_invalid_import_changes_nothing() {
        let store = ResourceStore::with_default_catalogue();
        let input: SnapshotInput = serde_json::from_value(json!({
            "sequences": [{"id": 1, "title": "ok", "modality": "m"}, {"id": 2, "title": ""}]
        }))
        .unwrap();

        assert!(store.import(input).is_err());
        assert!(store.sequences.is_empty());
        assert_eq!(store.documents.len(), 4);
    }

    #[test]
    fn test_import_rejects_reserved_sequence_id() {
        let store = ResourceStore::new();
        let input: SnapshotInput = serde_json::from_value(json!({
            "sequences": [{"id": u64::MAX, "title": "Top", "modality": "m"}]
        }))
        .unwrap();
        assert!(matches!(store.import(input), Err(ServiceError::BadRequest(_))));

        let input: SnapshotInput = serde_json::from_value(json!({
            "sequences": [
                {"id": MAX_SEQUENCE_ID - 1, "title": "Last", "modality": "m"},
                {"title": "No room", "modality": "m"}
            ]
        }))
        .unwrap();
        assert!(matches!(store.import(input), Err(ServiceError::BadRequest(_))));
        assert!(store.sequences.is_empty());
    }

    #[test]
    fn test_csv_round_trip_through_store() {
        let store = ResourceStore::new();
        let added = store
            .import_csv(CsvTarget::Sequences, "titulo,modalidad,niveau\nUno,en ligne,A1\nDos,présentiel,A2\n")
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.sequences.get(2).unwrap().level.as_deref(), Some("A2"));

        let out = store.export_csv(CsvTarget::Sequences).unwrap().unwrap();
        assert!(out.starts_with("audio_support,comments,cultural_context,dialect,id,level,modality,status,tags,title,"));

        let copy = ResourceStore::new();
        assert_eq!(copy.import_csv(CsvTarget::Sequences, &out).unwrap(), 2);
        assert_eq!(copy.sequences.get(1).unwrap().title, "Uno");
    }

    #[test]
    fn test_csv_export_empty_is_none() {
        let store = ResourceStore::new();
        assert!(store.export_csv(CsvTarget::Resources).unwrap().is_none());
        assert!("books".parse::<CsvTarget>().is_err());
        assert_eq!("".parse::<CsvTarget>().unwrap(), CsvTarget::Sequences);
    }
}
