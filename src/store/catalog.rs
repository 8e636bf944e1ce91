//! Library documents and community resources
//!
//! Both collections hold the same record shape under a string id. A client
//! may pick the id; otherwise the next integer above the highest numeric id
//! is used.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use super::query::{ListQuery, CATALOG_SORT};
use super::Comment;
use crate::types::{EntityKind, ServiceError};

/// Accept ids sent as JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogItem {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        date: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: description.into(),
            url: url.into(),
            date: date.into(),
            content: content.into(),
            tags: Vec::new(),
            comments: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach a free-form field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn from_value(value: Value) -> Result<Self, ServiceError> {
        let item: CatalogItem = serde_json::from_value(value)
            .map_err(|e| ServiceError::BadRequest(format!("Invalid record: {}", e)))?;
        item.validate()?;
        Ok(item)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "Missing required field 'title'".into(),
            ));
        }
        Ok(())
    }

    /// Apply a partial update; the id is immutable
    pub fn merged(&self, patch: Map<String, Value>) -> Result<Self, ServiceError> {
        let mut fields = self.to_fields()?;
        for (key, value) in patch {
            if key != "id" {
                fields.insert(key, value);
            }
        }
        let mut updated = CatalogItem::from_value(Value::Object(fields))?;
        updated.id = self.id.clone();
        Ok(updated)
    }

    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// String-valued free-form field
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn to_fields(&self) -> Result<Map<String, Value>, ServiceError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ServiceError::Internal("Record did not serialize to an object".into())),
            Err(e) => Err(ServiceError::Internal(format!("Failed to serialize record: {}", e))),
        }
    }

    fn sort_key(&self, field: &str) -> &str {
        match field {
            "title" => &self.title,
            _ => &self.date,
        }
    }
}

/// One string-keyed collection (documents or resources)
#[derive(Debug)]
pub struct Catalog {
    kind: EntityKind,
    items: RwLock<Vec<CatalogItem>>,
}

impl Catalog {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Append a fully-formed record. A blank id is allocated, a taken one
    /// is rejected.
    pub fn insert(&self, item: CatalogItem) -> Result<CatalogItem, ServiceError> {
        self.insert_with(move |_| item)
    }

    /// Like [`Catalog::insert`], handing the id that would be allocated to
    /// the builder so it can appear in derived fields
    pub fn insert_with<F>(&self, build: F) -> Result<CatalogItem, ServiceError>
    where
        F: FnOnce(&str) -> CatalogItem,
    {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let allocated = next_numeric_id(&items)
            .map(|id| id.to_string())
            .unwrap_or_default();
        let mut item = build(&allocated);
        if item.id.trim().is_empty() {
            if allocated.is_empty() {
                return Err(ServiceError::BadRequest(format!(
                    "No {} id left to allocate; supply an explicit id",
                    self.kind
                )));
            }
            item.id = allocated;
        }
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(ServiceError::BadRequest(format!(
                "{} id '{}' already exists",
                self.kind, item.id
            )));
        }
        debug!("Created {} {}", self.kind, item.id);
        items.push(item.clone());
        Ok(item)
    }

    /// Validate client fields and append
    pub fn create(&self, value: Value) -> Result<CatalogItem, ServiceError> {
        let item = CatalogItem::from_value(value)?;
        self.insert(item)
    }

    pub fn get(&self, id: &str) -> Result<CatalogItem, ServiceError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(self.kind, id))
    }

    pub fn exists(&self, id: &str) -> bool {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.iter().any(|item| item.id == id)
    }

    pub fn modify<T, F>(&self, id: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut CatalogItem) -> Result<T, ServiceError>,
    {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let record = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| ServiceError::not_found(self.kind, id))?;
        f(record)
    }

    pub fn update(&self, id: &str, patch: Map<String, Value>) -> Result<CatalogItem, ServiceError> {
        self.modify(id, |record| {
            let updated = record.merged(patch)?;
            *record = updated.clone();
            Ok(updated)
        })
    }

    pub fn delete(&self, id: &str) -> Result<CatalogItem, ServiceError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let index = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| ServiceError::not_found(self.kind, id))?;
        Ok(items.remove(index))
    }

    pub fn add_tag(&self, id: &str, tag: &str) -> Result<CatalogItem, ServiceError> {
        self.modify(id, |record| {
            record.add_tag(tag);
            Ok(record.clone())
        })
    }

    pub fn add_comment(&self, id: &str, comment: Comment) -> Result<CatalogItem, ServiceError> {
        self.modify(id, |record| {
            record.comments.push(comment);
            Ok(record.clone())
        })
    }

    /// Text search, sort and paginate
    pub fn search(&self, params: &HashMap<String, String>) -> Vec<CatalogItem> {
        let query = ListQuery::from_params(params, CATALOG_SORT);
        let mut matched: Vec<CatalogItem> = {
            let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
            items
                .iter()
                .filter(|item| query.matches_text(&item.title, Some(&item.description)))
                .cloned()
                .collect()
        };

        matched.sort_by(|a, b| {
            query
                .order
                .apply(a.sort_key(query.sort_by).cmp(b.sort_key(query.sort_by)))
                .then_with(|| compare_ids(&a.id, &b.id))
        });
        query.paginate(matched)
    }

    pub fn all(&self) -> Vec<CatalogItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace_all(&self, items: Vec<CatalogItem>) {
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }
}

/// One above the highest numeric id; `None` once the numeric space is used up
fn next_numeric_id(items: &[CatalogItem]) -> Option<u64> {
    items
        .iter()
        .filter_map(|item| item.id.parse::<u64>().ok())
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Catalog {
        let catalog = Catalog::new(EntityKind::Document);
        catalog
            .insert(CatalogItem::new("Alpha", "maya grammar", "u", "2023-01-01", "c"))
            .unwrap();
        catalog
            .insert(CatalogItem::new("Beta", "history", "u", "2023-03-01", "c"))
            .unwrap();
        catalog
    }

    #[test]
    fn test_ids_allocated_above_numeric_max() {
        let c = catalog();
        let item = c.create(json!({"id": "zz", "title": "Named"})).unwrap();
        assert_eq!(item.id, "zz");

        let next = c.create(json!({"title": "Auto"})).unwrap();
        assert_eq!(next.id, "3");
    }

    #[test]
    fn test_numeric_client_id_accepted() {
        let c = catalog();
        let item = c.create(json!({"id": 10, "title": "Numbered"})).unwrap();
        assert_eq!(item.id, "10");
        assert_eq!(c.create(json!({"title": "Next"})).unwrap().id, "11");
    }

    #[test]
    fn test_highest_numeric_id_does_not_block_inserts() {
        let c = catalog();
        let top = u64::MAX.to_string();
        assert_eq!(c.create(json!({"id": top, "title": "Top"})).unwrap().id, top);

        let explicit = c.create(json!({"id": "7", "title": "explicit id"})).unwrap();
        assert_eq!(explicit.id, "7");
        let named = c.create(json!({"id": "zz", "title": "Named"})).unwrap();
        assert_eq!(named.id, "zz");

        let err = c.create(json!({"title": "Auto"})).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(c.len(), 5);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let c = catalog();
        let err = c.create(json!({"id": "1", "title": "Dup"})).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_search_defaults_to_newest_first() {
        let c = catalog();
        let titles: Vec<_> = c.search(&HashMap::new()).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Beta", "Alpha"]);
    }

    #[test]
    fn test_search_by_text() {
        let c = catalog();
        let params = HashMap::from([("query".to_string(), "GRAMMAR".to_string())]);
        let found = c.search(&params);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Alpha");
    }

    #[test]
    fn test_update_keeps_id_and_extras() {
        let c = catalog();
        let patch = match json!({"id": "9", "type": "podcast", "title": "Alpha 2"}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let updated = c.update("1", patch).unwrap();
        assert_eq!(updated.id, "1");
        assert_eq!(updated.title, "Alpha 2");
        assert_eq!(updated.extra_str("type"), Some("podcast"));
    }

    #[test]
    fn test_missing_record_reports_kind() {
        let c = catalog();
        let err = c.get("404").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { kind: EntityKind::Document, .. }));
        assert!(c.delete("404").is_err());
    }
}
