//! Flat-file JSON document store.
//!
//! The whole document lives in memory behind a `RwLock`. When the store was
//! opened from a file, every mutation rewrites that file while the write lock
//! is held, and only a successful write is applied in memory.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

type Document = Map<String, Value>;

pub struct JsonStore {
    path: Option<PathBuf>,
    doc: RwLock<Document>,
}

impl JsonStore {
    /// Load the document at `path`. A missing file starts an empty store that
    /// will be created on the first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref().to_path_buf();

        let doc = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_document(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "database file not found, starting empty");
                Document::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), collections = doc.len(), "loaded database");

        Ok(Self {
            path: Some(path),
            doc: RwLock::new(doc),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory(doc: Value) -> Result<Self, ApiError> {
        match doc {
            Value::Object(doc) => Ok(Self {
                path: None,
                doc: RwLock::new(doc),
            }),
            _ => Err(ApiError::BadRequest("database root must be an object".into())),
        }
    }

    /// Names of the top-level array collections.
    pub async fn collections(&self) -> Vec<String> {
        self.doc
            .read()
            .await
            .iter()
            .filter(|(_, v)| v.is_array())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub async fn list(&self, collection: &str) -> Result<Vec<Value>, ApiError> {
        let doc = self.doc.read().await;
        Ok(rows(&doc, collection)?.clone())
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Value, ApiError> {
        let doc = self.doc.read().await;
        rows(&doc, collection)?
            .iter()
            .find(|row| field_matches(row, "id", id))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(entity_label(collection)))
    }

    /// First row whose `field` equals `value` (ids compared as strings).
    pub async fn find_by(&self, collection: &str, field: &str, value: &str) -> Result<Option<Value>, ApiError> {
        let doc = self.doc.read().await;
        Ok(rows(&doc, collection)?
            .iter()
            .find(|row| field_matches(row, field, value))
            .cloned())
    }

    pub async fn filter_by(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Value>, ApiError> {
        let doc = self.doc.read().await;
        Ok(rows(&doc, collection)?
            .iter()
            .filter(|row| field_matches(row, field, value))
            .cloned()
            .collect())
    }

    /// Append a row, assigning a fresh id when the payload has none.
    pub async fn insert(&self, collection: &str, payload: Value) -> Result<Value, ApiError> {
        let mut row = into_object(payload)?;
        if !row.contains_key("id") {
            row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        let row = Value::Object(row);

        self.commit(|doc| {
            rows_mut(doc, collection)?.push(row.clone());
            Ok(row)
        })
        .await
    }

    /// Replace a row wholesale; the stored id always wins.
    pub async fn replace(&self, collection: &str, id: &str, payload: Value) -> Result<Value, ApiError> {
        let mut replacement = into_object(payload)?;

        self.commit(|doc| {
            let row = find_mut(doc, collection, id)?;
            if let Some(existing_id) = row.get("id").cloned() {
                replacement.insert("id".into(), existing_id);
            }
            *row = Value::Object(replacement);
            Ok(row.clone())
        })
        .await
    }

    /// Shallow-merge the payload's fields into a row; the id is immutable.
    pub async fn patch(&self, collection: &str, id: &str, payload: Value) -> Result<Value, ApiError> {
        let changes = into_object(payload)?;

        self.commit(|doc| {
            let row = find_mut(doc, collection, id)?;
            if let Value::Object(fields) = row {
                for (key, value) in changes {
                    if key != "id" {
                        fields.insert(key, value);
                    }
                }
            }
            Ok(row.clone())
        })
        .await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), ApiError> {
        self.commit(|doc| {
            let rows = rows_mut(doc, collection)?;
            let index = rows
                .iter()
                .position(|row| field_matches(row, "id", id))
                .ok_or_else(|| ApiError::NotFound(entity_label(collection)))?;
            rows.remove(index);
            Ok(())
        })
        .await
    }

    /// Apply `change` to a copy of the document, persist the copy, then swap
    /// it in. A failed change or write leaves the live document untouched.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Document) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut doc = self.doc.write().await;
        let mut next = doc.clone();
        let output = change(&mut next)?;
        self.persist(&next).await?;
        *doc = next;
        Ok(output)
    }

    async fn persist(&self, doc: &Document) -> Result<(), ApiError> {
        if let Some(path) = &self.path {
            let raw = serde_json::to_string_pretty(doc)?;
            tokio::fs::write(path, raw).await?;
        }
        Ok(())
    }
}

fn parse_document(raw: &str) -> Result<Document, ApiError> {
    match serde_json::from_str(raw)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(ApiError::BadRequest("database root must be an object".into())),
    }
}

fn into_object(payload: Value) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Value::Object(fields) => Ok(fields),
        _ => Err(ApiError::BadRequest("body must be a JSON object".into())),
    }
}

fn rows<'a>(doc: &'a Document, collection: &str) -> Result<&'a Vec<Value>, ApiError> {
    doc.get(collection)
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::NotFound(entity_label(collection)))
}

fn rows_mut<'a>(doc: &'a mut Document, collection: &str) -> Result<&'a mut Vec<Value>, ApiError> {
    doc.get_mut(collection)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| ApiError::NotFound(entity_label(collection)))
}

fn find_mut<'a>(doc: &'a mut Document, collection: &str, id: &str) -> Result<&'a mut Value, ApiError> {
    rows_mut(doc, collection)?
        .iter_mut()
        .find(|row| field_matches(row, "id", id))
        .ok_or_else(|| ApiError::NotFound(entity_label(collection)))
}

/// Compare a row field against a path value; numbers and strings are
/// compared by their textual form so `1` matches `"1"`.
fn field_matches(row: &Value, field: &str, expected: &str) -> bool {
    match row.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

/// `users` -> `User`, `meeting_types` -> `Meeting type`, `availability` -> `Availability`.
pub fn entity_label(collection: &str) -> String {
    let singular = collection.strip_suffix('s').unwrap_or(collection);
    let spaced = singular.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Resource".to_string(),
    }
}
