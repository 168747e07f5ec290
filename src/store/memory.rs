use crate::store::document::{compare_values, get_path, Document, Filter, FindQuery, SortOrder};
use crate::store::error::StoreError;
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-process document store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Document>>> {
        // Writes never leave a collection half-updated, so a poisoned lock is safe to reuse.
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock();
        let mut found: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| query.filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        if let Some((path, order)) = &query.sort {
            found.sort_by(|a, b| {
                let ordering = match (get_path(a, path), get_path(b, path)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn upsert(&self, collection: &str, filter: &Filter, document: Document) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(existing) => {
                for (key, value) in document {
                    existing.insert(key, value);
                }
            }
            None => {
                let mut inserted = document;
                // Top-level equality keys become part of the new document.
                if let Filter::Eq(path, value) = filter {
                    if !path.contains('.') && !inserted.contains_key(path) {
                        inserted.insert(path.clone(), value.clone());
                    }
                }
                docs.push(inserted);
            }
        }
        Ok(())
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.lock();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<u64, StoreError> {
        let count = documents.len() as u64;
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(count)
    }
}
