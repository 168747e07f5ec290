pub mod document;
pub mod error;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

use document::{Document, Filter, FindQuery};
use error::StoreError;
use std::future::Future;

/// Collection-oriented document storage.
///
/// Backends hand documents back without any backend-specific identifier
/// fields.
pub trait DocumentStore: Send + Sync + Clone {
    fn find(
        &self,
        collection: &str,
        query: &FindQuery,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Merges `document` into the first document matching `filter`, or inserts
    /// it when nothing matches. Top-level fields of `document` replace existing
    /// ones; other fields are kept.
    fn upsert(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
