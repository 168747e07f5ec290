use crate::store::document::{Document, Filter, FindQuery};
use crate::store::error::StoreError;
use crate::store::DocumentStore;
use futures_util::TryStreamExt;
use log::debug;
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::{Client, Collection, Database};
use serde_json::Value;

/// MongoDB-backed store. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        debug!("Connected to MongoDB database '{}'", database);
        Ok(Self {
            database: client.database(database),
        })
    }

    /// Round-trips a ping so a bad URI fails at startup rather than mid-cycle.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection::<BsonDocument>(name)
    }
}

fn encode(collection: &str, document: &Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(document).map_err(|e| StoreError::Encode {
        collection: collection.to_string(),
        detail: e.to_string(),
    })
}

fn decode(document: BsonDocument) -> Document {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn encode_filter(collection: &str, filter: &Filter) -> Result<BsonDocument, StoreError> {
    let mut encoded = BsonDocument::new();
    match filter {
        Filter::All => {}
        Filter::Eq(path, value) => {
            let value = bson::to_bson(value).map_err(|e| StoreError::Encode {
                collection: collection.to_string(),
                detail: e.to_string(),
            })?;
            encoded.insert(path.clone(), value);
        }
        Filter::Ne(path, value) => {
            let value = bson::to_bson(value).map_err(|e| StoreError::Encode {
                collection: collection.to_string(),
                detail: e.to_string(),
            })?;
            encoded.insert(path.clone(), doc! { "$ne": value });
        }
        Filter::Exists(path) => {
            encoded.insert(path.clone(), doc! { "$exists": true, "$ne": Bson::Null });
        }
    }
    Ok(encoded)
}

fn query_error(collection: &str, source: mongodb::error::Error) -> StoreError {
    StoreError::Query {
        collection: collection.to_string(),
        source: Box::new(source),
    }
}

fn write_error(collection: &str, source: mongodb::error::Error) -> StoreError {
    StoreError::Write {
        collection: collection.to_string(),
        source: Box::new(source),
    }
}

impl DocumentStore for MongoStore {
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let filter = encode_filter(collection, &query.filter)?;
        let handle = self.collection(collection);
        let mut action = handle.find(filter).projection(doc! { "_id": 0 });
        if let Some((path, order)) = &query.sort {
            let mut sort = BsonDocument::new();
            sort.insert(path.clone(), order.direction());
            action = action.sort(sort);
        }
        if let Some(limit) = query.limit {
            action = action.limit(limit as i64);
        }

        let cursor = action.await.map_err(|e| query_error(collection, e))?;
        let documents: Vec<BsonDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| query_error(collection, e))?;
        Ok(documents.into_iter().map(decode).collect())
    }

    async fn upsert(&self, collection: &str, filter: &Filter, document: Document) -> Result<(), StoreError> {
        let filter = encode_filter(collection, filter)?;
        let update = doc! { "$set": encode(collection, &document)? };
        self.collection(collection)
            .update_one(filter, update)
            .upsert(true)
            .await
            .map(|_| ())
            .map_err(|e| write_error(collection, e))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let filter = encode_filter(collection, filter)?;
        self.collection(collection)
            .delete_many(filter)
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| write_error(collection, e))
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<u64, StoreError> {
        // MongoDB refuses an empty batch.
        if documents.is_empty() {
            return Ok(0);
        }
        let encoded = documents
            .iter()
            .map(|d| encode(collection, d))
            .collect::<Result<Vec<_>, _>>()?;
        self.collection(collection)
            .insert_many(encoded)
            .await
            .map(|result| result.inserted_ids.len() as u64)
            .map_err(|e| write_error(collection, e))
    }
}
