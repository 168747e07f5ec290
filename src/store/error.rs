use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Query on collection '{collection}' failed")]
    Query {
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("Write to collection '{collection}' failed")]
    Write {
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to encode document for collection '{collection}': {detail}")]
    Encode { collection: String, detail: String },
}
