use crate::fetch::error::FetchError;
use crate::locations::error::SeedError;
use crate::store::error::StoreError;
use crate::types::dataset::Dataset;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("No locations available for the {0} dataset")]
    NoLocations(Dataset),

    #[error("Every fetch for the {0} dataset failed; nothing to persist")]
    EmptySnapshot(Dataset),
}

impl CollectorError {
    /// Whether rerunning the dataset pipeline might help. A missing location
    /// list is a configuration problem and stays missing.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CollectorError::NoLocations(_))
    }
}
