use crate::types::dataset::Dataset;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse seed file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Unexpected layout in seed file '{path}': {detail}")]
    Format { path: PathBuf, detail: String },

    #[error("No seed data for the {0} dataset")]
    Unsupported(Dataset),
}
