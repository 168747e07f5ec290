use std::time::Duration;
use thiserror::Error;

/// Phrases the providers use in free-text rate limit messages.
const RATE_LIMIT_MARKERS: [&str; 3] = ["rate limit", "minutely", "too many requests"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Rate limited by {url}: {detail}")]
    RateLimited { url: String, detail: String },

    #[error("HTTP request failed for {url} with status {status}{}", detail_suffix(.detail))]
    Rejected {
        url: String,
        status: u16,
        detail: Option<String>,
    },

    #[error("Malformed response from {url}: {detail}")]
    Malformed { url: String, detail: String },

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Whether the provider is throttling us.
    ///
    /// The typed variant and HTTP 429 are authoritative. Matching the error
    /// text is a fallback for providers that report throttling with a 400
    /// and a prose reason; it breaks if they reword the message.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            FetchError::RateLimited { .. } => true,
            FetchError::Rejected { status: 429, .. } => true,
            other => mentions_rate_limit(&other.to_string()),
        }
    }

    /// Failures worth retrying for a per-location call: the remote never
    /// gave a definitive answer.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Rejected { .. })
    }

    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
}

/// Case-insensitive search for a rate limit phrase in provider text.
pub fn mentions_rate_limit(text: &str) -> bool {
    let text = text.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| text.contains(marker))
}
