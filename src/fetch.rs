pub mod batch_executor;
pub mod bmkg;
pub mod concurrent_executor;
pub mod error;
pub mod open_meteo;

use error::FetchError;

/// Maps a transport error to the fetch taxonomy, keeping timeouts distinct.
pub(crate) fn request_error(url: &str, timeout: std::time::Duration, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            after: timeout,
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: err,
        }
    }
}
