use crate::fetch::error::FetchError;
use crate::fetch::request_error;
use crate::types::outcome::PortForecast;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_BMKG_PORT_URL: &str = "https://maritim.bmkg.go.id/api/pelabuhan";

/// The BMKG endpoints turn away requests without a browser-like agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// A remote service answered once per port.
pub trait PortWeatherApi: Send + Sync + Clone {
    /// Forecast for the port identified by `slug`. A non-2xx answer is
    /// `FetchError::Rejected`.
    fn fetch_port(&self, slug: &str) -> impl Future<Output = Result<PortForecast, FetchError>> + Send;

    /// Raw port catalog, or `None` when no catalog source is configured.
    fn fetch_catalog(&self) -> impl Future<Output = Result<Option<Value>, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct BmkgPortClient {
    client: Client,
    port_url: String,
    catalog_url: Option<String>,
    timeout: Duration,
}

impl BmkgPortClient {
    pub fn new(port_url: &str, catalog_url: Option<&str>, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            port_url: port_url.to_string(),
            catalog_url: catalog_url.map(str::to_string),
            timeout,
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| request_error(url, self.timeout, e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(status) => FetchError::Rejected {
                        url: url.to_string(),
                        status: status.as_u16(),
                        detail: status.canonical_reason().map(str::to_string),
                    },
                    None => request_error(url, self.timeout, e),
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| request_error(url, self.timeout, e))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }
}

impl PortWeatherApi for BmkgPortClient {
    async fn fetch_port(&self, slug: &str) -> Result<PortForecast, FetchError> {
        debug!("Fetching port forecast for '{}'", slug);
        let body = self.get_json(&self.port_url, &[("slug", slug)]).await?;
        Ok(forecast_from_body(body))
    }

    async fn fetch_catalog(&self) -> Result<Option<Value>, FetchError> {
        let Some(url) = &self.catalog_url else {
            return Ok(None);
        };
        info!("Downloading port catalog from {}", url);
        self.get_json(url, &[]).await.map(Some)
    }
}

/// Wraps a port response body, lifting out the reported harbour name.
pub fn forecast_from_body(body: Value) -> PortForecast {
    let name = body
        .get("pelabuhan")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    PortForecast { name, body }
}
