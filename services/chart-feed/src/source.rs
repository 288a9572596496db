//! Remote service transport
//!
//! `ChartSource` is the seam between the pipeline and the network: it moves
//! bytes and status codes, nothing more. Envelope interpretation lives in
//! the catalog loader and the window fetcher so both can be exercised
//! against scripted sources.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use types::errors::FeedError;
use types::window::WindowQuery;

use crate::config::FeedConfig;

/// Catalog endpoint.
pub const CATALOG_PATH: &str = "/dropdown-options";
/// Windowed-data endpoint.
pub const WINDOW_PATH: &str = "/HomeScreen";
/// Login endpoint (account collaborator).
pub const LOGIN_PATH: &str = "/login";
/// Account creation endpoint (account collaborator).
pub const CREATE_ACCOUNT_PATH: &str = "/create-account";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response carrying a serialized JSON value.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Transport to the remote chart data service.
#[async_trait]
pub trait ChartSource: Send + Sync {
    /// `GET /dropdown-options`
    async fn catalog(&self) -> Result<RawResponse, FeedError>;

    /// `POST /HomeScreen`
    async fn window(&self, query: &WindowQuery) -> Result<RawResponse, FeedError>;
}

/// `ChartSource` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChartSource {
    client: Client,
    catalog_url: String,
    window_url: String,
}

impl HttpChartSource {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(config)?,
            catalog_url: config.endpoint(CATALOG_PATH),
            window_url: config.endpoint(WINDOW_PATH),
        })
    }
}

#[async_trait]
impl ChartSource for HttpChartSource {
    async fn catalog(&self) -> Result<RawResponse, FeedError> {
        debug!(url = %self.catalog_url, "GET catalog");
        let res = self
            .client
            .get(&self.catalog_url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(format!("catalog request failed: {}", e)))?;
        read_response(res).await
    }

    async fn window(&self, query: &WindowQuery) -> Result<RawResponse, FeedError> {
        debug!(
            url = %self.window_url,
            dataset = %query.selected_table,
            limit = query.limit,
            offset = query.offset,
            "POST window"
        );
        post_json(&self.client, &self.window_url, query).await
    }
}

/// HTTP client honoring the configured timeout.
pub(crate) fn build_client(config: &FeedConfig) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| FeedError::Transport(format!("failed to build HTTP client: {}", e)))
}

pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
) -> Result<RawResponse, FeedError> {
    let res = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| FeedError::Transport(format!("POST {} failed: {}", url, e)))?;
    read_response(res).await
}

async fn read_response(res: reqwest::Response) -> Result<RawResponse, FeedError> {
    let status = res.status().as_u16();
    let body = res
        .bytes()
        .await
        .map_err(|e| FeedError::Transport(format!("failed to read response body: {}", e)))?;
    Ok(RawResponse::new(status, body.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_status_classes() {
        assert!(RawResponse::new(200, "{}").is_success());
        assert!(!RawResponse::new(404, "{}").is_success());
        assert!(!RawResponse::new(404, "{}").is_server_error());
        assert!(RawResponse::new(503, "").is_server_error());
    }

    #[test]
    fn test_raw_response_json() {
        let res = RawResponse::json(200, &serde_json::json!({"data": []}));
        assert_eq!(res.body, br#"{"data":[]}"#.to_vec());
    }

    #[test]
    fn test_http_source_urls() {
        let config = FeedConfig {
            base_url: "http://10.118.131.151:5001".into(),
            ..FeedConfig::default()
        };
        let source = HttpChartSource::new(&config).unwrap();
        assert_eq!(source.catalog_url, "http://10.118.131.151:5001/dropdown-options");
        assert_eq!(source.window_url, "http://10.118.131.151:5001/HomeScreen");
    }
}
