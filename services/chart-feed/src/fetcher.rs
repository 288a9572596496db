//! Window Fetcher
//!
//! Sends one `WindowRequest` to the windowed-data endpoint and interprets
//! the response envelope. The request travels back with the outcome so the
//! session can compare its generation against the latest issued one.
//!
//! Envelope rules:
//! - `data` array with rows → records
//! - `data` missing, null or empty → empty window (not a failure), unless
//!   the status is 5xx
//! - body not a JSON object, or rows that do not parse → decode failure

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use types::errors::FeedError;
use types::record::RawRecord;
use types::window::{WindowOutcome, WindowRequest};

use crate::catalog::error_message;
use crate::source::{ChartSource, RawResponse};

/// What became of one window fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Records(Vec<RawRecord>),
    Empty,
    Failed(FeedError),
}

impl From<Result<WindowOutcome, FeedError>> for FetchOutcome {
    fn from(result: Result<WindowOutcome, FeedError>) -> Self {
        match result {
            Ok(WindowOutcome::Records(records)) => FetchOutcome::Records(records),
            Ok(WindowOutcome::Empty) => FetchOutcome::Empty,
            Err(err) => FetchOutcome::Failed(err),
        }
    }
}

/// A completed fetch, tagged with the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowResponse {
    pub request: WindowRequest,
    pub outcome: FetchOutcome,
    pub elapsed: Duration,
}

/// Issues window requests against a `ChartSource`.
pub struct WindowFetcher<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> Clone for WindowFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: ChartSource + ?Sized> WindowFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Fetch one window. Never fails outward; failures are an outcome.
    pub async fn fetch(&self, request: WindowRequest) -> WindowResponse {
        let started = Instant::now();
        let result = match self.source.window(&request.query()).await {
            Ok(response) => parse_envelope(&response),
            Err(err) => Err(err),
        };
        let elapsed = started.elapsed();

        match &result {
            Ok(outcome) => debug!(
                request_id = %request.request_id,
                generation = %request.generation,
                dataset = %request.dataset_id,
                offset = request.offset,
                records = outcome.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Window fetched"
            ),
            Err(err) => warn!(
                request_id = %request.request_id,
                generation = %request.generation,
                dataset = %request.dataset_id,
                offset = request.offset,
                error = %err,
                "Window fetch failed"
            ),
        }

        WindowResponse {
            request,
            outcome: result.into(),
            elapsed,
        }
    }
}

/// Interpret a windowed-data response body.
pub fn parse_envelope(response: &RawResponse) -> Result<WindowOutcome, FeedError> {
    let body: Value = match serde_json::from_slice(&response.body) {
        Ok(body) => body,
        Err(_) if response.is_server_error() => {
            return Err(FeedError::Server {
                status: response.status,
                message: error_message(&response.body),
            })
        }
        Err(e) => return Err(FeedError::Decode(format!("window body is not JSON: {}", e))),
    };

    let envelope = body
        .as_object()
        .ok_or_else(|| FeedError::Decode("window envelope is not a JSON object".to_string()))?;

    match envelope.get("data") {
        None | Some(Value::Null) => {
            if response.is_server_error() {
                Err(FeedError::Server {
                    status: response.status,
                    message: error_message(&response.body),
                })
            } else {
                Ok(WindowOutcome::Empty)
            }
        }
        Some(data) => {
            let records = Vec::<RawRecord>::deserialize(data)
                .map_err(|e| FeedError::Decode(format!("malformed window rows: {}", e)))?;
            if records.is_empty() {
                Ok(WindowOutcome::Empty)
            } else {
                Ok(WindowOutcome::Records(records))
            }
        }
    }
}
