//! Windowed fetch types
//!
//! A `WindowRequest` is issued by the coordinator for every change of
//! dataset or offset and is never mutated afterwards. Its `generation`
//! decides whether the eventual response may still be applied.

use crate::ids::{DatasetId, Generation, RequestId};
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};

/// Records requested per window.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Offset step used by the next/previous affordances.
pub const DEFAULT_STEP: u64 = 7;

/// One issued window request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub dataset_id: DatasetId,
    pub limit: u32,
    pub offset: u64,
    pub generation: Generation,
    pub request_id: RequestId,
}

impl WindowRequest {
    pub fn new(dataset_id: DatasetId, limit: u32, offset: u64, generation: Generation) -> Self {
        assert!(limit > 0, "window limit must be positive");
        Self {
            dataset_id,
            limit,
            offset,
            generation,
            request_id: RequestId::new(),
        }
    }

    /// Wire body for the windowed-data endpoint.
    pub fn query(&self) -> WindowQuery {
        WindowQuery {
            selected_table: self.dataset_id.as_str().to_string(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// JSON body of `POST /HomeScreen`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowQuery {
    #[serde(rename = "selectedTable")]
    pub selected_table: String,
    pub limit: u32,
    pub offset: u64,
}

/// Successful result of a window fetch
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    /// The envelope carried at least one record.
    Records(Vec<RawRecord>),
    /// The envelope carried no data payload (or an empty one).
    Empty,
}

impl WindowOutcome {
    pub fn len(&self) -> usize {
        match self {
            WindowOutcome::Records(records) => records.len(),
            WindowOutcome::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wire_format() {
        let req = WindowRequest::new(DatasetId::new("AAPL"), 50, 14, Generation::new(3));
        let json = serde_json::to_value(req.query()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"selectedTable": "AAPL", "limit": 50, "offset": 14})
        );
    }

    #[test]
    #[should_panic(expected = "window limit must be positive")]
    fn test_zero_limit_rejected() {
        WindowRequest::new(DatasetId::new("AAPL"), 0, 0, Generation::new(1));
    }

    #[test]
    fn test_each_request_has_own_correlation_id() {
        let a = WindowRequest::new(DatasetId::new("AAPL"), 50, 0, Generation::new(1));
        let b = WindowRequest::new(DatasetId::new("AAPL"), 50, 0, Generation::new(1));
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_outcome_len() {
        assert!(WindowOutcome::Empty.is_empty());
        let outcome = WindowOutcome::Records(vec![RawRecord {
            trade_id: 1,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
            start_time: 0,
        }]);
        assert_eq!(outcome.len(), 1);
    }
}
