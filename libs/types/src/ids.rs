//! Identifier types for the chart feed
//!
//! `DatasetId` names a selectable dataset in the remote catalog,
//! `Generation` is the monotonically increasing token attached to every
//! issued window request, and `RequestId` is a UUID v7 used to correlate
//! log lines for one request across the fetch task and the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Dataset identifier (remote table name)
///
/// Opaque to the feed; unique within a catalog. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    /// Create a new DatasetId from a string
    ///
    /// # Panics
    /// Panics if the name is empty or only whitespace
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        assert!(!s.trim().is_empty(), "DatasetId must not be empty");
        Self(s)
    }

    /// Try to create a DatasetId, returning None if the name is blank
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the dataset name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Request generation token
///
/// Strictly increasing per coordinator. `Generation::ZERO` is never issued;
/// it marks "nothing issued / nothing applied yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The token issued after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Correlation id for a single issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new RequestId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
