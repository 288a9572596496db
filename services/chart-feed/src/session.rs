//! Selection Coordinator and session state
//!
//! `ChartSession` is the single state record of the feed: active dataset,
//! window offset, generation counters and the last rendered points. Every
//! change of dataset or offset issues a new `WindowRequest` with the next
//! generation; `accept` applies a response only if it carries the latest
//! issued generation for the active dataset. Last issued wins, not last
//! arrived.
//!
//! The session performs no I/O. The driver runs the returned requests and
//! feeds the responses back through `accept`.

use std::sync::Arc;

use tracing::{debug, info, warn};
use types::errors::FeedError;
use types::ids::{DatasetId, Generation};
use types::record::NormalizedPoint;
use types::window::WindowRequest;

use crate::fetcher::{FetchOutcome, WindowResponse};
use crate::normalizer::normalize;
use crate::offset::OffsetController;

/// What the render sink should show alongside the points.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    /// Nothing selected.
    Idle,
    /// A request is in flight for the current dataset and offset.
    Loading,
    /// The latest request returned rows.
    Ready,
    /// The latest request returned an empty window.
    NoData,
    /// The latest request failed; points from earlier fetches are kept.
    Failed(String),
}

/// Response counters since the session started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub issued: u64,
    pub applied: u64,
    pub empty: u64,
    pub failed: u64,
    /// Responses discarded because a newer request had been issued.
    pub stale: u64,
}

/// Read-only view of the session for the render sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub dataset: Option<DatasetId>,
    pub offset: u64,
    pub limit: u32,
    pub status: FeedStatus,
    /// Chronologically ascending.
    pub points: Arc<[NormalizedPoint]>,
    /// Generation of the last applied response.
    pub generation: Generation,
    pub stats: SessionStats,
}

impl ChartSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == FeedStatus::Loading
    }
}

/// Result of offering a response to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Acceptance {
    /// Points replaced.
    Applied { points: usize },
    /// Empty window; previous points kept.
    NoData,
    /// Fetch failed; previous points kept.
    Failed(FeedError),
    /// Superseded by a newer request; nothing changed.
    Stale {
        generation: Generation,
        current: Generation,
    },
}

/// Coordinator state for one chart.
#[derive(Debug)]
pub struct ChartSession {
    active: Option<DatasetId>,
    offset: OffsetController,
    limit: u32,
    /// Highest generation issued.
    issued: Generation,
    /// Generation of the last response applied.
    applied: Generation,
    points: Arc<[NormalizedPoint]>,
    status: FeedStatus,
    stats: SessionStats,
}

impl ChartSession {
    pub fn new(limit: u32) -> Self {
        assert!(limit > 0, "window limit must be positive");
        Self {
            active: None,
            offset: OffsetController::new(),
            limit,
            issued: Generation::ZERO,
            applied: Generation::ZERO,
            points: Arc::from(Vec::new()),
            status: FeedStatus::Idle,
            stats: SessionStats::default(),
        }
    }

    pub fn active(&self) -> Option<&DatasetId> {
        self.active.as_ref()
    }

    pub fn offset(&self) -> u64 {
        self.offset.offset()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn issued(&self) -> Generation {
        self.issued
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Make `id` the active dataset at offset 0.
    ///
    /// Selecting the dataset that is already active is a no-op.
    pub fn select(&mut self, id: DatasetId) -> Option<WindowRequest> {
        if self.active.as_ref() == Some(&id) {
            debug!(dataset = %id, "Dataset already active");
            return None;
        }
        Some(self.force_select(id))
    }

    /// Like `select`, but always resets and refetches.
    pub fn force_select(&mut self, id: DatasetId) -> WindowRequest {
        info!(
            dataset = %id,
            previous = ?self.active.as_ref().map(DatasetId::as_str),
            "Dataset selected"
        );
        if self.active.as_ref() != Some(&id) {
            self.points = Arc::from(Vec::new());
        }
        self.active = Some(id.clone());
        self.offset.reset();
        self.issue(id)
    }

    /// Refetch the current window of the active dataset.
    pub fn refresh(&mut self) -> Option<WindowRequest> {
        let Some(dataset) = self.active.clone() else {
            debug!("Refresh ignored: no dataset selected");
            return None;
        };
        Some(self.issue(dataset))
    }

    /// Advance the offset; issues a request only if it changed.
    pub fn step_forward(&mut self, step: u64) -> Option<WindowRequest> {
        let Some(dataset) = self.active.clone() else {
            debug!(step, "Step ignored: no dataset selected");
            return None;
        };
        if self.offset.step_forward(step) {
            Some(self.issue(dataset))
        } else {
            None
        }
    }

    /// Move the offset back, clamped at zero; issues a request only if it
    /// changed.
    pub fn step_back(&mut self, step: u64) -> Option<WindowRequest> {
        let Some(dataset) = self.active.clone() else {
            debug!(step, "Step ignored: no dataset selected");
            return None;
        };
        if self.offset.step_back(step) {
            Some(self.issue(dataset))
        } else {
            None
        }
    }

    fn issue(&mut self, dataset: DatasetId) -> WindowRequest {
        self.issued = self.issued.next();
        self.status = FeedStatus::Loading;
        self.stats.issued += 1;

        let request = WindowRequest::new(dataset, self.limit, self.offset.offset(), self.issued);
        debug!(
            request_id = %request.request_id,
            generation = %request.generation,
            dataset = %request.dataset_id,
            offset = request.offset,
            limit = request.limit,
            "Window request issued"
        );
        request
    }

    /// Apply a completed fetch if it is still current.
    pub fn accept(&mut self, response: WindowResponse) -> Acceptance {
        let request = &response.request;
        let current = request.generation == self.issued
            && request.generation > self.applied
            && self.active.as_ref() == Some(&request.dataset_id);

        if !current {
            self.stats.stale += 1;
            debug!(
                request_id = %request.request_id,
                generation = %request.generation,
                current = %self.issued,
                dataset = %request.dataset_id,
                offset = request.offset,
                "Discarding superseded window response"
            );
            return Acceptance::Stale {
                generation: request.generation,
                current: self.issued,
            };
        }

        self.applied = request.generation;
        match response.outcome {
            FetchOutcome::Records(records) => {
                let points = normalize(&records);
                let count = points.len();
                self.points = Arc::from(points);
                self.status = FeedStatus::Ready;
                self.stats.applied += 1;
                info!(
                    generation = %self.applied,
                    dataset = %request.dataset_id,
                    offset = request.offset,
                    points = count,
                    "Window applied"
                );
                Acceptance::Applied { points: count }
            }
            FetchOutcome::Empty => {
                self.status = FeedStatus::NoData;
                self.stats.empty += 1;
                info!(
                    generation = %self.applied,
                    dataset = %request.dataset_id,
                    offset = request.offset,
                    "Window empty"
                );
                Acceptance::NoData
            }
            FetchOutcome::Failed(err) => {
                self.status = FeedStatus::Failed(err.to_string());
                self.stats.failed += 1;
                warn!(
                    generation = %self.applied,
                    dataset = %request.dataset_id,
                    offset = request.offset,
                    error = %err,
                    "Window fetch failed; keeping previous points"
                );
                Acceptance::Failed(err)
            }
        }
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            dataset: self.active.clone(),
            offset: self.offset.offset(),
            limit: self.limit,
            status: self.status.clone(),
            points: Arc::clone(&self.points),
            generation: self.applied,
            stats: self.stats,
        }
    }
}
