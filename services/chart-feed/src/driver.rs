//! Feed driver
//!
//! Owns the `ChartSession` and serializes every mutation through one event
//! loop. Commands arrive from `FeedHandle`s; every issued window request is
//! fetched on its own task and its response comes back through the loop,
//! where the session decides whether it is still current. Fetches are never
//! cancelled; superseded responses are simply discarded on arrival.
//!
//! Snapshots are published on a `watch` channel after every state change.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::ids::DatasetId;
use types::window::WindowRequest;

use crate::catalog::{load_catalog, Catalog, CatalogLoad};
use crate::config::{ConfigError, FeedConfig};
use crate::fetcher::{WindowFetcher, WindowResponse};
use crate::session::{Acceptance, ChartSession, ChartSnapshot, SessionStats};
use crate::source::ChartSource;

/// Operations accepted by the driver.
#[derive(Debug)]
pub enum Command {
    Select(DatasetId),
    /// Select even if already active: offset reset and refetch.
    ForceSelect(DatasetId),
    /// Refetch the current window.
    Refresh,
    StepForward(u64),
    StepBack(u64),
    Stats(oneshot::Sender<SessionStats>),
    Shutdown,
}

/// The driver task is gone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("feed driver has stopped")]
pub struct DriverClosed;

/// Client side of a running feed.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ChartSnapshot>,
    step: u64,
}

impl FeedHandle {
    pub async fn select(&self, id: DatasetId) -> Result<(), DriverClosed> {
        self.send(Command::Select(id)).await
    }

    pub async fn force_select(&self, id: DatasetId) -> Result<(), DriverClosed> {
        self.send(Command::ForceSelect(id)).await
    }

    pub async fn refresh(&self) -> Result<(), DriverClosed> {
        self.send(Command::Refresh).await
    }

    pub async fn step_forward(&self, step: u64) -> Result<(), DriverClosed> {
        self.send(Command::StepForward(step)).await
    }

    pub async fn step_back(&self, step: u64) -> Result<(), DriverClosed> {
        self.send(Command::StepBack(step)).await
    }

    /// Step forward by the configured step.
    pub async fn next_window(&self) -> Result<(), DriverClosed> {
        self.step_forward(self.step).await
    }

    /// Step back by the configured step.
    pub async fn previous_window(&self) -> Result<(), DriverClosed> {
        self.step_back(self.step).await
    }

    pub async fn stats(&self) -> Result<SessionStats, DriverClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stats(tx)).await?;
        rx.await.map_err(|_| DriverClosed)
    }

    pub async fn shutdown(&self) -> Result<(), DriverClosed> {
        self.send(Command::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ChartSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ChartSnapshot> {
        self.snapshots.clone()
    }

    async fn send(&self, command: Command) -> Result<(), DriverClosed> {
        self.commands.send(command).await.map_err(|_| DriverClosed)
    }
}

/// Event loop around one `ChartSession`.
pub struct FeedDriver<S: ?Sized> {
    session: ChartSession,
    catalog: Catalog,
    fetcher: WindowFetcher<S>,
    commands: mpsc::Receiver<Command>,
    responses_tx: mpsc::UnboundedSender<WindowResponse>,
    responses_rx: mpsc::UnboundedReceiver<WindowResponse>,
    snapshots: watch::Sender<ChartSnapshot>,
}

impl<S: ChartSource + ?Sized + 'static> FeedDriver<S> {
    /// Load the catalog, apply the initial selection and spawn the loop.
    ///
    /// Only an invalid `config` is an error. The catalog load itself never
    /// fails; an unavailable catalog leaves the feed idle with nothing
    /// selectable.
    pub async fn start(
        source: Arc<S>,
        config: &FeedConfig,
    ) -> Result<(CatalogLoad, FeedHandle, JoinHandle<()>), ConfigError> {
        config.validate()?;

        let load = load_catalog(source.as_ref()).await;
        let catalog = load.clone().into_catalog();

        let mut session = ChartSession::new(config.page_limit);
        let initial = catalog
            .initial_selection()
            .cloned()
            .and_then(|id| session.select(id));

        let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer);
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(session.snapshot());

        let mut driver = FeedDriver {
            session,
            catalog,
            fetcher: WindowFetcher::new(source),
            commands: commands_rx,
            responses_tx,
            responses_rx,
            snapshots: snapshots_tx,
        };
        if let Some(request) = initial {
            driver.dispatch(request);
        }

        let handle = FeedHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
            step: config.step,
        };
        let task = tokio::spawn(driver.run());
        Ok((load, handle, task))
    }

    async fn run(mut self) {
        info!(
            datasets = self.catalog.len(),
            limit = self.session.limit(),
            "Feed driver running"
        );
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(response) = self.responses_rx.recv() => self.handle_response(response),
            }
        }
        info!(stats = ?self.session.stats(), "Feed driver stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let request = match command {
            Command::Select(id) => {
                if !self.is_selectable(&id) {
                    return;
                }
                self.session.select(id)
            }
            Command::ForceSelect(id) => {
                if !self.is_selectable(&id) {
                    return;
                }
                Some(self.session.force_select(id))
            }
            Command::Refresh => self.session.refresh(),
            Command::StepForward(step) => self.session.step_forward(step),
            Command::StepBack(step) => self.session.step_back(step),
            Command::Stats(reply) => {
                let _ = reply.send(self.session.stats());
                None
            }
            Command::Shutdown => None,
        };

        if let Some(request) = request {
            self.dispatch(request);
            self.publish();
        }
    }

    fn is_selectable(&self, id: &DatasetId) -> bool {
        if self.catalog.contains(id) {
            return true;
        }
        warn!(dataset = %id, "Selection rejected: dataset not in catalog");
        false
    }

    fn handle_response(&mut self, response: WindowResponse) {
        match self.session.accept(response) {
            Acceptance::Stale {
                generation,
                current,
            } => {
                debug!(%generation, %current, "Stale response dropped");
            }
            _ => self.publish(),
        }
    }

    /// Run the fetch on its own task; the response re-enters the loop.
    fn dispatch(&self, request: WindowRequest) {
        let fetcher = self.fetcher.clone();
        let responses = self.responses_tx.clone();
        tokio::spawn(async move {
            let response = fetcher.fetch(request).await;
            let _ = responses.send(response);
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}
