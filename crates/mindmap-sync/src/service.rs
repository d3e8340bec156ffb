//! Running a coordinator in the background
//!
//! ```text
//!  poll ticker ─────┐
//!  autosave ticker ─┼──▶ mpsc command queue ──▶ actor (owns Coordinator)
//!  SyncHandle ──────┘
//! ```
//!
//! The actor handles one command at a time, so a save, an autosave and a
//! reconciliation never interleave. All three tasks stop on one
//! cancellation token.

use std::sync::Arc;

use mindmap_tree::Tree;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::coordinator::{Coordinator, Phase, PollOutcome};
use crate::error::{Error, Result};
use crate::handle::FileHandle;
use crate::notify::Notifier;

const QUEUE_CAPACITY: usize = 32;

type Mutation = Box<dyn FnOnce(Tree) -> Tree + Send>;

enum Command {
    Edit(Mutation, oneshot::Sender<bool>),
    Open(Arc<dyn FileHandle>, oneshot::Sender<Result<()>>),
    Save(oneshot::Sender<Result<()>>),
    AutoSave(Option<oneshot::Sender<Result<bool>>>),
    Poll(Option<oneshot::Sender<Result<PollOutcome>>>),
    Restore(String, oneshot::Sender<Result<()>>),
    State(oneshot::Sender<SyncState>),
}

/// A point-in-time copy of the coordinator's state.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub tree: Tree,
    pub dirty: bool,
    pub phase: Phase,
    pub last_saved: i64,
    pub file_name: Option<String>,
}

/// Cloneable client for a running [`SyncService`].
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<Command>,
    notifier: Notifier,
}

impl SyncHandle {
    /// Apply a tree mutation; resolves to whether the tree changed.
    pub async fn edit<F>(&self, mutation: F) -> Result<bool>
    where
        F: FnOnce(Tree) -> Tree + Send + 'static,
    {
        self.request(|reply| Command::Edit(Box::new(mutation), reply)).await
    }

    pub async fn open(&self, handle: Arc<dyn FileHandle>) -> Result<()> {
        self.request(|reply| Command::Open(handle, reply)).await?
    }

    pub async fn save(&self) -> Result<()> {
        self.request(Command::Save).await?
    }

    pub async fn auto_save(&self) -> Result<bool> {
        self.request(|reply| Command::AutoSave(Some(reply))).await?
    }

    pub async fn poll(&self) -> Result<PollOutcome> {
        self.request(|reply| Command::Poll(Some(reply))).await?
    }

    pub async fn restore_version(&self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        self.request(|reply| Command::Restore(id, reply)).await?
    }

    pub async fn state(&self) -> Result<SyncState> {
        self.request(Command::State).await
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| Error::Closed)?;
        response.await.map_err(|_| Error::Closed)
    }
}

/// A coordinator running behind a command queue with poll and autosave
/// tickers.
pub struct SyncService {
    handle: SyncHandle,
    cancel: CancellationToken,
    actor: JoinHandle<Coordinator>,
    tickers: Vec<JoinHandle<()>>,
}

impl SyncService {
    /// Spawn the actor and both tickers on the current runtime. The first
    /// poll runs immediately; the first autosave after one full period.
    pub fn start(coordinator: Coordinator, settings: &Settings) -> Self {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let notifier = coordinator.notifier().clone();

        let actor = tokio::spawn(run_actor(coordinator, rx, cancel.clone()));

        let poll_period = settings.poll_interval();
        let autosave_period = settings.autosave_interval();
        let tickers = vec![
            tokio::spawn(run_ticker(
                "poll",
                Instant::now(),
                poll_period,
                tx.clone(),
                cancel.clone(),
                || Command::Poll(None),
            )),
            tokio::spawn(run_ticker(
                "autosave",
                Instant::now() + autosave_period,
                autosave_period,
                tx.clone(),
                cancel.clone(),
                || Command::AutoSave(None),
            )),
        ];
        info!(
            poll_secs = poll_period.as_secs(),
            autosave_secs = autosave_period.as_secs(),
            "Sync service started"
        );

        Self {
            handle: SyncHandle { tx, notifier },
            cancel,
            actor,
            tickers,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    /// Stop every task and hand the coordinator back.
    pub async fn shutdown(self) -> Result<Coordinator> {
        self.cancel.cancel();
        for ticker in self.tickers {
            if let Err(e) = ticker.await {
                warn!(error = %e, "Ticker task failed");
            }
        }
        let coordinator = self
            .actor
            .await
            .map_err(|e| Error::handle("sync service", e))?;
        info!("Sync service stopped");
        Ok(coordinator)
    }
}

async fn run_actor(
    mut coordinator: Coordinator,
    mut rx: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) -> Coordinator {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Sync actor cancelled");
                break;
            }
            command = rx.recv() => {
                let Some(command) = command else {
                    debug!("Sync actor exiting: all handles dropped");
                    break;
                };
                handle_command(&mut coordinator, command).await;
            }
        }
    }
    coordinator
}

async fn handle_command(coordinator: &mut Coordinator, command: Command) {
    match command {
        Command::Edit(mutation, reply) => {
            let _ = reply.send(coordinator.edit(mutation));
        }
        Command::Open(handle, reply) => {
            let _ = reply.send(coordinator.open(handle).await);
        }
        Command::Save(reply) => {
            let _ = reply.send(coordinator.save().await);
        }
        Command::AutoSave(reply) => {
            let result = coordinator.auto_save().await;
            match reply {
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => {
                    if let Err(e) = result {
                        warn!(error = %e, "Autosave failed");
                    }
                }
            }
        }
        Command::Poll(reply) => {
            let result = coordinator.poll().await;
            match reply {
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => match result {
                    Ok(outcome) => debug!(?outcome, "Poll finished"),
                    Err(e) => warn!(error = %e, "Poll failed; retrying next tick"),
                },
            }
        }
        Command::Restore(id, reply) => {
            let _ = reply.send(coordinator.restore_version(&id));
        }
        Command::State(reply) => {
            let _ = reply.send(SyncState {
                tree: coordinator.tree().clone(),
                dirty: coordinator.is_dirty(),
                phase: coordinator.phase(),
                last_saved: coordinator.last_saved(),
                file_name: coordinator.file_name(),
            });
        }
    }
}

async fn run_ticker(
    name: &'static str,
    start: Instant,
    period: std::time::Duration,
    tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
    command: fn() -> Command,
) {
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(ticker = name, "Ticker cancelled");
                break;
            }
            _ = ticker.tick() => {
                if tx.send(command()).await.is_err() {
                    debug!(ticker = name, "Ticker exiting: queue closed");
                    break;
                }
            }
        }
    }
}
