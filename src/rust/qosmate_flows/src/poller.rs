//! Drives the fetch/aggregate cycle on a fixed interval.
//!
//! The loop waits for each fetch to settle before it looks at the timer
//! again, so there is never more than one fetch outstanding and the
//! engine is only ever touched from the poller task. Ticks that fall due
//! while a slow fetch is running are skipped rather than queued.

use crate::{source::SnapshotSource, EnrichedFlow, FlowEngine, FlowError, FlowRecord};
use qosmate_utils::unix_time::unix_now_secs_f64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// What the poller publishes after every tick.
#[derive(Debug, Clone, Default)]
pub struct FlowSnapshot {
    /// Flows from the most recent successful poll
    pub flows: Arc<Vec<EnrichedFlow>>,
    /// Number of successful polls so far
    pub polls: u64,
    /// Number of failed polls so far
    pub failures: u64,
    /// Error from the most recent poll, cleared by the next success
    pub last_error: Option<String>,
}

pub struct Poller<S> {
    source: S,
    engine: FlowEngine,
    interval: Duration,
    updates: watch::Sender<FlowSnapshot>,
}

impl<S: SnapshotSource> Poller<S> {
    pub fn new(source: S, engine: FlowEngine, interval: Duration) -> (Self, watch::Receiver<FlowSnapshot>) {
        let (updates, rx) = watch::channel(FlowSnapshot::default());
        (
            Self {
                source,
                engine,
                interval,
                updates,
            },
            rx,
        )
    }

    /// Performs a single fetch and publishes the result.
    pub async fn poll_once(&mut self) {
        let fetched = self.source.fetch().await;
        self.apply(fetched);
    }

    fn apply(&mut self, fetched: Result<Vec<FlowRecord>, FlowError>) {
        let processed = fetched.and_then(|records| {
            let now = unix_now_secs_f64()?;
            Ok(Arc::new(self.engine.ingest(records, now).to_vec()))
        });

        match processed {
            Ok(flows) => self.updates.send_modify(|snapshot| {
                snapshot.flows = flows;
                snapshot.polls += 1;
                snapshot.last_error = None;
            }),
            Err(e) => {
                warn!("Flow poll failed, keeping the previous table: {e}");
                self.updates.send_modify(|snapshot| {
                    snapshot.failures += 1;
                    snapshot.last_error = Some(e.to_string());
                });
            }
        }
    }

    /// Polls until `shutdown` fires (or its sender is dropped), then hands
    /// back the engine. A fetch still in flight at that point is dropped
    /// and its result never applied.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> FlowEngine {
        info!("Flow poller started, polling every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            let fetched = tokio::select! {
                _ = &mut shutdown => break,
                fetched = self.source.fetch() => fetched,
            };
            self.apply(fetched);
        }
        info!("Flow poller stopped");
        self.engine
    }
}

/// A running poller task.
pub struct PollerHandle {
    updates: watch::Receiver<FlowSnapshot>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<FlowEngine>,
}

impl PollerHandle {
    /// A receiver that is notified after every poll.
    pub fn updates(&self) -> watch::Receiver<FlowSnapshot> {
        self.updates.clone()
    }

    /// Cancels the timer and any in-flight fetch, and waits for the task
    /// to finish. Dropping the handle also stops the poller.
    pub async fn stop(self) -> Option<FlowEngine> {
        let _ = self.shutdown.send(());
        self.task.await.ok()
    }
}

/// Spawns a poller on the current Tokio runtime.
pub fn spawn_poller<S: SnapshotSource>(source: S, engine: FlowEngine, interval: Duration) -> PollerHandle {
    let (poller, updates) = Poller::new(source, engine, interval);
    let (shutdown, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(poller.run(shutdown_rx));
    PollerHandle {
        updates,
        shutdown,
        task,
    }
}
