//! Edge-triggered polling of the operator's run switch.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::cycle::{CycleReport, CycleRunner};
use crate::error::{CycleError, StoreError};
use crate::store::{RunState, Store};

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Switch flipped off to on: run one cycle.
    Activated,
    Deactivated,
    Unchanged,
}

pub struct RunStateMonitor {
    store: Arc<dyn Store>,
    runner: CycleRunner,
    poll_interval: Duration,
    /// Switch value seen on the previous poll; false until the first `true` reading.
    was_running: bool,
}

impl RunStateMonitor {
    pub fn new(store: Arc<dyn Store>, runner: CycleRunner, poll_interval: Duration) -> Self {
        RunStateMonitor {
            store,
            runner,
            poll_interval,
            was_running: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.was_running
    }

    /// Fold one switch reading into the remembered state.
    ///
    /// A failed read counts as "not running", so the next `true` reading
    /// activates again rather than being missed.
    pub fn observe(&mut self, reading: Result<RunState, StoreError>) -> Transition {
        let now_running = match reading {
            Ok(state) => state.is_running,
            Err(err) => {
                warn!("Failed to read run state, assuming stopped: {}", err);
                false
            }
        };

        let transition = match (self.was_running, now_running) {
            (false, true) => Transition::Activated,
            (true, false) => Transition::Deactivated,
            _ => Transition::Unchanged,
        };
        self.was_running = now_running;
        transition
    }

    /// Poll the switch once, running a cycle to completion on activation.
    ///
    /// Returns the cycle outcome if one ran. A failed cycle is logged here
    /// and goes no further.
    pub async fn poll_once(&mut self) -> Option<Result<CycleReport, CycleError>> {
        let reading = self.store.load_run_state().await;
        match self.observe(reading) {
            Transition::Activated => {
                info!("Run switch turned on, starting cycle");
                let outcome = self.runner.run_cycle().await;
                match &outcome {
                    Ok(report) => info!(
                        "Cycle complete: {} fetched, {} unique, {} qualified, {} scoring failures, last fetch {}",
                        report.fetched,
                        report.merged,
                        report.qualified,
                        report.score_failures,
                        report.last_fetch_time.as_deref().unwrap_or("unset")
                    ),
                    Err(err) => error!("Cycle failed, nothing persisted: {}", err),
                }
                Some(outcome)
            }
            Transition::Deactivated => {
                info!("Run switch turned off");
                None
            }
            Transition::Unchanged => {
                debug!("Run switch unchanged (running: {})", self.was_running);
                None
            }
        }
    }

    /// Poll until `shutdown` flips to true. Cycles are never interrupted.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Monitoring run switch every {:?}", self.poll_interval);
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.poll_once().await;

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender dropped; nobody can ask us to stop any more.
                        sleep(self.poll_interval).await;
                    }
                }
            }
        }
        info!("Run switch monitor stopped");
    }
}
