//! Poll scheduler
//!
//! Starts a pass immediately, then one per interval. At most one pass is in
//! flight: a tick that finds the previous pass still running is dropped, not
//! queued. A failed pass is logged and the next tick tries again.

use crate::error::Result;
use crate::train::PassReport;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

/// Something that can run one pass
#[async_trait]
pub trait PassRunner: Send + Sync + 'static {
    /// Run one full pass
    async fn run_pass(&self) -> Result<PassReport>;
}

/// What a tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// A pass was started in the background
    Started(JoinHandle<()>),
    /// The previous pass was still running
    Skipped,
}

/// Fixed-interval pass scheduler
pub struct Scheduler {
    runner: Arc<dyn PassRunner>,
    interval: Duration,
    in_flight: Arc<Mutex<()>>,
}

impl Scheduler {
    /// Create a scheduler running `runner` every `interval`
    pub fn new(runner: Arc<dyn PassRunner>, interval: Duration) -> Self {
        Self {
            runner,
            interval,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Interval between pass starts
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Start a pass unless one is already running
    pub fn trigger(&self) -> TickOutcome {
        let Ok(guard) = Arc::clone(&self.in_flight).try_lock_owned() else {
            warn!("previous pass still running, skipping tick");
            return TickOutcome::Skipped;
        };

        let runner = Arc::clone(&self.runner);
        TickOutcome::Started(tokio::spawn(async move {
            // Held until the pass finishes, successfully or not.
            let _guard = guard;
            match runner.run_pass().await {
                Ok(report) => info!(
                    evaluated = report.outcomes.len(),
                    merged = report.merged().len(),
                    "pass finished"
                ),
                Err(e) => error!(error = %e, "pass failed, retrying on next tick"),
            }
        }))
    }

    /// Run a single pass in the foreground, waiting for any in-flight pass
    pub async fn run_once(&self) -> Result<PassReport> {
        let _guard = self.in_flight.lock().await;
        self.runner.run_pass().await
    }

    /// Tick until `shutdown` resolves, then wait for the in-flight pass
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        info!(interval_secs = self.interval.as_secs(), "scheduler started");
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let _ = self.trigger();
                }
            }
        }

        // Passes are not cancelled mid-flight.
        let _guard = self.in_flight.lock().await;
        info!("scheduler stopped");
    }
}
