//! Background tick driver.
//!
//! `start_tracker` spawns one tokio task that owns the tick loop. It runs a
//! full pass right away, then every `tick_interval` hands the time since the
//! last completed pass to [`ProgressionEngine::on_update`]. Passes run on the
//! blocking pool so profile IO never stalls the runtime.
//!
//! Quest events published through the handle bypass the loop and are applied
//! on the caller's thread.

use super::engine::{PassOutcome, ProgressionEngine, QuestEvent, TickOutcome};
use super::notify::Subscription;
use crate::errors::TrackerError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

pub struct DriverConfig {
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000),
        }
    }
}

enum DriverCommand {
    ForcePass(oneshot::Sender<Result<PassOutcome, TrackerError>>),
    Shutdown(oneshot::Sender<()>),
}

impl std::fmt::Debug for DriverCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverCommand::ForcePass(_) => f.write_str("ForcePass"),
            DriverCommand::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TrackerHandle {
    tx: mpsc::UnboundedSender<DriverCommand>,
    engine: Arc<ProgressionEngine>,
}

impl TrackerHandle {
    pub fn engine(&self) -> &Arc<ProgressionEngine> {
        &self.engine
    }

    /// Apply a quest lifecycle event. Returns whether tracked state changed.
    pub fn publish(&self, event: QuestEvent) -> bool {
        self.engine.handle_event(&event)
    }

    pub fn subscribe(&self) -> Subscription {
        self.engine.subscribe()
    }

    /// Run a full pass now regardless of the tick threshold.
    pub async fn force_pass(&self) -> Result<PassOutcome, TrackerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(DriverCommand::ForcePass(tx))
            .map_err(|_| TrackerError::DriverStopped)?;
        rx.await.map_err(|_| TrackerError::DriverStopped)?
    }

    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(DriverCommand::Shutdown(tx));
        let _ = rx.await;
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

async fn run_pass(engine: &Arc<ProgressionEngine>) -> Result<PassOutcome, TrackerError> {
    let engine = Arc::clone(engine);
    tokio::task::spawn_blocking(move || engine.recompute())
        .await
        .map_err(|e| {
            log::error!("progression pass task failed: {}", e);
            TrackerError::PassFailed(e.to_string())
        })
}

async fn run_tick(engine: &Arc<ProgressionEngine>, elapsed: Duration) -> Option<TickOutcome> {
    let engine = Arc::clone(engine);
    match tokio::task::spawn_blocking(move || engine.on_update(elapsed)).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            log::error!("progression tick task failed: {}", e);
            None
        }
    }
}

pub fn start_tracker(engine: Arc<ProgressionEngine>, cfg: DriverConfig) -> TrackerHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<DriverCommand>();
    let handle = TrackerHandle {
        tx,
        engine: Arc::clone(&engine),
    };

    tokio::spawn(async move {
        let mut last_pass = Instant::now();
        if let Ok(PassOutcome::Completed(summary)) = run_pass(&engine).await {
            log::debug!(
                "initial progression pass: {} profiles, {} skipped",
                summary.profiles_processed,
                summary.profiles_skipped
            );
            last_pass = Instant::now();
        }

        let mut ticker = tokio::time::interval(cfg.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                cmd = rx.recv() => {
                    match cmd {
                        Some(DriverCommand::ForcePass(resp)) => {
                            let outcome = run_pass(&engine).await;
                            if let Ok(PassOutcome::Completed(_)) = outcome {
                                last_pass = Instant::now();
                            }
                            let _ = resp.send(outcome);
                        }
                        Some(DriverCommand::Shutdown(done)) => {
                            log::info!("progression tracker stopping");
                            let _ = done.send(());
                            break;
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if let Some(TickOutcome::Completed(_)) = run_tick(&engine, last_pass.elapsed()).await {
                        last_pass = Instant::now();
                    }
                }
            }
        }
    });

    handle
}
