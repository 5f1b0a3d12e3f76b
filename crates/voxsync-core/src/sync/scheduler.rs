use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use super::engine::SyncEngine;
use crate::presenter::Presenter;
use crate::remote::RemoteService;
use crate::storage::NoteStorage;

/// Messages to control the sync scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMessage {
    /// Run a cycle now instead of waiting for the next tick
    SyncNow,
    /// App closing
    Shutdown,
}

/// Handle for the recurring sync task. Dropping it aborts the task.
pub struct SyncScheduler {
    sender: mpsc::Sender<SchedulerMessage>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Spawn the recurring loop. The first cycle runs immediately.
    pub fn start<R, S, P>(engine: Arc<SyncEngine<R, S, P>>, period: Duration) -> Self
    where
        R: RemoteService,
        S: NoteStorage,
        P: Presenter,
    {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(scheduler_loop(engine, period, rx));
        tracing::debug!(period_secs = period.as_secs(), "sync scheduler started");

        Self {
            sender: tx,
            handle: Some(handle),
        }
    }

    /// Trigger an out-of-schedule cycle
    pub fn sync_now(&self) {
        if let Err(error) = self.sender.try_send(SchedulerMessage::SyncNow) {
            tracing::debug!("sync request dropped: {}", error);
        }
    }

    /// Stop the loop and wait for running cycles to finish.
    pub async fn shutdown(mut self) {
        // The loop also stops when every sender is gone, so a send error is fine.
        let _ = self.sender.send(SchedulerMessage::Shutdown).await;
        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.await {
                if !error.is_cancelled() {
                    tracing::warn!("sync scheduler stopped abnormally: {}", error);
                }
            }
        }
        tracing::debug!("sync scheduler stopped");
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn scheduler_loop<R, S, P>(
    engine: Arc<SyncEngine<R, S, P>>,
    period: Duration,
    mut rx: mpsc::Receiver<SchedulerMessage>,
) where
    R: RemoteService,
    S: NoteStorage,
    P: Presenter,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycles = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_cycle(&mut cycles, &engine),
            message = rx.recv() => match message {
                Some(SchedulerMessage::SyncNow) => spawn_cycle(&mut cycles, &engine),
                Some(SchedulerMessage::Shutdown) | None => break,
            },
            Some(result) = cycles.join_next(), if !cycles.is_empty() => {
                if let Err(error) = result {
                    tracing::warn!("sync cycle task failed: {}", error);
                }
            }
        }
    }

    while let Some(result) = cycles.join_next().await {
        if let Err(error) = result {
            tracing::warn!("sync cycle task failed: {}", error);
        }
    }
}

fn spawn_cycle<R, S, P>(cycles: &mut JoinSet<()>, engine: &Arc<SyncEngine<R, S, P>>)
where
    R: RemoteService,
    S: NoteStorage,
    P: Presenter,
{
    let engine = Arc::clone(engine);
    cycles.spawn(async move {
        engine.tick().await;
    });
}
