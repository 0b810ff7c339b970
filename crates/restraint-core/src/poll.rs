//! Recurring poll driving the engine.
//!
//! The engine itself never ticks; a [`Poller`] owns the recurring task and an
//! explicit stop handle, so the host can tie polling to its mount/unmount
//! lifecycle instead of leaving a free-running timer behind.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::counter::CounterEngine;
use crate::events::Event;

/// Handle to a recurring tick task.
pub struct Poller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn a recurring tick at the engine's configured interval.
    ///
    /// Each period the engine is ticked and then snapshotted; `on_event`
    /// receives the transition event (if any) followed by the snapshot.
    /// The first period fires immediately, so the host gets an initial
    /// snapshot on mount.
    pub fn spawn<F>(engine: Arc<Mutex<CounterEngine>>, mut on_event: F) -> Self
    where
        F: FnMut(Event) + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let interval_ms = { engine.lock().await.config().interval_ms.max(1) as u64 };
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let mut engine = engine.lock().await;
                        if let Some(event) = engine.tick() {
                            on_event(event);
                        }
                        on_event(engine.snapshot());
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("poller stopping");
                        break;
                    }
                }
            }
        });
        Self { shutdown, handle }
    }

    /// Stop the recurring task and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
