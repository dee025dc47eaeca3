//! Progress reporter timer
//!
//! A fixed-cadence ticker owned by the engine. The timer itself knows nothing
//! about handles: it only posts [`EngineInput::ProgressTick`] into the
//! engine's input channel, and the engine decides on every tick whether a
//! snapshot should go out or the timer should stop.

use crate::backend::EngineInput;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Start/stop lifecycle around the tick task
#[derive(Debug)]
pub(crate) struct ProgressReporter {
    interval: Duration,
    tx: mpsc::UnboundedSender<EngineInput>,
    task: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    pub fn new(interval: Duration, tx: mpsc::UnboundedSender<EngineInput>) -> Self {
        Self {
            // A zero period would make tokio's interval panic
            interval: interval.max(Duration::from_millis(1)),
            tx,
            task: None,
        }
    }

    /// Whether the tick task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start ticking; no-op if already running
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No Tokio runtime available, progress reporting disabled");
            return;
        };

        let period = self.interval;
        let tx = self.tx.clone();
        self.task = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so the first
            // report lands one period after start
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.send(EngineInput::ProgressTick).is_err() {
                    break;
                }
            }
        }));
        tracing::trace!("Progress reporter started ({:?})", period);
    }

    /// Stop ticking; no-op if not running
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::trace!("Progress reporter stopped");
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}
