//! Periodic persistence of the turnout registry.
//!
//! [`PersistenceTask`] wakes up every interval and asks the registry to
//! flush. The registry only writes when something changed, so an idle
//! layout costs one lock acquisition per interval. Storage I/O runs on the
//! blocking pool, never on the async workers.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use rs_turnouts::config::TurnoutConfig;
//! # use rs_turnouts::hal::{MockEventSink, MockScheduler, MockStorage};
//! # use rs_turnouts::persist::PersistenceTask;
//! # use rs_turnouts::registry::TurnoutRegistry;
//! # async fn run() {
//! let config = TurnoutConfig::default();
//! let interval = config.persistence_interval();
//! let registry = Arc::new(TurnoutRegistry::new(
//!     config,
//!     MockStorage::new(),
//!     MockEventSink::new(),
//!     MockScheduler::new(),
//! ));
//! let task = PersistenceTask::spawn(Arc::clone(&registry), interval);
//! // ... station runs ...
//! task.stop().await; // final flush
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::registry::TurnoutRegistry;
use crate::traits::{EventSink, PacketScheduler, Storage};

/// Handle to the running persistence task.
///
/// Dropping the handle also stops the task (after a final flush), but only
/// [`PersistenceTask::stop`] waits for that flush to complete.
pub struct PersistenceTask {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl PersistenceTask {
    /// Spawns the task on the current tokio runtime.
    ///
    /// The first flush happens one `interval` after spawning.
    pub fn spawn<S, E, P>(registry: Arc<TurnoutRegistry<S, E, P>>, interval: Duration) -> Self
    where
        S: Storage + Send + Sync + 'static,
        E: EventSink + Send + Sync + 'static,
        P: PacketScheduler + Send + Sync + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => flush(&registry).await,
                    _ = &mut stop_rx => break,
                }
            }
            flush(&registry).await;
            debug!("[Turnouts] Persistence task stopped");
        });
        Self {
            stop: Some(stop_tx),
            handle,
        }
    }

    /// Stops the task and waits for its final flush.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(err) = (&mut self.handle).await {
            error!("[Turnouts] Persistence task failed: {}", err);
        }
    }
}

async fn flush<S, E, P>(registry: &Arc<TurnoutRegistry<S, E, P>>)
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
{
    let registry = Arc::clone(registry);
    // persist() logs its own failures and keeps the registry dirty
    if let Err(err) = tokio::task::spawn_blocking(move || registry.persist()).await {
        error!("[Turnouts] Persistence flush panicked: {}", err);
    }
}
