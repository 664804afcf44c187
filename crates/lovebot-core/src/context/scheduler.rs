//! Periodic durable save of the context store.
//!
//! Uses tokio-cron-scheduler to run `save_all()` at a fixed interval, and
//! flushes once more on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, info};

use super::store::ContextStore;

/// Scheduler for periodic context saves.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(ContextStore::open(persistence, &config).await);
/// let mut scheduler = ContextSaveScheduler::new(store.clone(), config.context.save_interval_secs).await?;
/// scheduler.start().await?;
/// // ...
/// scheduler.shutdown().await?;
/// ```
pub struct ContextSaveScheduler {
    scheduler: JobScheduler,
    store: Arc<ContextStore>,
    interval_secs: u64,
}

impl ContextSaveScheduler {
    /// Create a scheduler. Call `start()` to begin saving.
    pub async fn new(
        store: Arc<ContextStore>,
        interval_secs: u64,
    ) -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler,
            store,
            interval_secs: interval_secs.max(1),
        })
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// Start periodic saving.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        let store = self.store.clone();
        let job = Job::new_repeated_async(
            Duration::from_secs(self.interval_secs),
            move |_uuid, _lock| {
                let store = store.clone();
                Box::pin(async move {
                    debug!("Starting periodic context save");
                    let saved = store.save_all().await;
                    debug!(saved, "Periodic context save complete");
                })
            },
        )?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        info!(interval_secs = self.interval_secs, "Context save scheduler started");
        Ok(())
    }

    /// Stop the scheduler and flush every context one last time.
    pub async fn shutdown(&mut self) -> Result<usize, JobSchedulerError> {
        info!("Shutting down context save scheduler");
        self.scheduler.shutdown().await?;
        let saved = self.store.save_all().await;
        info!(saved, "Final context flush complete");
        Ok(saved)
    }

    /// Save immediately, outside the schedule.
    pub async fn run_now(&self) -> usize {
        self.store.save_all().await
    }
}
