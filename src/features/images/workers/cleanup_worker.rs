use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use crate::features::images::services::ImageCleanupService;

/// Background worker that periodically sweeps images past their grace period
///
/// The sweep itself is independent of this worker: the admin cleanup endpoint
/// runs the same service call on demand.
pub struct CleanupWorker {
    cleanup_service: Arc<ImageCleanupService>,
    sweep_interval_secs: u64,
}

impl CleanupWorker {
    pub fn new(cleanup_service: Arc<ImageCleanupService>, sweep_interval_secs: u64) -> Self {
        Self {
            cleanup_service,
            sweep_interval_secs,
        }
    }

    /// Run the worker in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting image cleanup worker (interval: {}s)",
            self.sweep_interval_secs
        );

        let mut interval = interval(Duration::from_secs(self.sweep_interval_secs));

        loop {
            interval.tick().await;

            match self.cleanup_service.run_sweep().await {
                Ok(report) if report.deleted_count > 0 || !report.errors.is_empty() => {
                    tracing::info!(
                        "Scheduled sweep: {} image(s) deleted, {} failure(s)",
                        report.deleted_count,
                        report.errors.len()
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Scheduled sweep failed: {:?}", e);
                }
            }
        }
    }
}
