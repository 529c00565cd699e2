//! Interval scheduler for the analysis pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use medsift_analyze::{AnalysisPipeline, RunReport};
use medsift_core::Result;

/// Triggers one analysis pass immediately, then one per interval.
///
/// Pass failures are caught and logged so one bad pass never stops future
/// passes. `stop()` halts the outer loop only; a pass already running via
/// `spawn_blocking` finishes its current unit rather than aborting mid-write.
pub struct AnalysisScheduler {
    pipeline: Arc<AnalysisPipeline>,
    interval: Duration,
    stop_tx: watch::Sender<bool>,
}

impl AnalysisScheduler {
    pub fn new(pipeline: Arc<AnalysisPipeline>, interval_secs: u64) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            pipeline,
            interval: Duration::from_secs(interval_secs),
            stop_tx,
        }
    }

    /// Spawn the background scheduling task.
    pub fn start(&self) {
        let pipeline = self.pipeline.clone();
        let interval = self.interval;
        let mut stop_rx = self.stop_tx.subscribe();

        tokio::spawn(async move {
            info!("Analysis scheduler started: interval={}s", interval.as_secs());

            // Initial pass before the first tick.
            Self::execute_pass(&pipeline).await;

            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick completes immediately
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::execute_pass(&pipeline).await;
                    }
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            info!("Analysis scheduler stopped");
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Signal the scheduler loop to halt. No further passes are triggered.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Run a pass right now, outside the schedule. Fails if one is already
    /// running (the pipeline's run guard rejects concurrent passes).
    pub async fn trigger_now(&self) -> Result<RunReport> {
        info!("Manual analysis trigger");
        let pipeline = self.pipeline.clone();
        tokio::task::spawn_blocking(move || pipeline.run_once())
            .await
            .map_err(|e| medsift_core::Error::Internal(e.to_string()))?
    }

    async fn execute_pass(pipeline: &Arc<AnalysisPipeline>) {
        let pipeline = pipeline.clone();
        let result = tokio::task::spawn_blocking(move || pipeline.run_once()).await;
        match result {
            Ok(Ok(report)) => {
                info!(
                    "Scheduled pass done: {} analyzed, {}ms",
                    report.total_analyzed(),
                    report.duration_ms
                );
            }
            Ok(Err(e)) => {
                // Includes the rejected-while-running case; the next tick retries.
                error!("Scheduled pass failed: {}", e);
            }
            Err(e) => {
                error!("Scheduled pass panicked: {}", e);
            }
        }
    }
}
