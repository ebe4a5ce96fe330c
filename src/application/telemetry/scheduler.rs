use crate::application::telemetry::reporter::TelemetryReporter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Fixed-rate driver for the telemetry reporter.
///
/// Ticks run inline on the scheduler task, so a slow tick delays the next one
/// instead of overlapping it. Missed periods are dropped, not replayed.
pub struct TelemetryScheduler {
    reporter: Arc<TelemetryReporter>,
    frequency: Duration,
}

impl TelemetryScheduler {
    pub fn new(reporter: Arc<TelemetryReporter>, frequency: Duration) -> Self {
        Self {
            reporter,
            frequency,
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped. The
    /// first tick fires immediately.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "TelemetryScheduler: starting (frequency: {:?})",
            self.frequency
        );

        let mut interval = tokio::time::interval(self.frequency);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(report) = self.reporter.run_tick().await {
                        debug!(
                            "Tick done: {} metrics, {} staged, outcome {:?}",
                            report.collection.metrics.len(),
                            report.staged,
                            report.outcome
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("TelemetryScheduler: stopped");
    }
}
