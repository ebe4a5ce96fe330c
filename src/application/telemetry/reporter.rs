//! Scheduled collect-and-report unit of work.
//!
//! One tick:
//! 1. clear the staged telemetry table
//! 2. count every entity collection inside one read session
//! 3. stage each count as a local record
//! 4. post the batch to the collector when there is something to send and an
//!    identifier to send it under
//!
//! Nothing that goes wrong inside a tick escapes it. Each step logs its own
//! failures and the tick carries on with whatever it has.

use crate::domain::errors::{ReportError, StoreError};
use crate::domain::ports::TelemetryPublisher;
use crate::domain::repositories::{StagedTelemetryRepository, UsageStore};
use crate::domain::telemetry::{Metric, MetricKey, StagedTelemetryRecord, TelemetryBatch};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Bounds on restarting a collection after a transient store failure.
#[derive(Debug, Clone, Copy)]
pub struct CollectionRetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for CollectionRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// What happened to the upload step of a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    SkippedNoMetrics,
    SkippedNoIdentifier,
    Delivered { status: u16, body: String },
    Rejected { status: u16, body: String },
    Failed { reason: String },
}

impl ReportOutcome {
    /// Whether a request was put on the wire.
    pub fn attempted(&self) -> bool {
        !matches!(
            self,
            ReportOutcome::SkippedNoMetrics | ReportOutcome::SkippedNoIdentifier
        )
    }
}

/// Result of one collection run (possibly several attempts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub metrics: Vec<Metric>,
    pub attempts: u32,
    /// `false` when the metrics are a partial read.
    pub complete: bool,
}

/// Summary of a finished tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub staging_cleared: bool,
    pub collection: Collection,
    pub staged: usize,
    pub staging_failures: usize,
    pub batch: Option<TelemetryBatch>,
    pub outcome: ReportOutcome,
}

struct CollectionFailure {
    partial: Vec<Metric>,
    error: StoreError,
}

pub struct TelemetryReporter {
    usage_store: Arc<dyn UsageStore>,
    staging: Arc<dyn StagedTelemetryRepository>,
    publisher: Arc<dyn TelemetryPublisher>,
    telemetry_id: Option<String>,
    retry: CollectionRetryConfig,
    tick_guard: Mutex<()>,
}

impl TelemetryReporter {
    /// # Arguments
    /// * `usage_store` - Source of entity counts
    /// * `staging` - Staged telemetry table
    /// * `publisher` - Collector client
    /// * `telemetry_id` - Process identifier, `None` disables uploads
    /// * `retry` - Bounds for restarting a failed collection
    pub fn new(
        usage_store: Arc<dyn UsageStore>,
        staging: Arc<dyn StagedTelemetryRepository>,
        publisher: Arc<dyn TelemetryPublisher>,
        telemetry_id: Option<String>,
        retry: CollectionRetryConfig,
    ) -> Self {
        Self {
            usage_store,
            staging,
            publisher,
            telemetry_id: telemetry_id.filter(|id| !id.trim().is_empty()),
            retry,
            tick_guard: Mutex::new(()),
        }
    }

    pub fn telemetry_id(&self) -> Option<&str> {
        self.telemetry_id.as_deref()
    }

    /// Run one tick unless another one is still in progress, in which case
    /// this call is skipped and returns `None`.
    pub async fn run_tick(&self) -> Option<TickReport> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            warn!("TelemetryReporter: previous tick still running, skipping this one");
            return None;
        };

        Some(self.tick().await)
    }

    async fn tick(&self) -> TickReport {
        info!("TelemetryReporter wakeup");

        let staging_cleared = match self.staging.delete_all().await {
            Ok(removed) => {
                debug!("Removed {} staged telemetry records", removed);
                true
            }
            Err(e) => {
                error!("Error while deleting staged telemetry: {}", e);
                false
            }
        };

        let collection = self.collect_metrics().await;

        let (staged, staging_failures) = self.stage(&collection.metrics, Utc::now()).await;

        let (batch, outcome) = self.report(&collection.metrics).await;

        info!("TelemetryReporter finished tick, waiting for next schedule");

        TickReport {
            staging_cleared,
            collection,
            staged,
            staging_failures,
            batch,
            outcome,
        }
    }

    /// Count every collection. A retryable failure restarts the whole
    /// collection from the first key, up to `max_attempts` times; anything
    /// else returns what the failing attempt had gathered so far.
    pub async fn collect_metrics(&self) -> Collection {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.collect_once().await {
                Ok(metrics) => {
                    return Collection {
                        metrics,
                        attempts: attempt,
                        complete: true,
                    };
                }
                Err(CollectionFailure { partial, error }) => {
                    error!(
                        "Error on reading data from store (attempt {}/{}): {}",
                        attempt, max_attempts, error
                    );

                    if error.is_retryable() && attempt < max_attempts {
                        warn!(
                            "Transient store failure, restarting collection in {:?}",
                            self.retry.delay
                        );
                        if !self.retry.delay.is_zero() {
                            tokio::time::sleep(self.retry.delay).await;
                        }
                        attempt += 1;
                        continue;
                    }

                    return Collection {
                        metrics: partial,
                        attempts: attempt,
                        complete: false,
                    };
                }
            }
        }
    }

    async fn collect_once(&self) -> Result<Vec<Metric>, CollectionFailure> {
        let mut session = self
            .usage_store
            .open_read_session()
            .await
            .map_err(|error| CollectionFailure {
                partial: Vec::new(),
                error,
            })?;

        let mut metrics = Vec::with_capacity(MetricKey::ALL.len());
        for key in MetricKey::ALL {
            match session.count(key).await {
                Ok(value) => metrics.push(Metric::count(key, value)),
                Err(error) => {
                    return Err(CollectionFailure {
                        partial: metrics,
                        error,
                    });
                }
            }
        }

        Ok(metrics)
    }

    async fn stage(&self, metrics: &[Metric], collected_at: DateTime<Utc>) -> (usize, usize) {
        let mut staged = 0;
        let mut failures = 0;

        for metric in metrics {
            let record = StagedTelemetryRecord::new(metric.clone(), collected_at);
            match self.staging.insert(&record).await {
                Ok(()) => staged += 1,
                Err(e) => {
                    failures += 1;
                    error!("Error while staging telemetry metric {}: {}", metric.key(), e);
                }
            }
        }

        (staged, failures)
    }

    async fn report(&self, metrics: &[Metric]) -> (Option<TelemetryBatch>, ReportOutcome) {
        if metrics.is_empty() {
            info!("No telemetry collected, skipping upload");
            return (None, ReportOutcome::SkippedNoMetrics);
        }
        let Some(id) = self.telemetry_id.as_deref() else {
            warn!("Telemetry identifier unavailable, skipping upload");
            return (None, ReportOutcome::SkippedNoIdentifier);
        };

        let batch = TelemetryBatch::new(id, metrics.to_vec());

        let outcome = match self.publisher.publish(&batch).await {
            Ok(response) => {
                info!("POST Response Code :: {}", response.status);
                if response.is_success() {
                    info!("Telemetry Response : {}", response.body);
                    ReportOutcome::Delivered {
                        status: response.status,
                        body: response.body,
                    }
                } else {
                    let rejected = ReportError::Rejected {
                        status: response.status,
                        body: response.body.clone(),
                    };
                    error!("Error while uploading telemetry data : {}", rejected);
                    ReportOutcome::Rejected {
                        status: response.status,
                        body: response.body,
                    }
                }
            }
            Err(e) => {
                error!("Error while uploading telemetry data : {}", e);
                ReportOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        (Some(batch), outcome)
    }
}
