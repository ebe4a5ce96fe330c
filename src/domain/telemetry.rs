//! Telemetry domain types.
//!
//! A [`Metric`] is one entity count read from the store. A [`TelemetryBatch`]
//! is what gets shipped to the collector: the process identifier plus every
//! metric gathered during a tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of entity collections that are counted on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Projects,
    Experiments,
    ExperimentRuns,
    Datasets,
    DatasetVersions,
    Comments,
    CodeVersions,
    Attributes,
    Artifacts,
    Features,
    GitSnapshots,
    KeyValues,
    Observations,
    TagMappings,
}

impl MetricKey {
    /// All keys, in collection order.
    pub const ALL: [MetricKey; 14] = [
        MetricKey::Projects,
        MetricKey::Experiments,
        MetricKey::ExperimentRuns,
        MetricKey::Datasets,
        MetricKey::DatasetVersions,
        MetricKey::Comments,
        MetricKey::CodeVersions,
        MetricKey::Attributes,
        MetricKey::Artifacts,
        MetricKey::Features,
        MetricKey::GitSnapshots,
        MetricKey::KeyValues,
        MetricKey::Observations,
        MetricKey::TagMappings,
    ];

    /// Well-known key sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Projects => "projects",
            MetricKey::Experiments => "experiments",
            MetricKey::ExperimentRuns => "experiment_runs",
            MetricKey::Datasets => "datasets",
            MetricKey::DatasetVersions => "dataset_versions",
            MetricKey::Comments => "comments",
            MetricKey::CodeVersions => "code_versions",
            MetricKey::Attributes => "attributes",
            MetricKey::Artifacts => "artifacts",
            MetricKey::Features => "features",
            MetricKey::GitSnapshots => "git_snapshots",
            MetricKey::KeyValues => "key_values",
            MetricKey::Observations => "observations",
            MetricKey::TagMappings => "tag_mappings",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown metric key: {}", s))
    }
}

/// Value type tag carried by every metric. Counts are always numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    #[default]
    Number,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Number => f.write_str("NUMBER"),
        }
    }
}

/// One named count. Fields are private so a metric cannot change after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    key: MetricKey,
    value: u64,
    value_type: ValueType,
}

impl Metric {
    pub fn count(key: MetricKey, value: u64) -> Self {
        Self {
            key,
            value,
            value_type: ValueType::Number,
        }
    }

    pub fn key(&self) -> MetricKey {
        self.key
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

/// Envelope posted to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryBatch {
    pub id: String,
    pub metrics: Vec<Metric>,
}

impl TelemetryBatch {
    pub fn new(id: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            id: id.into(),
            metrics,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Local copy of a metric from the most recent collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTelemetryRecord {
    pub metric: Metric,
    pub collected_at: DateTime<Utc>,
}

impl StagedTelemetryRecord {
    pub fn new(metric: Metric, collected_at: DateTime<Utc>) -> Self {
        Self {
            metric,
            collected_at,
        }
    }
}
