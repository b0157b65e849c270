//! Serializable summary of a full evaluation run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metrics at one truncation depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffMetrics {
    pub k: usize,
    pub precision: f64,
    pub recall: f64,
    pub mean_average_precision: f64,
    pub ndcg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub generated_at_utc: DateTime<Utc>,
    pub query_count: usize,
    /// Queries that scored 0.0 everywhere because their ground truth was empty
    pub empty_ground_truth_queries: usize,
    /// MAP over the full prediction lists
    pub mean_average_precision: f64,
    pub cutoffs: Vec<CutoffMetrics>,
}

impl MetricsReport {
    pub fn cutoff(&self, k: usize) -> Option<&CutoffMetrics> {
        self.cutoffs.iter().find(|c| c.k == k)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
