//! Aggregate ranking metrics over a fixed collection of queries.
//!
//! `RankingMetrics` owns the query pairs for its whole lifetime and never
//! mutates them. Every public metric validates its arguments first, then
//! scores each query independently and reduces with an unweighted mean.

use crate::diagnostics::{DiagnosticSink, QueryScopedSink, TracingSink};
use crate::error::{RankingError, Result};
use crate::reduce::{EvaluationConfig, MeanReducer};
use crate::report::{CutoffMetrics, MetricsReport};
use crate::scoring::Metric;
use crate::types::QueryPair;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};

/// Evaluation context for precision@k, recall@k, MAP, MAP@k and NDCG@k.
pub struct RankingMetrics<T: Eq + Hash> {
    pairs: Vec<QueryPair<T>>,
    reducer: MeanReducer,
    sink: Arc<dyn DiagnosticSink>,
    mean_average_precision: OnceLock<f64>,
}

impl<T: Eq + Hash> std::fmt::Debug for RankingMetrics<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingMetrics")
            .field("queries", &self.pairs.len())
            .field("reducer", &self.reducer)
            .finish()
    }
}

impl<T> RankingMetrics<T>
where
    T: Eq + Hash + Send + Sync,
{
    /// Create an evaluation context from prepared query pairs
    pub fn new(pairs: Vec<QueryPair<T>>) -> Self {
        Self {
            pairs,
            reducer: MeanReducer::default(),
            sink: Arc::new(TracingSink),
            mean_average_precision: OnceLock::new(),
        }
    }

    /// Create an evaluation context from `(predictions, ground_truth)` pairs
    /// of any iterable type.
    pub fn from_iterables<I, P, G>(queries: I) -> Self
    where
        I: IntoIterator<Item = (P, G)>,
        P: IntoIterator<Item = T>,
        G: IntoIterator<Item = T>,
    {
        Self::new(
            queries
                .into_iter()
                .map(|(predictions, ground_truth)| {
                    QueryPair::from_iterables(predictions, ground_truth)
                })
                .collect(),
        )
    }

    /// Use a specific execution configuration
    pub fn with_config(mut self, config: &EvaluationConfig) -> Result<Self> {
        self.reducer = MeanReducer::from_config(config)?;
        Ok(self)
    }

    /// Route empty-ground-truth warnings to `sink` instead of `tracing`
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[QueryPair<T>] {
        &self.pairs
    }

    /// Mean fraction of the top-k predictions that are relevant
    pub fn precision_at(&self, k: usize) -> Result<f64> {
        Ok(self.evaluate(Metric::precision_at(k)?))
    }

    /// Mean fraction of the relevant items found in the top-k predictions
    pub fn recall_at(&self, k: usize) -> Result<f64> {
        Ok(self.evaluate(Metric::recall_at(k)?))
    }

    /// Mean average precision over the full prediction lists.
    ///
    /// Computed once and cached; the query collection cannot change.
    pub fn mean_average_precision(&self) -> f64 {
        *self
            .mean_average_precision
            .get_or_init(|| self.evaluate(Metric::MeanAveragePrecision))
    }

    /// Mean average precision over the first k predictions of each query
    pub fn mean_average_precision_at(&self, k: usize) -> Result<f64> {
        Ok(self.evaluate(Metric::mean_average_precision_at(k)?))
    }

    /// Mean NDCG@k with binary relevance
    pub fn ndcg_at(&self, k: usize) -> Result<f64> {
        Ok(self.evaluate(Metric::ndcg_at(k)?))
    }

    /// Score every query under `metric` and return the mean
    pub fn evaluate(&self, metric: Metric) -> f64 {
        tracing::debug!(
            %metric,
            queries = self.pairs.len(),
            mode = ?self.reducer.mode(),
            "Evaluating metric"
        );

        let sink = self.sink.as_ref();
        let value = self
            .reducer
            .mean(&self.pairs, |i, pair| {
                metric.score(pair, &QueryScopedSink::new(sink, i))
            });

        tracing::debug!(%metric, value, "Metric evaluated");
        value
    }

    /// Number of queries whose ground truth is empty
    pub fn empty_ground_truth_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|pair| pair.relevant().is_empty())
            .count()
    }

    /// MAP plus precision, recall, MAP and NDCG at every cutoff in `ks`.
    ///
    /// All cutoffs are validated before anything is scored.
    pub fn report(&self, ks: &[usize]) -> Result<MetricsReport> {
        if let Some(pos) = ks.iter().position(|&k| k == 0) {
            return Err(RankingError::InvalidArgument(format!(
                "report: cutoff #{} is 0, every k must be positive",
                pos + 1
            )));
        }

        let mut cutoffs = Vec::with_capacity(ks.len());
        for &k in ks {
            cutoffs.push(CutoffMetrics {
                k,
                precision: self.precision_at(k)?,
                recall: self.recall_at(k)?,
                mean_average_precision: self.mean_average_precision_at(k)?,
                ndcg: self.ndcg_at(k)?,
            });
        }

        Ok(MetricsReport {
            generated_at_utc: chrono::Utc::now(),
            query_count: self.pairs.len(),
            empty_ground_truth_queries: self.empty_ground_truth_count(),
            mean_average_precision: self.mean_average_precision(),
            cutoffs,
        })
    }
}

impl<T> FromIterator<QueryPair<T>> for RankingMetrics<T>
where
    T: Eq + Hash + Send + Sync,
{
    fn from_iter<I: IntoIterator<Item = QueryPair<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
