//! Per-query ranking scores.
//!
//! Every metric reduces to one of three scoring primitives:
//! - truncated hit ratio (precision@k, recall@k)
//! - average precision at k (MAP, MAP@k)
//! - NDCG at k
//!
//! Relevance is binary: an item is relevant iff it is in the query's
//! `RelevanceSet`. A query with an empty relevance set scores 0.0 under
//! every metric and raises one warning on the diagnostic sink.

use crate::diagnostics::DiagnosticSink;
use crate::error::{RankingError, Result};
use crate::types::{QueryPair, RelevanceSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// A ranking metric together with its truncation depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "metric", content = "k")]
pub enum Metric {
    PrecisionAt(NonZeroUsize),
    RecallAt(NonZeroUsize),
    /// Average precision over the full prediction list
    MeanAveragePrecision,
    MeanAveragePrecisionAt(NonZeroUsize),
    NdcgAt(NonZeroUsize),
}

impl Metric {
    pub fn precision_at(k: usize) -> Result<Self> {
        Ok(Self::PrecisionAt(positive_k("precision_at", k)?))
    }

    pub fn recall_at(k: usize) -> Result<Self> {
        Ok(Self::RecallAt(positive_k("recall_at", k)?))
    }

    pub fn mean_average_precision_at(k: usize) -> Result<Self> {
        Ok(Self::MeanAveragePrecisionAt(positive_k(
            "mean_average_precision_at",
            k,
        )?))
    }

    pub fn ndcg_at(k: usize) -> Result<Self> {
        Ok(Self::NdcgAt(positive_k("ndcg_at", k)?))
    }

    /// Truncation depth, `None` for the untruncated MAP
    pub fn k(&self) -> Option<usize> {
        match self {
            Self::PrecisionAt(k)
            | Self::RecallAt(k)
            | Self::MeanAveragePrecisionAt(k)
            | Self::NdcgAt(k) => Some(k.get()),
            Self::MeanAveragePrecision => None,
        }
    }

    /// Score one query under this metric.
    pub fn score<T: Eq + Hash>(&self, pair: &QueryPair<T>, sink: &dyn DiagnosticSink) -> f64 {
        let predictions = pair.predictions();
        let relevant = pair.relevant();

        match *self {
            Self::PrecisionAt(k) => {
                truncated_hit_ratio(predictions, relevant, k.get(), k.get(), sink)
            }
            Self::RecallAt(k) => {
                truncated_hit_ratio(predictions, relevant, k.get(), relevant.len(), sink)
            }
            Self::MeanAveragePrecision => {
                average_precision_at_k(predictions, relevant, predictions.len(), sink)
            }
            Self::MeanAveragePrecisionAt(k) => {
                average_precision_at_k(predictions, relevant, k.get(), sink)
            }
            Self::NdcgAt(k) => ndcg_at_k(predictions, relevant, k.get(), sink),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrecisionAt(k) => write!(f, "precision@{k}"),
            Self::RecallAt(k) => write!(f, "recall@{k}"),
            Self::MeanAveragePrecision => write!(f, "map"),
            Self::MeanAveragePrecisionAt(k) => write!(f, "map@{k}"),
            Self::NdcgAt(k) => write!(f, "ndcg@{k}"),
        }
    }
}

impl FromStr for Metric {
    type Err = RankingError;

    /// Parses `precision@5`, `p@5`, `recall@10`, `r@10`, `map`, `map@10`, `ndcg@10`
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let (name, k) = match lower.split_once('@') {
            Some((name, k)) => {
                let k: usize = k.trim().parse().map_err(|_| {
                    RankingError::InvalidArgument(format!("invalid cutoff in metric '{s}'"))
                })?;
                (name.trim().to_string(), Some(k))
            }
            None => (lower.clone(), None),
        };

        match (name.as_str(), k) {
            ("p" | "precision", Some(k)) => Self::precision_at(k),
            ("r" | "recall", Some(k)) => Self::recall_at(k),
            ("map", None) => Ok(Self::MeanAveragePrecision),
            ("map", Some(k)) => Self::mean_average_precision_at(k),
            ("ndcg", Some(k)) => Self::ndcg_at(k),
            _ => Err(RankingError::InvalidArgument(format!(
                "unknown metric '{s}' (expected precision@k, recall@k, map, map@k or ndcg@k)"
            ))),
        }
    }
}

fn positive_k(metric: &str, k: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(k).ok_or_else(|| RankingError::non_positive_k(metric))
}

fn warn_empty(sink: &dyn DiagnosticSink, scorer: &str) {
    sink.warn(&format!(
        "{scorer}: empty ground truth set, check input data; scoring query as 0.0"
    ));
}

/// Count relevant items among the first `min(len, k)` predictions and divide
/// by `denominator`.
///
/// precision@k passes `k` as the denominator, recall@k passes the size of the
/// relevance set. Duplicate predictions are counted once per position.
pub fn truncated_hit_ratio<T: Eq + Hash>(
    predictions: &[T],
    relevant: &RelevanceSet<T>,
    k: usize,
    denominator: usize,
    sink: &dyn DiagnosticSink,
) -> f64 {
    if relevant.is_empty() {
        warn_empty(sink, "truncated_hit_ratio");
        return 0.0;
    }
    if denominator == 0 {
        return 0.0;
    }

    let hits = predictions
        .iter()
        .take(k)
        .filter(|item| relevant.contains(item))
        .count();
    hits as f64 / denominator as f64
}

/// Average precision over the first `min(len, k)` predictions.
///
/// Precision is sampled at every position holding a relevant item and the
/// sum is divided by the size of the whole relevance set, so relevant items
/// never retrieved pull the score down.
pub fn average_precision_at_k<T: Eq + Hash>(
    predictions: &[T],
    relevant: &RelevanceSet<T>,
    k: usize,
    sink: &dyn DiagnosticSink,
) -> f64 {
    if relevant.is_empty() {
        warn_empty(sink, "average_precision_at_k");
        return 0.0;
    }

    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for (i, item) in predictions.iter().take(k).enumerate() {
        if relevant.contains(item) {
            hits += 1;
            precision_sum += hits as f64 / (i + 1) as f64;
        }
    }
    precision_sum / relevant.len() as f64
}

/// NDCG@k with binary gains and a `1 / ln(i + 2)` discount.
///
/// The ideal ranking places every relevant item first, so the ideal DCG sums
/// the discounts of the first `|relevant|` positions (capped at `k`).
pub fn ndcg_at_k<T: Eq + Hash>(
    predictions: &[T],
    relevant: &RelevanceSet<T>,
    k: usize,
    sink: &dyn DiagnosticSink,
) -> f64 {
    if relevant.is_empty() {
        warn_empty(sink, "ndcg_at_k");
        return 0.0;
    }

    let relevant_count = relevant.len();
    let n = predictions.len().max(relevant_count).min(k);

    let mut dcg = 0.0;
    let mut max_dcg = 0.0;
    for i in 0..n {
        let gain = 1.0 / ((i + 2) as f64).ln();
        if predictions.get(i).is_some_and(|item| relevant.contains(item)) {
            dcg += gain;
        }
        if i < relevant_count {
            max_dcg += gain;
        }
    }
    dcg / max_dcg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    const EPS: f64 = 1e-9;

    fn pair(predictions: &[u32], ground_truth: &[u32]) -> QueryPair<u32> {
        QueryPair::new(predictions.to_vec(), ground_truth.iter().copied())
    }

    fn all_metrics(k: usize) -> Vec<Metric> {
        vec![
            Metric::precision_at(k).unwrap(),
            Metric::recall_at(k).unwrap(),
            Metric::MeanAveragePrecision,
            Metric::mean_average_precision_at(k).unwrap(),
            Metric::ndcg_at(k).unwrap(),
        ]
    }

    #[test]
    fn test_precision_and_recall_at_3() {
        let sink = RecordingSink::new();
        let q = pair(&[1, 2, 3, 4, 5], &[3, 2, 4]);

        let precision = Metric::precision_at(3).unwrap().score(&q, &sink);
        let recall = Metric::recall_at(3).unwrap().score(&q, &sink);

        assert!((precision - 2.0 / 3.0).abs() < EPS);
        assert!((recall - 2.0 / 3.0).abs() < EPS);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_precision_denominator_is_k_even_for_short_lists() {
        let sink = RecordingSink::new();
        let q = pair(&[1, 2], &[1, 2]);
        let precision = Metric::precision_at(4).unwrap().score(&q, &sink);
        assert!((precision - 0.5).abs() < EPS);
    }

    #[test]
    fn test_empty_predictions_score_zero_without_warning() {
        let sink = RecordingSink::new();
        let q = pair(&[], &[1, 2]);

        for k in [1, 3, 10] {
            assert_eq!(Metric::precision_at(k).unwrap().score(&q, &sink), 0.0);
            assert_eq!(Metric::recall_at(k).unwrap().score(&q, &sink), 0.0);
        }
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_empty_ground_truth_scores_zero_and_warns_once_per_metric() {
        let q = pair(&[1, 2, 3], &[]);

        for metric in all_metrics(3) {
            let sink = RecordingSink::new();
            assert_eq!(metric.score(&q, &sink), 0.0, "{metric}");
            assert_eq!(sink.count(), 1, "{metric}");
            assert!(sink.messages()[0].contains("empty ground truth"));
        }
    }

    #[test]
    fn test_map_at_4() {
        let sink = RecordingSink::new();
        let q = pair(&[1, 2, 3, 4], &[1, 3]);
        let map = Metric::mean_average_precision_at(4).unwrap().score(&q, &sink);
        assert!((map - (1.0 + 2.0 / 3.0) / 2.0).abs() < EPS);
    }

    #[test]
    fn test_map_divides_by_full_relevance_set() {
        let sink = RecordingSink::new();
        // one of three relevant items retrieved, at rank 1
        let q = pair(&[7, 8, 9], &[7, 100, 200]);
        let map = Metric::MeanAveragePrecision.score(&q, &sink);
        assert!((map - 1.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_map_perfect_ranking_is_one() {
        let sink = RecordingSink::new();
        let q = pair(&[4, 2, 9, 10, 11], &[2, 9, 4]);
        let map = Metric::MeanAveragePrecision.score(&q, &sink);
        assert!((map - 1.0).abs() < EPS);
    }

    #[test]
    fn test_map_at_k_truncates() {
        let sink = RecordingSink::new();
        let q = pair(&[1, 2, 3, 4], &[1, 3]);
        let map = Metric::mean_average_precision_at(2).unwrap().score(&q, &sink);
        assert!((map - 0.5).abs() < EPS);
    }

    #[test]
    fn test_ndcg_perfect_and_reversed() {
        let sink = RecordingSink::new();
        let perfect = pair(&[1, 2, 3, 4], &[1, 2]);
        let reversed = pair(&[3, 4, 1, 2], &[1, 2]);

        let ndcg = Metric::ndcg_at(4).unwrap();
        assert!((ndcg.score(&perfect, &sink) - 1.0).abs() < EPS);

        let expected = (1.0 / 4f64.ln() + 1.0 / 5f64.ln()) / (1.0 / 2f64.ln() + 1.0 / 3f64.ln());
        assert!((ndcg.score(&reversed, &sink) - expected).abs() < EPS);
    }

    #[test]
    fn test_ndcg_ideal_extends_past_short_prediction_list() {
        let sink = RecordingSink::new();
        // single hit at rank 1, but three relevant items in the ideal ranking
        let q = pair(&[1], &[1, 2, 3]);
        let ndcg = Metric::ndcg_at(5).unwrap().score(&q, &sink);
        let ideal = 1.0 / 2f64.ln() + 1.0 / 3f64.ln() + 1.0 / 4f64.ln();
        assert!((ndcg - (1.0 / 2f64.ln()) / ideal).abs() < EPS);
    }

    #[test]
    fn test_ndcg_ideal_is_capped_at_k() {
        let sink = RecordingSink::new();
        let q = pair(&[1, 2], &[1, 2, 3, 4, 5]);
        let ndcg = Metric::ndcg_at(2).unwrap().score(&q, &sink);
        assert!((ndcg - 1.0).abs() < EPS);
    }

    #[test]
    fn test_ndcg_bounded_by_one() {
        let sink = RecordingSink::new();
        let q = pair(&[5, 1, 5, 1, 2], &[1, 2]);
        for k in 1..8 {
            let ndcg = Metric::ndcg_at(k).unwrap().score(&q, &sink);
            assert!((0.0..=1.0 + EPS).contains(&ndcg), "k={k} ndcg={ndcg}");
        }
    }

    #[test]
    fn test_recall_monotone_in_k() {
        let sink = RecordingSink::new();
        let q = pair(&[9, 1, 8, 2, 7, 3], &[1, 2, 3, 4]);
        let mut previous = 0.0;
        for k in 1..10 {
            let recall = Metric::recall_at(k).unwrap().score(&q, &sink);
            assert!(recall >= previous);
            previous = recall;
        }
        assert!((previous - 0.75).abs() < EPS);
    }

    #[test]
    fn test_duplicate_predictions_count_per_position() {
        let sink = RecordingSink::new();
        let q = pair(&[1, 1, 2], &[1]);
        let precision = Metric::precision_at(3).unwrap().score(&q, &sink);
        assert!((precision - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_zero_k_is_rejected() {
        assert!(matches!(
            Metric::precision_at(0),
            Err(RankingError::InvalidArgument(_))
        ));
        assert!(Metric::recall_at(0).is_err());
        assert!(Metric::mean_average_precision_at(0).is_err());
        assert!(Metric::ndcg_at(0).is_err());
    }

    #[test]
    fn test_metric_json_round_trip() {
        let ndcg = Metric::ndcg_at(10).unwrap();
        let json = serde_json::to_string(&ndcg).unwrap();
        assert_eq!(json, r#"{"metric":"ndcg_at","k":10}"#);
        assert_eq!(serde_json::from_str::<Metric>(&json).unwrap(), ndcg);

        let map: Metric = serde_json::from_str(r#"{"metric":"mean_average_precision"}"#).unwrap();
        assert_eq!(map, Metric::MeanAveragePrecision);
        let json = serde_json::to_string(&Metric::MeanAveragePrecision).unwrap();
        assert_eq!(serde_json::from_str::<Metric>(&json).unwrap(), map);
    }

    #[test]
    fn test_metric_json_rejects_zero_k() {
        assert!(serde_json::from_str::<Metric>(r#"{"metric":"precision_at","k":0}"#).is_err());
        assert!(serde_json::from_str::<Metric>(r#"{"metric":"recall_at"}"#).is_err());
    }

    #[test]
    fn test_metric_parse_and_display() {
        assert_eq!("p@5".parse::<Metric>().unwrap(), Metric::precision_at(5).unwrap());
        assert_eq!("Recall@10".parse::<Metric>().unwrap(), Metric::recall_at(10).unwrap());
        assert_eq!("map".parse::<Metric>().unwrap(), Metric::MeanAveragePrecision);
        assert_eq!(
            "map@3".parse::<Metric>().unwrap(),
            Metric::mean_average_precision_at(3).unwrap()
        );
        assert_eq!(Metric::ndcg_at(10).unwrap().to_string(), "ndcg@10");
        assert_eq!(Metric::MeanAveragePrecision.k(), None);

        assert!("ndcg".parse::<Metric>().is_err());
        assert!("ndcg@0".parse::<Metric>().is_err());
        assert!("mrr@5".parse::<Metric>().is_err());
        assert!("p@-1".parse::<Metric>().is_err());
    }
}
