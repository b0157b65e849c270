//! # rankeval - Ranking-quality metrics for retrieval and recommendation runs
//!
//! Scores a collection of (predicted ranking, ground-truth set) query pairs
//! with precision@k, recall@k, MAP, MAP@k and NDCG@k. Each query is scored
//! independently and the result is the unweighted mean over all queries.
//!
//! ```
//! use rankeval::RankingMetrics;
//!
//! let metrics = RankingMetrics::from_iterables(vec![
//!     (vec![1, 2, 3, 4, 5], vec![3, 2, 4]),
//! ]);
//! let precision = metrics.precision_at(3)?;
//! assert!((precision - 2.0 / 3.0).abs() < 1e-9);
//! # Ok::<(), rankeval::RankingError>(())
//! ```

pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod reduce;
pub mod report;
pub mod scoring;
pub mod types;

pub use dataset::{
    load_query_pairs, parse_query_pairs, parse_records, DatasetFormat, ItemKey, QueryRecord,
};
pub use diagnostics::{DiagnosticSink, QueryScopedSink, RecordingSink, TracingSink};
pub use error::{RankingError, Result};
pub use metrics::RankingMetrics;
pub use reduce::{
    EvaluationConfig, EvaluationConfigBuilder, ExecutionMode, MeanAccumulator, MeanReducer,
};
pub use report::{CutoffMetrics, MetricsReport};
pub use scoring::{average_precision_at_k, ndcg_at_k, truncated_hit_ratio, Metric};
pub use types::{QueryPair, RelevanceSet};
