//! Map-then-mean over a query collection, sequential or on a rayon pool

use crate::error::{RankingError, Result};
use crate::types::QueryPair;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::hash::Hash;
use std::sync::Arc;

/// How per-query scores are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Score queries one after another on the calling thread
    Sequential,
    /// Score queries on a rayon pool
    #[default]
    Parallel,
}

/// Evaluation configuration
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub mode: ExecutionMode,
    /// Dedicated pool size; `None` uses rayon's global pool
    pub num_threads: Option<usize>,
    /// Collections shorter than this are always reduced sequentially
    pub min_parallel_len: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            num_threads: None,
            min_parallel_len: 1024,
        }
    }
}

impl EvaluationConfig {
    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            ..Self::default()
        }
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct EvaluationConfigBuilder {
    config: EvaluationConfig,
}

impl EvaluationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = Some(threads);
        self
    }

    pub fn min_parallel_len(mut self, len: usize) -> Self {
        self.config.min_parallel_len = len;
        self
    }

    pub fn build(self) -> EvaluationConfig {
        self.config
    }
}

/// Running sum and count for an arithmetic mean.
///
/// The sum is Neumaier-compensated so that merging partial accumulators in
/// any grouping gives the same mean up to rounding far below metric
/// precision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    compensation: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, value: f64) -> Self {
        self.add(value);
        self.count += 1;
        self
    }

    /// Combine two partial accumulators
    pub fn merge(mut self, other: Self) -> Self {
        self.add(other.sum);
        self.add(other.compensation);
        self.count += other.count;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of everything pushed so far; 0.0 when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum + self.compensation) / self.count as f64
    }

    fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }
}

impl FromIterator<f64> for MeanAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::push)
    }
}

/// Maps a scoring function over every query pair and returns the mean.
#[derive(Clone)]
pub struct MeanReducer {
    mode: ExecutionMode,
    min_parallel_len: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl std::fmt::Debug for MeanReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeanReducer")
            .field("mode", &self.mode)
            .field("min_parallel_len", &self.min_parallel_len)
            .field(
                "pool_threads",
                &self.pool.as_ref().map(|p| p.current_num_threads()),
            )
            .finish()
    }
}

impl Default for MeanReducer {
    fn default() -> Self {
        let config = EvaluationConfig::default();
        Self {
            mode: config.mode,
            min_parallel_len: config.min_parallel_len,
            pool: None,
        }
    }
}

impl MeanReducer {
    pub fn from_config(config: &EvaluationConfig) -> Result<Self> {
        if config.num_threads == Some(0) {
            return Err(RankingError::Configuration(
                "num_threads must be at least 1".to_string(),
            ));
        }

        let pool = match (config.mode, config.num_threads) {
            (ExecutionMode::Parallel, Some(threads)) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("rankeval-worker-{i}"))
                    .build()
                    .map_err(|e| {
                        RankingError::Configuration(format!("failed to build thread pool: {e}"))
                    })?;
                Some(Arc::new(pool))
            }
            _ => None,
        };

        Ok(Self {
            mode: config.mode,
            min_parallel_len: config.min_parallel_len,
            pool,
        })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Score every pair and return the arithmetic mean (0.0 for no pairs).
    ///
    /// `score` receives the pair's position in the collection. It must not
    /// depend on evaluation order; pairs may be scored concurrently.
    pub fn mean<T, F>(&self, pairs: &[QueryPair<T>], score: F) -> f64
    where
        T: Eq + Hash + Sync,
        F: Fn(usize, &QueryPair<T>) -> f64 + Sync,
    {
        let parallel =
            self.mode == ExecutionMode::Parallel && pairs.len() >= self.min_parallel_len.max(1);

        let acc = if !parallel {
            pairs
                .iter()
                .enumerate()
                .map(|(i, pair)| score(i, pair))
                .collect::<MeanAccumulator>()
        } else {
            let run = || {
                pairs
                    .par_iter()
                    .enumerate()
                    .fold(MeanAccumulator::new, |acc, (i, pair)| acc.push(score(i, pair)))
                    .reduce(MeanAccumulator::new, MeanAccumulator::merge)
            };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        };

        acc.mean()
    }
}
