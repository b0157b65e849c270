//! Loading query pairs from JSON / JSON Lines files
//!
//! Each record looks like
//! `{"query_id": "q1", "predictions": [1, 2, 3], "ground_truth": [2, 5]}`.
//! `query_id` is optional and item ids may be strings or integers.

use crate::error::{RankingError, Result};
use crate::types::QueryPair;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::path::Path;

/// An item identifier as it appears in an input file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Int(i64),
    /// Unsigned ids above `i64::MAX`, e.g. 64-bit hashes
    UInt(u64),
    Text(String),
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::UInt(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// One raw input record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord<T = ItemKey> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(default = "Vec::new")]
    pub predictions: Vec<T>,
    #[serde(default = "Vec::new", alias = "labels", alias = "relevant")]
    pub ground_truth: Vec<T>,
}

impl<T: Eq + Hash> From<QueryRecord<T>> for QueryPair<T> {
    fn from(record: QueryRecord<T>) -> Self {
        QueryPair::new(record.predictions, record.ground_truth)
    }
}

/// Input file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// A single JSON array of records
    Json,
    /// One record per line
    JsonLines,
}

impl DatasetFormat {
    /// Pick the format from a file extension (`.json`, `.jsonl`, `.ndjson`)
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(Self::Json),
            Some("jsonl") | Some("ndjson") => Ok(Self::JsonLines),
            other => Err(RankingError::Dataset(format!(
                "unsupported dataset extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Parse raw records from `input`
pub fn parse_records<T: DeserializeOwned>(
    input: &str,
    format: DatasetFormat,
) -> Result<Vec<QueryRecord<T>>> {
    match format {
        DatasetFormat::Json => Ok(serde_json::from_str(input)?),
        DatasetFormat::JsonLines => input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| {
                    RankingError::Dataset(format!("line {}: {}", idx + 1, e))
                })
            })
            .collect(),
    }
}

/// Parse `input` straight into query pairs
pub fn parse_query_pairs<T>(input: &str, format: DatasetFormat) -> Result<Vec<QueryPair<T>>>
where
    T: DeserializeOwned + Eq + Hash,
{
    Ok(parse_records(input, format)?
        .into_iter()
        .map(QueryPair::from)
        .collect())
}

/// Read and parse a dataset file, choosing the format from its extension
pub fn load_query_pairs<T>(path: impl AsRef<Path>) -> Result<Vec<QueryPair<T>>>
where
    T: DeserializeOwned + Eq + Hash,
{
    let path = path.as_ref();
    let format = DatasetFormat::from_path(path)?;
    let input = std::fs::read_to_string(path)?;
    let pairs = parse_query_pairs(&input, format)?;
    tracing::info!("Loaded {} queries from {}", pairs.len(), path.display());
    Ok(pairs)
}
