//! rankeval CLI - score ranking runs from the command line
//!
//! Usage:
//!   rankeval eval <input> -k 1 -k 5 -k 10     Full report at each cutoff
//!   rankeval eval <input> --format json       Report as JSON
//!   rankeval metric <input> ndcg@10           A single metric value
//!
//! Input files are JSON arrays (`.json`) or JSON Lines (`.jsonl`) of
//! `{"query_id": ..., "predictions": [...], "ground_truth": [...]}` records.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rankeval::{
    load_query_pairs, EvaluationConfig, EvaluationConfigBuilder, ExecutionMode, ItemKey, Metric,
    MetricsReport, RankingMetrics,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rankeval")]
#[command(about = "rankeval - ranking-quality metrics for retrieval runs")]
#[command(version)]
struct Cli {
    /// Score queries on the calling thread only
    #[arg(long, global = true)]
    sequential: bool,

    /// Worker threads for parallel scoring (default: all cores)
    #[arg(short, long, global = true, env = "RANKEVAL_THREADS")]
    threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute MAP plus precision/recall/MAP/NDCG at each cutoff
    Eval {
        /// Dataset file (.json or .jsonl)
        input: PathBuf,

        /// Cutoff depth; repeat for several
        #[arg(short, long = "k", default_values_t = vec![1, 5, 10])]
        k: Vec<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Compute a single metric (precision@k, recall@k, map, map@k, ndcg@k)
    Metric {
        /// Dataset file (.json or .jsonl)
        input: PathBuf,

        /// Metric name, e.g. ndcg@10
        metric: Metric,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = evaluation_config(cli.sequential, cli.threads);

    match cli.command {
        Commands::Eval { input, k, format } => cmd_eval(&input, &config, &k, format),
        Commands::Metric { input, metric } => cmd_metric(&input, &config, metric),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn,rankeval=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn evaluation_config(sequential: bool, threads: Option<usize>) -> EvaluationConfig {
    let mut builder = EvaluationConfigBuilder::new().mode(if sequential {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::Parallel
    });
    if let Some(threads) = threads {
        builder = builder.num_threads(threads);
    }
    builder.build()
}

fn load_metrics(
    input: &Path,
    config: &EvaluationConfig,
) -> anyhow::Result<RankingMetrics<ItemKey>> {
    let pairs = load_query_pairs::<ItemKey>(input)?;
    Ok(RankingMetrics::new(pairs).with_config(config)?)
}

fn cmd_eval(
    input: &Path,
    config: &EvaluationConfig,
    ks: &[usize],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let metrics = load_metrics(input, config)?;
    let report = metrics.report(ks)?;

    match format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Table => print_report(input, &report),
    }

    Ok(())
}

fn cmd_metric(input: &Path, config: &EvaluationConfig, metric: Metric) -> anyhow::Result<()> {
    let metrics = load_metrics(input, config)?;
    let value = metrics.evaluate(metric);

    println!("{} = {}", metric.to_string().cyan(), format!("{value:.6}").bold());

    Ok(())
}

fn print_report(input: &Path, report: &MetricsReport) {
    println!(
        "{}",
        format!("Ranking metrics for {}", input.display())
            .bold()
            .underline()
    );
    println!("  Queries:               {}", report.query_count);
    if report.empty_ground_truth_queries > 0 {
        println!(
            "  Empty ground truth:    {}",
            report.empty_ground_truth_queries.to_string().yellow()
        );
    }
    println!(
        "  MAP:                   {}",
        format!("{:.4}", report.mean_average_precision).green()
    );
    println!();

    if report.cutoffs.is_empty() {
        return;
    }

    println!(
        "{}",
        format!(
            "{:>6} {:>11} {:>11} {:>11} {:>11}",
            "k", "precision", "recall", "map", "ndcg"
        )
        .bold()
    );
    for cutoff in &report.cutoffs {
        println!(
            "{:>6} {:>11.4} {:>11.4} {:>11.4} {:>11.4}",
            cutoff.k.to_string().cyan(),
            cutoff.precision,
            cutoff.recall,
            cutoff.mean_average_precision,
            cutoff.ndcg
        );
    }
}
