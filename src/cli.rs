//! コマンドライン定義と各サブコマンドの処理本体。
use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::classification::{LabelSet, build_classifier};
use crate::config::{ClassifierKind, Config};
use crate::dataset::RecordSet;
use crate::export::{load_results, save_results};
use crate::observability::Metrics;
use crate::pipeline::BatchPipeline;
use crate::summary::{
    JointDistribution, LabelCount, LabelProportion, ResultAggregator, ScatterPoint, Summary,
};

#[derive(Parser, Debug)]
#[command(name = "review-sentiment", author, version, about, long_about = None)]
pub struct Cli {
    /// Print Prometheus metrics to stderr when the command finishes
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Label every row of a table and write the results file
    Analyze(AnalyzeArgs),
    /// Summarize a results file for pie, histogram and scatter views
    Summarize(SummarizeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Input table: headered CSV, or a JSON value grid (`{"values": [[...], ...]}`)
    #[arg(long, short)]
    pub input: PathBuf,

    /// Column holding the review text
    #[arg(long, short)]
    pub column: String,

    /// Classifier variant (lexicon or model)
    #[arg(long, env = "SENTIMENT_CLASSIFIER")]
    pub classifier: Option<ClassifierKind>,

    /// Results file to write
    #[arg(long, short, env = "SENTIMENT_RESULTS_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum characters kept per text
    #[arg(long, env = "SENTIMENT_MAX_TEXT_CHARS")]
    pub max_chars: Option<NonZeroUsize>,
}

impl AnalyzeArgs {
    /// 指定されたオプションで設定を上書きする。
    #[must_use]
    pub fn apply(&self, config: Config) -> Config {
        let mut config = config;
        if let Some(kind) = self.classifier {
            config = config.with_classifier_kind(kind);
        }
        if let Some(output) = &self.output {
            config = config.with_results_path(output);
        }
        if let Some(max_chars) = self.max_chars {
            config = config.with_max_text_chars(max_chars);
        }
        config
    }
}

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Results file written by `analyze`
    #[arg(long, short, env = "SENTIMENT_RESULTS_PATH")]
    pub results: Option<PathBuf>,

    /// Column for the joint distribution (histogram view)
    #[arg(long)]
    pub by: Option<String>,

    /// Column for the scatter view
    #[arg(long)]
    pub scatter: Option<String>,

    /// Label set the results were produced with
    #[arg(long, default_value = "ternary")]
    pub label_set: LabelSet,
}

/// 入力ファイルの形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    ValueGrid,
}

impl InputFormat {
    /// 拡張子 `.json` は値グリッド、それ以外は CSV とみなす。
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::ValueGrid,
            _ => Self::Csv,
        }
    }
}

/// # Errors
/// ファイルを開けない、または内容を解析できない場合。
pub fn read_records(path: &Path) -> Result<RecordSet> {
    let records = match InputFormat::from_path(path) {
        InputFormat::ValueGrid => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RecordSet::from_values_json(&raw)
        }
        InputFormat::Csv => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            RecordSet::from_csv_reader(BufReader::new(file))
        }
    }
    .with_context(|| format!("failed to decode {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = records.len(),
        columns = records.columns().len(),
        "input table loaded"
    );
    Ok(records)
}

#[derive(Debug, Serialize)]
pub struct AnalyzeReport {
    pub classifier: &'static str,
    pub label_set: LabelSet,
    pub column: String,
    pub rows: usize,
    pub output: PathBuf,
    pub label_counts: Summary<Vec<LabelCount>>,
}

/// 入力を読み込んで分類し、結果ファイルを書き出す。
///
/// # Errors
/// 入力の読み込み、分類器の初期化、パイプライン実行、書き出しのいずれかが失敗した場合。
pub fn analyze(
    args: &AnalyzeArgs,
    config: &Config,
    metrics: Option<Arc<Metrics>>,
) -> Result<AnalyzeReport> {
    let config = args.apply(config.clone());
    let records = read_records(&args.input)?;
    let classifier = build_classifier(&config).context("failed to initialize classifier")?;

    let mut pipeline = BatchPipeline::from_config(&config, classifier);
    if let Some(metrics) = metrics {
        pipeline = pipeline.with_metrics(metrics);
    }
    let results = pipeline
        .run(records, &args.column)
        .with_context(|| format!("failed to label column `{}`", args.column))?;

    save_results(&results, config.results_path()).context("failed to save results")?;

    Ok(AnalyzeReport {
        classifier: pipeline.classifier().name(),
        label_set: results.label_set(),
        column: args.column.clone(),
        rows: results.len(),
        output: config.results_path().to_path_buf(),
        label_counts: ResultAggregator.label_counts(&results),
    })
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub results: PathBuf,
    pub rows: usize,
    pub label_set: LabelSet,
    pub label_counts: Summary<Vec<LabelCount>>,
    pub proportions: Summary<Vec<LabelProportion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joint_distribution: Option<Summary<JointDistribution>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scatter: Option<Summary<Vec<ScatterPoint>>>,
}

/// 結果ファイルを読み込み、集計ビューをまとめる。
///
/// # Errors
/// 結果ファイルが読めない、または指定列が存在しない場合。
pub fn summarize(args: &SummarizeArgs, config: &Config) -> Result<SummaryReport> {
    let path = args
        .results
        .clone()
        .unwrap_or_else(|| config.results_path().to_path_buf());
    let results = load_results(&path, args.label_set)
        .with_context(|| format!("failed to load results from {}", path.display()))?;

    let aggregator = ResultAggregator;
    let joint_distribution = args
        .by
        .as_deref()
        .map(|column| aggregator.joint_distribution(&results, column))
        .transpose()?;
    let scatter = args
        .scatter
        .as_deref()
        .map(|column| aggregator.scatter_pairs(&results, column))
        .transpose()?;

    Ok(SummaryReport {
        rows: results.len(),
        label_set: results.label_set(),
        label_counts: aggregator.label_counts(&results),
        proportions: aggregator.proportions(&results),
        joint_distribution,
        scatter,
        results: path,
    })
}
