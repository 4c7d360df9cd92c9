use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::classification::{
    ClassifierError, LabelMapper, LabelSet, SentimentClassifier, SentimentLabel,
};
use crate::config::Config;
use crate::dataset::{RecordSet, SchemaError};
use crate::observability::{Metrics, Phase};

use super::normalize::TextNormalizer;
use super::result::{LabeledResult, LabeledResultSet};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("row {row} was labeled {label}, which is outside the {label_set} label set")]
    LabelOutsideSet {
        row: usize,
        label: SentimentLabel,
        label_set: LabelSet,
    },
}

/// 正規化、一括分類、ラベル写像、行への再結合を順に行うパイプライン。
///
/// 分類器は構築時に一度だけ受け取る。実行中に分類器の種類で分岐することはない。
pub struct BatchPipeline {
    classifier: Arc<dyn SentimentClassifier>,
    normalizer: TextNormalizer,
    mapper: LabelMapper,
    metrics: Option<Arc<Metrics>>,
}

impl std::fmt::Debug for BatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPipeline")
            .field("classifier", &self.classifier.name())
            .field("normalizer", &self.normalizer)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl BatchPipeline {
    #[must_use]
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            classifier,
            normalizer: TextNormalizer::default(),
            mapper: LabelMapper,
            metrics: None,
        }
    }

    /// 設定の文字数上限を使うパイプラインを作る。
    #[must_use]
    pub fn from_config(config: &Config, classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self::new(classifier).with_normalizer(TextNormalizer::new(config.max_text_chars()))
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn classifier(&self) -> &Arc<dyn SentimentClassifier> {
        &self.classifier
    }

    #[must_use]
    pub fn label_set(&self) -> LabelSet {
        self.classifier.label_set()
    }

    /// `records` の `text_column` 列を分類し、全行にラベルを付けて返す。
    ///
    /// 列の検証は行数に関係なく分類より前に行う。行数 0 の入力は空の結果集合になる。
    ///
    /// # Errors
    /// 列が存在しない・対象列を欠く行がある場合は [`PipelineError::Schema`]、
    /// 分類器が失敗した場合は [`PipelineError::Classifier`]。
    pub fn run(
        &self,
        records: RecordSet,
        text_column: &str,
    ) -> Result<LabeledResultSet, PipelineError> {
        let span = tracing::info_span!(
            "pipeline.run",
            classifier = self.classifier.name(),
            records = records.len()
        );
        let _guard = span.enter();
        tracing::info!(column = text_column, "pipeline run started");

        if let Some(metrics) = &self.metrics {
            metrics.runs_total.inc();
        }
        let result = self.execute(records, text_column);
        if let Err(error) = &result {
            if let Some(metrics) = &self.metrics {
                metrics.runs_failed.inc();
            }
            tracing::warn!(error = %error, "pipeline run failed");
        }
        result
    }

    fn execute(
        &self,
        records: RecordSet,
        text_column: &str,
    ) -> Result<LabeledResultSet, PipelineError> {
        let label_set = self.classifier.label_set();
        let started = Instant::now();
        let column = records.text_column(text_column)?;

        if records.is_empty() {
            tracing::warn!(column = text_column, "no records to classify");
            let (columns, _) = records.into_parts();
            return Ok(LabeledResultSet::from_parts(columns, label_set, Vec::new()));
        }

        let phase_start = Instant::now();
        let texts = self
            .normalizer
            .normalize_all(records.text_records(column).map(|record| record.value));
        self.observe(Phase::Normalize, phase_start);
        tracing::debug!(
            texts = texts.len(),
            max_chars = self.normalizer.max_chars().get(),
            "normalized texts"
        );

        let phase_start = Instant::now();
        let scores = self.classifier.classify_batch(&texts)?;
        if scores.len() != texts.len() {
            return Err(ClassifierError::BatchLength {
                expected: texts.len(),
                actual: scores.len(),
            }
            .into());
        }
        self.observe(Phase::Classify, phase_start);
        tracing::debug!(scores = scores.len(), "classified batch");

        let phase_start = Instant::now();
        let labels = self.mapper.map_all(&scores);
        if let Some((row, label)) = labels
            .iter()
            .enumerate()
            .find(|(_, label)| !label_set.contains(**label))
        {
            return Err(PipelineError::LabelOutsideSet {
                row,
                label: *label,
                label_set,
            });
        }
        self.observe(Phase::Map, phase_start);

        if let Some(metrics) = &self.metrics {
            metrics.record_labels(&labels);
        }

        let (columns, rows) = records.into_parts();
        let results = rows
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(index, (row, label))| LabeledResult::new(index, label, row))
            .collect::<Vec<_>>();

        tracing::info!(
            records = results.len(),
            label_set = %label_set,
            elapsed_ms = started.elapsed().as_millis(),
            "pipeline run completed"
        );
        Ok(LabeledResultSet::from_parts(columns, label_set, results))
    }

    fn observe(&self, phase: Phase, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.observe_phase(phase, started.elapsed());
        }
    }
}
