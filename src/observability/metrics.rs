//! Prometheusメトリクス定義。
use std::time::Duration;

use prometheus::{
    HistogramVec, IntCounter, IntCounterVec, Registry, register_histogram_vec_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
};

use crate::classification::SentimentLabel;

/// パイプラインのフェーズ名。`sentiment_phase_duration_seconds` のラベルになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Normalize,
    Classify,
    Map,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::Classify => "classify",
            Self::Map => "map",
        }
    }
}

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub runs_total: IntCounter,
    pub runs_failed: IntCounter,
    pub records_total: IntCounter,
    pub labels_total: IntCounterVec,

    // ヒストグラム
    pub phase_duration: HistogramVec,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成し、`registry` に登録する。
    ///
    /// # Errors
    /// 同名のメトリクスが既に登録されている場合。
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            runs_total: register_int_counter_with_registry!(
                "sentiment_runs_total",
                "Total number of pipeline runs started",
                registry
            )?,
            runs_failed: register_int_counter_with_registry!(
                "sentiment_runs_failed_total",
                "Total number of pipeline runs that failed",
                registry
            )?,
            records_total: register_int_counter_with_registry!(
                "sentiment_records_total",
                "Total number of records labeled",
                registry
            )?,
            labels_total: register_int_counter_vec_with_registry!(
                "sentiment_labels_total",
                "Number of records per assigned sentiment label",
                &["label"],
                registry
            )?,
            phase_duration: register_histogram_vec_with_registry!(
                "sentiment_phase_duration_seconds",
                "Duration of each pipeline phase in seconds",
                &["phase"],
                registry
            )?,
        })
    }

    pub fn observe_phase(&self, phase: Phase, elapsed: Duration) {
        self.phase_duration
            .with_label_values(&[phase.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_labels(&self, labels: &[SentimentLabel]) {
        self.records_total.inc_by(labels.len() as u64);
        for label in labels {
            self.labels_total.with_label_values(&[label.as_str()]).inc();
        }
    }
}
