//! 感情分類のための高水準API。
use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ClassifierKind, Config, UnsupportedValue};

mod label;
mod lexicon;
mod model;
mod tokenizer;

pub use label::{LabelMapper, NEGATIVE_THRESHOLD, POSITIVE_THRESHOLD};
pub use lexicon::{LexiconClassifier, LexiconTable};
pub use model::{BertSentimentBackend, ModelClassifier, ModelPrediction, SentimentBackend};

/// 正規化済みの感情ラベル。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown sentiment label `{0}`")]
pub struct UnknownLabel(pub String);

impl FromStr for SentimentLabel {
    type Err = UnknownLabel;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Positive" => Ok(Self::Positive),
            "Negative" => Ok(Self::Negative),
            "Neutral" => Ok(Self::Neutral),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// 分類器が出力しうるラベル集合。
///
/// 二値モデルは `Binary`、レキシコンは三値の `Ternary` を宣言する。
/// 一回の実行で複数の集合が混在することはない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSet {
    Binary,
    Ternary,
}

impl LabelSet {
    #[must_use]
    pub fn labels(self) -> &'static [SentimentLabel] {
        match self {
            Self::Binary => &[SentimentLabel::Positive, SentimentLabel::Negative],
            Self::Ternary => &[
                SentimentLabel::Positive,
                SentimentLabel::Negative,
                SentimentLabel::Neutral,
            ],
        }
    }

    #[must_use]
    pub fn contains(self, label: SentimentLabel) -> bool {
        self.labels().contains(&label)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => f.write_str("binary"),
            Self::Ternary => f.write_str("ternary"),
        }
    }
}

impl FromStr for LabelSet {
    type Err = UnsupportedValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            "ternary" => Ok(Self::Ternary),
            _ => Err(UnsupportedValue::new(raw, "binary, ternary")),
        }
    }
}

/// 二値モデルが返す極性。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPolarity {
    Positive,
    Negative,
}

/// ラベル写像前の生スコア。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolarityScore {
    /// レキシコンの compound スコア (-1.0〜1.0)。
    Compound(f64),
    /// モデルのラベルと確信度。
    Binary {
        polarity: ModelPolarity,
        confidence: f64,
    },
}

/// 分類器に渡せる形に整えたテキスト。`TextNormalizer` だけが生成する。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to initialize {resource}: {source}")]
    Configuration {
        resource: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("classifier returned {actual} scores for {expected} inputs")]
    BatchLength { expected: usize, actual: usize },
}

impl ClassifierError {
    pub(crate) fn configuration(resource: &'static str, source: anyhow::Error) -> Self {
        Self::Configuration { resource, source }
    }
}

/// 感情分類器の共通インターフェース。
///
/// 出力は入力と同じ長さ・同じ順序でなければならない。空文字列でも失敗せず、
/// 既定のスコアを返す。
pub trait SentimentClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn label_set(&self) -> LabelSet;

    /// # Errors
    /// 推論バックエンドが失敗した場合、または出力件数が入力と一致しない場合。
    fn classify_batch(
        &self,
        texts: &[NormalizedText],
    ) -> Result<Vec<PolarityScore>, ClassifierError>;
}

/// 設定に従って分類器を一度だけ構築する。
///
/// 分類器の種類で分岐するのはここだけで、以降は [`SentimentClassifier`] 越しに扱う。
///
/// # Errors
/// レキシコンやモデルの読み込みに失敗した場合は [`ClassifierError::Configuration`] を返す。
pub fn build_classifier(config: &Config) -> Result<Arc<dyn SentimentClassifier>, ClassifierError> {
    match config.classifier_kind() {
        ClassifierKind::Lexicon => {
            let table = match config.lexicon_path() {
                Some(path) => LexiconTable::from_path(path)?,
                None => LexiconTable::builtin()?,
            };
            tracing::info!(entries = table.len(), "lexicon classifier ready");
            Ok(Arc::new(LexiconClassifier::new(table)))
        }
        ClassifierKind::Model => {
            let classifier = ModelClassifier::load(config.model_batch_size())?;
            tracing::info!(
                batch_size = config.model_batch_size().get(),
                "model classifier ready"
            );
            Ok(Arc::new(classifier))
        }
    }
}
