use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use rust_bert::pipelines::sentiment::{SentimentConfig, SentimentModel, SentimentPolarity};

use super::{
    ClassifierError, LabelSet, ModelPolarity, NormalizedText, PolarityScore, SentimentClassifier,
};

const MODEL_RESOURCE: &str = "sentiment model";

/// モデルが1件ごとに返すラベルと確信度。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrediction {
    pub polarity: ModelPolarity,
    pub confidence: f64,
}

/// 二値感情モデルの推論バックエンド。
///
/// 入力1件につき1件の予測を同じ順序で返すこと。
pub trait SentimentBackend: Send + Sync {
    /// # Errors
    /// 推論に失敗した場合は [`ClassifierError::Inference`]。
    fn predict(&self, texts: &[&str]) -> Result<Vec<ModelPrediction>, ClassifierError>;
}

/// Sentiment model using rust-bert (DistilBERT fine-tuned on SST-2).
pub struct BertSentimentBackend {
    model: Mutex<SentimentModel>,
}

impl std::fmt::Debug for BertSentimentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertSentimentBackend")
            .field("model", &"<SentimentModel>")
            .finish()
    }
}

impl BertSentimentBackend {
    /// Initialize the sentiment model.
    /// The first run downloads the weights, so this can take a while.
    ///
    /// # Errors
    /// Returns [`ClassifierError::Configuration`] when the weights cannot be
    /// fetched or loaded.
    pub fn load() -> Result<Self, ClassifierError> {
        // Model construction is blocking and heavy; keep it off the caller's thread.
        let model = std::thread::spawn(|| SentimentModel::new(SentimentConfig::default()))
            .join()
            .map_err(|_| {
                ClassifierError::configuration(
                    MODEL_RESOURCE,
                    anyhow::anyhow!("model initialization thread panicked"),
                )
            })?
            .map_err(|error| {
                ClassifierError::configuration(MODEL_RESOURCE, anyhow::Error::new(error))
            })?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl SentimentBackend for BertSentimentBackend {
    fn predict(&self, texts: &[&str]) -> Result<Vec<ModelPrediction>, ClassifierError> {
        let model = self
            .model
            .lock()
            .map_err(|_| ClassifierError::Inference("sentiment model lock poisoned".to_string()))?;
        Ok(model
            .predict(texts)
            .into_iter()
            .map(|sentiment| ModelPrediction {
                polarity: match sentiment.polarity {
                    SentimentPolarity::Positive => ModelPolarity::Positive,
                    SentimentPolarity::Negative => ModelPolarity::Negative,
                },
                confidence: sentiment.score,
            })
            .collect())
    }
}

/// 事前学習済み二値モデルによる分類器。
///
/// バックエンドは一度だけ構築し、`Clone` したハンドル間で共有する。
/// 構築後に状態は変化しない。
#[derive(Clone)]
pub struct ModelClassifier {
    backend: Arc<dyn SentimentBackend>,
    batch_size: NonZeroUsize,
}

impl std::fmt::Debug for ModelClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClassifier")
            .field("backend", &"<dyn SentimentBackend>")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl ModelClassifier {
    #[must_use]
    pub fn new(backend: Arc<dyn SentimentBackend>, batch_size: NonZeroUsize) -> Self {
        Self {
            backend,
            batch_size,
        }
    }

    /// rust-bert のモデルを読み込んで分類器を作る。
    ///
    /// # Errors
    /// モデルの初期化に失敗した場合は [`ClassifierError::Configuration`]。
    pub fn load(batch_size: NonZeroUsize) -> Result<Self, ClassifierError> {
        let backend = BertSentimentBackend::load()?;
        Ok(Self::new(Arc::new(backend), batch_size))
    }

    #[must_use]
    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }
}

impl SentimentClassifier for ModelClassifier {
    fn name(&self) -> &'static str {
        "model"
    }

    fn label_set(&self) -> LabelSet {
        LabelSet::Binary
    }

    fn classify_batch(
        &self,
        texts: &[NormalizedText],
    ) -> Result<Vec<PolarityScore>, ClassifierError> {
        let mut scores = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size.get()) {
            let inputs = chunk
                .iter()
                .map(NormalizedText::as_str)
                .collect::<Vec<_>>();
            let predictions = self.backend.predict(&inputs)?;
            if predictions.len() != inputs.len() {
                return Err(ClassifierError::BatchLength {
                    expected: inputs.len(),
                    actual: predictions.len(),
                });
            }
            scores.extend(predictions.into_iter().map(|prediction| {
                PolarityScore::Binary {
                    polarity: prediction.polarity,
                    confidence: prediction.confidence,
                }
            }));
        }
        tracing::debug!(
            texts = texts.len(),
            batch_size = self.batch_size.get(),
            "model batch inference finished"
        );
        Ok(scores)
    }
}
