//! 感情分類のバッチパイプライン。
//!
//! 正規化 → 一括分類 → ラベル写像 → 行への再結合を1回の実行で順に行う。
//! 各フェーズは前のフェーズが完了してから始まる。
mod batch;
mod normalize;
mod result;

pub use batch::{BatchPipeline, PipelineError};
pub use normalize::TextNormalizer;
pub use result::{LabeledResult, LabeledResultSet};
