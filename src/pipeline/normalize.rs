use std::num::NonZeroUsize;

use unicode_normalization::UnicodeNormalization;

use crate::classification::NormalizedText;
use crate::config::DEFAULT_MAX_TEXT_CHARS;
use crate::dataset::CellValue;

/// 任意のセル値を分類器入力に整える。
///
/// 欠損値は空文字列、それ以外は表示形式の文字列に変換し、NFC 正規化のうえ
/// 先頭 `max_chars` 文字だけを残す。失敗することはない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextNormalizer {
    max_chars: NonZeroUsize,
}

impl TextNormalizer {
    #[must_use]
    pub fn new(max_chars: NonZeroUsize) -> Self {
        Self { max_chars }
    }

    #[must_use]
    pub fn max_chars(&self) -> NonZeroUsize {
        self.max_chars
    }

    #[must_use]
    pub fn normalize(&self, raw: &CellValue) -> NormalizedText {
        if raw.is_missing() {
            return NormalizedText::default();
        }
        let text = raw.to_string();
        NormalizedText::new(text.nfc().take(self.max_chars.get()).collect())
    }

    pub fn normalize_all<'a, I>(&self, values: I) -> Vec<NormalizedText>
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        values
            .into_iter()
            .map(|value| self.normalize(value))
            .collect()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_MAX_TEXT_CHARS).unwrap_or(NonZeroUsize::MIN))
    }
}
