//! レキシコン照合用の英語トークナイザ。
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WordToken {
    pub(crate) surface: String,
    pub(crate) lower: String,
}

impl WordToken {
    /// 2文字以上の英字をすべて大文字で書いた語。
    pub(crate) fn is_shouting(&self) -> bool {
        let letters: Vec<char> = self.surface.chars().filter(|c| c.is_alphabetic()).collect();
        letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
    }
}

/// UAX#29 の単語境界で分割し、英数字を含む語だけを残す。
///
/// `don't` のような短縮形は1語として保持する。
pub(crate) fn tokenize(text: &str) -> Vec<WordToken> {
    let normalized = text.nfc().collect::<String>();
    normalized
        .split_word_bounds()
        .filter(|piece| piece.chars().any(char::is_alphanumeric))
        .map(|piece| {
            let surface = piece.replace('\u{2019}', "'");
            let lower = surface.to_lowercase();
            WordToken { surface, lower }
        })
        .collect()
}

/// 一部の語だけが大文字で書かれているか。
pub(crate) fn has_caps_differential(tokens: &[WordToken]) -> bool {
    let shouting = tokens.iter().filter(|token| token.is_shouting()).count();
    shouting > 0 && shouting < tokens.len()
}

pub(crate) fn count_exclamations(text: &str) -> usize {
    text.chars().filter(|c| *c == '!').count()
}
