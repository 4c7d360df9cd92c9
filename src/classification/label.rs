//! 生スコアから感情ラベルへの写像。
use super::{ModelPolarity, PolarityScore, SentimentLabel};

/// compound スコアがこの値を超えると Positive。
pub const POSITIVE_THRESHOLD: f64 = 0.5;
/// compound スコアがこの値を下回ると Negative。
pub const NEGATIVE_THRESHOLD: f64 = -0.5;

/// 固定ポリシーによるラベル写像。
///
/// レキシコンは閾値による三値判定、モデルは二値ラベルをそのまま通す。
/// モデル側に Neutral は存在しない。
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelMapper;

impl LabelMapper {
    #[must_use]
    pub fn map(self, score: PolarityScore) -> SentimentLabel {
        match score {
            PolarityScore::Compound(compound) if compound > POSITIVE_THRESHOLD => {
                SentimentLabel::Positive
            }
            PolarityScore::Compound(compound) if compound < NEGATIVE_THRESHOLD => {
                SentimentLabel::Negative
            }
            // NaN もここに落ちる
            PolarityScore::Compound(_) => SentimentLabel::Neutral,
            PolarityScore::Binary {
                polarity: ModelPolarity::Positive,
                ..
            } => SentimentLabel::Positive,
            PolarityScore::Binary {
                polarity: ModelPolarity::Negative,
                ..
            } => SentimentLabel::Negative,
        }
    }

    #[must_use]
    pub fn map_all(self, scores: &[PolarityScore]) -> Vec<SentimentLabel> {
        scores.iter().map(|score| self.map(*score)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.9, SentimentLabel::Positive)]
    #[case(0.500_001, SentimentLabel::Positive)]
    #[case(0.5, SentimentLabel::Neutral)]
    #[case(0.0, SentimentLabel::Neutral)]
    #[case(-0.5, SentimentLabel::Neutral)]
    #[case(-0.500_001, SentimentLabel::Negative)]
    #[case(-1.0, SentimentLabel::Negative)]
    #[case(f64::NAN, SentimentLabel::Neutral)]
    fn compound_thresholds_are_strict(#[case] compound: f64, #[case] expected: SentimentLabel) {
        assert_eq!(
            LabelMapper.map(PolarityScore::Compound(compound)),
            expected
        );
    }

    #[rstest]
    #[case(ModelPolarity::Positive, 0.51, SentimentLabel::Positive)]
    #[case(ModelPolarity::Positive, 0.99, SentimentLabel::Positive)]
    #[case(ModelPolarity::Negative, 0.5, SentimentLabel::Negative)]
    #[case(ModelPolarity::Negative, 0.0, SentimentLabel::Negative)]
    fn binary_labels_pass_through(
        #[case] polarity: ModelPolarity,
        #[case] confidence: f64,
        #[case] expected: SentimentLabel,
    ) {
        let label = LabelMapper.map(PolarityScore::Binary {
            polarity,
            confidence,
        });
        assert_eq!(label, expected);
    }

    #[test]
    fn mapping_is_deterministic() {
        let scores = [
            PolarityScore::Compound(0.7),
            PolarityScore::Compound(-0.2),
            PolarityScore::Binary {
                polarity: ModelPolarity::Negative,
                confidence: 0.8,
            },
        ];
        assert_eq!(LabelMapper.map_all(&scores), LabelMapper.map_all(&scores));
        assert_eq!(
            LabelMapper.map_all(&scores),
            vec![
                SentimentLabel::Positive,
                SentimentLabel::Neutral,
                SentimentLabel::Negative
            ]
        );
    }
}
