//! ラベル付き結果集合の集計ビュー。
//!
//! いずれも結果集合を読むだけの純粋な計算で、呼び出しのたびに再計算する。
use std::collections::BTreeMap;

use serde::Serialize;

use crate::classification::SentimentLabel;
use crate::dataset::{SENTIMENT_COLUMN, SchemaError};
use crate::pipeline::{LabeledResult, LabeledResultSet};

/// 集計結果。入力が空のときは計算せずに `NoData` を返す。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Summary<T> {
    NoData,
    Ready(T),
}

impl<T> Summary<T> {
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::NoData => None,
            Self::Ready(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: SentimentLabel,
    pub count: usize,
}

/// 円グラフ用の割合。`percentage` は 0〜100。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelProportion {
    pub label: SentimentLabel,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JointCount {
    pub value: String,
    pub label: SentimentLabel,
    pub count: usize,
}

/// ヒストグラム用の (列の値, ラベル) ごとの件数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JointDistribution {
    pub column: String,
    pub counts: Vec<JointCount>,
}

impl JointDistribution {
    #[must_use]
    pub fn count(&self, value: &str, label: SentimentLabel) -> usize {
        self.counts
            .iter()
            .find(|entry| entry.value == value && entry.label == label)
            .map_or(0, |entry| entry.count)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().map(|entry| entry.count).sum()
    }
}

/// 散布図用の1点。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScatterPoint {
    pub index: usize,
    pub value: String,
    pub label: SentimentLabel,
}

/// [`LabeledResultSet`] の読み取り専用集計。
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// 宣言済みラベル集合の各ラベルの件数。出現しないラベルは 0 件。
    #[must_use]
    pub fn label_counts(self, results: &LabeledResultSet) -> Summary<Vec<LabelCount>> {
        if results.is_empty() {
            tracing::warn!("label counts requested for an empty result set");
            return Summary::NoData;
        }
        let mut counts = BTreeMap::new();
        for label in results.labels() {
            *counts.entry(label).or_insert(0_usize) += 1;
        }
        Summary::Ready(
            results
                .label_set()
                .labels()
                .iter()
                .map(|label| LabelCount {
                    label: *label,
                    count: counts.get(label).copied().unwrap_or(0),
                })
                .collect(),
        )
    }

    /// 各ラベルの割合 (百分率)。合計は丸め誤差の範囲で 100 になる。
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn proportions(self, results: &LabeledResultSet) -> Summary<Vec<LabelProportion>> {
        let counts = match self.label_counts(results) {
            Summary::NoData => return Summary::NoData,
            Summary::Ready(counts) => counts,
        };
        let total = results.len() as f64;
        Summary::Ready(
            counts
                .into_iter()
                .map(|entry| LabelProportion {
                    label: entry.label,
                    percentage: entry.count as f64 / total * 100.0,
                })
                .collect(),
        )
    }

    /// `column` の値とラベルの同時度数。
    ///
    /// 欠損値は空文字列の値として数える。`column` に `Sentiment` を指定すると
    /// ラベル自身を値として扱う。
    ///
    /// # Errors
    /// `column` が結果集合に存在しない場合は [`SchemaError::MissingColumn`]。
    pub fn joint_distribution(
        self,
        results: &LabeledResultSet,
        column: &str,
    ) -> Result<Summary<JointDistribution>, SchemaError> {
        let value_of = column_reader(results, column)?;
        if results.is_empty() {
            tracing::warn!(column, "joint distribution requested for an empty result set");
            return Ok(Summary::NoData);
        }

        let mut counts: BTreeMap<(String, SentimentLabel), usize> = BTreeMap::new();
        for result in results {
            *counts.entry((value_of(result), result.label())).or_insert(0) += 1;
        }
        Ok(Summary::Ready(JointDistribution {
            column: column.to_string(),
            counts: counts
                .into_iter()
                .map(|((value, label), count)| JointCount {
                    value,
                    label,
                    count,
                })
                .collect(),
        }))
    }

    /// 行ごとの (`column` の値, ラベル) の組。行順を保つ。
    ///
    /// # Errors
    /// `column` が結果集合に存在しない場合は [`SchemaError::MissingColumn`]。
    pub fn scatter_pairs(
        self,
        results: &LabeledResultSet,
        column: &str,
    ) -> Result<Summary<Vec<ScatterPoint>>, SchemaError> {
        let value_of = column_reader(results, column)?;
        if results.is_empty() {
            tracing::warn!(column, "scatter pairs requested for an empty result set");
            return Ok(Summary::NoData);
        }
        Ok(Summary::Ready(
            results
                .iter()
                .map(|result| ScatterPoint {
                    index: result.index(),
                    value: value_of(result),
                    label: result.label(),
                })
                .collect(),
        ))
    }
}

fn column_reader(
    results: &LabeledResultSet,
    column: &str,
) -> Result<Box<dyn Fn(&LabeledResult) -> String>, SchemaError> {
    if let Some(index) = results.column_index(column) {
        return Ok(Box::new(move |result: &LabeledResult| result.value(index).to_string()));
    }
    if column == SENTIMENT_COLUMN {
        return Ok(Box::new(|result: &LabeledResult| result.label().to_string()));
    }
    Err(SchemaError::MissingColumn {
        column: column.to_string(),
        available: results.columns().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::LabelSet;
    use crate::dataset::CellValue;

    fn results(rows: &[(&str, Option<&str>, SentimentLabel)]) -> LabeledResultSet {
        LabeledResultSet::new(
            vec!["review".into(), "gender".into()],
            LabelSet::Ternary,
            rows.iter()
                .map(|(review, gender, label)| {
                    (
                        vec![CellValue::from(*review), CellValue::from(*gender)],
                        *label,
                    )
                })
                .collect(),
        )
        .expect("valid results")
    }

    fn sample() -> LabeledResultSet {
        results(&[
            ("great", Some("F"), SentimentLabel::Positive),
            ("awful", Some("M"), SentimentLabel::Negative),
            ("fine", Some("F"), SentimentLabel::Positive),
            ("box", None, SentimentLabel::Neutral),
        ])
    }

    #[test]
    fn proportions_sum_to_one_hundred() {
        let summary = ResultAggregator.proportions(&sample());
        let proportions = summary.ready().expect("data");

        let total: f64 = proportions.iter().map(|entry| entry.percentage).sum();
        assert!((total - 100.0).abs() < 0.01);
        assert_eq!(proportions[0].label, SentimentLabel::Positive);
        assert!((proportions[0].percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn thirds_still_sum_to_one_hundred() {
        let set = results(&[
            ("a", None, SentimentLabel::Positive),
            ("b", None, SentimentLabel::Negative),
            ("c", None, SentimentLabel::Neutral),
        ]);
        let summary = ResultAggregator.proportions(&set);
        let total: f64 = summary
            .ready()
            .expect("data")
            .iter()
            .map(|entry| entry.percentage)
            .sum();
        assert!((total - 100.0).abs() < 0.01);
    }

    #[test]
    fn absent_labels_are_reported_as_zero() {
        let set = results(&[("a", None, SentimentLabel::Positive)]);
        let counts = ResultAggregator.label_counts(&set);
        assert_eq!(
            counts,
            Summary::Ready(vec![
                LabelCount {
                    label: SentimentLabel::Positive,
                    count: 1
                },
                LabelCount {
                    label: SentimentLabel::Negative,
                    count: 0
                },
                LabelCount {
                    label: SentimentLabel::Neutral,
                    count: 0
                },
            ])
        );
    }

    #[test]
    fn empty_results_signal_no_data() {
        let empty = results(&[]);
        assert!(ResultAggregator.proportions(&empty).is_no_data());
        assert!(ResultAggregator.label_counts(&empty).is_no_data());
        assert!(
            ResultAggregator
                .joint_distribution(&empty, "gender")
                .expect("column exists")
                .is_no_data()
        );
    }

    #[test]
    fn joint_distribution_groups_by_value_and_label() {
        let summary = ResultAggregator
            .joint_distribution(&sample(), "gender")
            .expect("column exists");
        let joint = summary.ready().expect("data");

        assert_eq!(joint.count("F", SentimentLabel::Positive), 2);
        assert_eq!(joint.count("M", SentimentLabel::Negative), 1);
        assert_eq!(joint.count("", SentimentLabel::Neutral), 1);
        assert_eq!(joint.count("M", SentimentLabel::Positive), 0);
        assert_eq!(joint.total(), 4);
    }

    #[test]
    fn joint_distribution_rejects_unknown_columns() {
        let error = ResultAggregator
            .joint_distribution(&sample(), "age")
            .expect_err("unknown column");
        assert!(matches!(error, SchemaError::MissingColumn { .. }));
    }

    #[test]
    fn sentiment_column_can_be_used_as_the_grouping_value() {
        let summary = ResultAggregator
            .joint_distribution(&sample(), SENTIMENT_COLUMN)
            .expect("sentiment column");
        let joint = summary.ready().expect("data");
        assert_eq!(joint.count("Positive", SentimentLabel::Positive), 2);
    }

    #[test]
    fn scatter_pairs_follow_row_order() {
        let summary = ResultAggregator
            .scatter_pairs(&sample(), "review")
            .expect("column exists");
        let values: Vec<(&str, SentimentLabel)> = summary
            .ready()
            .expect("data")
            .iter()
            .map(|point| (point.value.as_str(), point.label))
            .collect();
        assert_eq!(
            values,
            vec![
                ("great", SentimentLabel::Positive),
                ("awful", SentimentLabel::Negative),
                ("fine", SentimentLabel::Positive),
                ("box", SentimentLabel::Neutral),
            ]
        );
    }

    #[test]
    fn summaries_serialize_with_status_tag() {
        let json = serde_json::to_value(ResultAggregator.label_counts(&results(&[])))
            .expect("serializes");
        assert_eq!(json, serde_json::json!({"status": "no_data"}));
    }
}
