use crate::classification::{LabelSet, SentimentLabel};
use crate::dataset::{CellValue, MISSING, SchemaError, ensure_unique};

/// ラベルを付与した1行。元の行のセルはそのまま保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledResult {
    index: usize,
    label: SentimentLabel,
    row: Vec<CellValue>,
}

impl LabeledResult {
    pub(crate) fn new(index: usize, label: SentimentLabel, row: Vec<CellValue>) -> Self {
        Self { index, label, row }
    }

    /// 入力テーブル上の行番号 (0 始まり、ヘッダを除く)。
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        self.label
    }

    #[must_use]
    pub fn row(&self) -> &[CellValue] {
        &self.row
    }

    /// 列番号のセルを返す。行が短い場合は欠損値。
    #[must_use]
    pub fn value(&self, column: usize) -> &CellValue {
        self.row.get(column).unwrap_or(&MISSING)
    }
}

/// パイプラインの最終成果物。構築後は読み取り専用。
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledResultSet {
    columns: Vec<String>,
    label_set: LabelSet,
    results: Vec<LabeledResult>,
}

impl LabeledResultSet {
    /// 行とラベルの組から結果集合を組み立てる。
    ///
    /// # Errors
    /// 列名の重複、ヘッダより長い行、`label_set` に含まれないラベルがある場合。
    pub fn new(
        columns: Vec<String>,
        label_set: LabelSet,
        rows: Vec<(Vec<CellValue>, SentimentLabel)>,
    ) -> Result<Self, SchemaError> {
        ensure_unique(&columns)?;
        let mut results = Vec::with_capacity(rows.len());
        for (index, (row, label)) in rows.into_iter().enumerate() {
            if row.len() > columns.len() {
                return Err(SchemaError::RowTooWide {
                    row: index,
                    width: row.len(),
                    columns: columns.len(),
                });
            }
            if !label_set.contains(label) {
                return Err(SchemaError::InvalidLabel {
                    row: index,
                    value: label.to_string(),
                });
            }
            results.push(LabeledResult::new(index, label, row));
        }
        Ok(Self {
            columns,
            label_set,
            results,
        })
    }

    pub(crate) fn from_parts(
        columns: Vec<String>,
        label_set: LabelSet,
        results: Vec<LabeledResult>,
    ) -> Self {
        Self {
            columns,
            label_set,
            results,
        }
    }

    /// 元の入力列 (`Sentiment` 列は含まない)。
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn label_set(&self) -> LabelSet {
        self.label_set
    }

    #[must_use]
    pub fn results(&self) -> &[LabeledResult] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledResult> {
        self.results.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = SentimentLabel> + '_ {
        self.results.iter().map(LabeledResult::label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

impl<'a> IntoIterator for &'a LabeledResultSet {
    type Item = &'a LabeledResult;
    type IntoIter = std::slice::Iter<'a, LabeledResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
