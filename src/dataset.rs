//! 列名付きの表形式レコード集合と、そのスキーマ検証。
use std::collections::HashSet;
use std::fmt;
use std::io::Read;

use serde::Deserialize;
use thiserror::Error;

/// 結果テーブルの末尾に付与される感情ラベル列の名前。
pub const SENTIMENT_COLUMN: &str = "Sentiment";

pub(crate) static MISSING: CellValue = CellValue::Missing;

/// 1セル分のスカラー値。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Missing,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// 区切りテキストのフィールドからスカラー値を推定する。
    ///
    /// 数値や真偽値として解釈できても、表示形式が元の文字列と一致しない場合
    /// (`"007"` や `"1.50"` など) はテキストのまま保持する。これにより
    /// `CellValue::infer(s).to_string() == s` が常に成り立つ。
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Missing;
        }
        if let Ok(value) = raw.parse::<i64>()
            && value.to_string() == raw
        {
            return Self::Integer(value);
        }
        if let Ok(value) = raw.parse::<f64>()
            && value.is_finite()
            && value.to_string() == raw
        {
            return Self::Float(value);
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// 欠損扱いかどうか。NaN も欠損とみなす。
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Float(value) => value.is_nan(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) if value.is_nan() => Ok(()),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("column `{column}` not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("row {row} has no value for column `{column}`")]
    RaggedRow { row: usize, column: String },
    #[error("row {row} has {width} cells but the header defines {columns} columns")]
    RowTooWide {
        row: usize,
        width: usize,
        columns: usize,
    },
    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),
    #[error("input already contains a `{SENTIMENT_COLUMN}` column")]
    ReservedColumn,
    #[error("results table has no trailing `{SENTIMENT_COLUMN}` column")]
    MissingSentimentColumn,
    #[error("row {row} has an invalid sentiment label `{value}`")]
    InvalidLabel { row: usize, value: String },
    #[error("failed to decode delimited input: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to decode value grid: {0}")]
    Json(#[from] serde_json::Error),
}

/// 分類対象として取り出した1レコード。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRecord<'a> {
    pub index: usize,
    pub value: &'a CellValue,
}

/// 列名と行を保持する入力テーブル。
///
/// 行は列数より短くてもよい (スプレッドシート API は末尾の空セルを省略する)。
/// 分類対象列の欠落は [`RecordSet::text_column`] で検出する。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl RecordSet {
    /// # Errors
    /// 列名の重複、またはヘッダより長い行がある場合は [`SchemaError`] を返す。
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, SchemaError> {
        ensure_unique(&columns)?;
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() > columns.len() {
                return Err(SchemaError::RowTooWide {
                    row,
                    width: cells.len(),
                    columns: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// 先頭行をヘッダとする文字列グリッドから構築する。
    ///
    /// # Errors
    /// [`RecordSet::new`] と同じ条件で失敗する。
    pub fn from_value_grid(grid: Vec<Vec<String>>) -> Result<Self, SchemaError> {
        let mut rows = grid.into_iter();
        let Some(header) = rows.next() else {
            return Ok(Self::default());
        };
        let rows = rows
            .map(|row| row.iter().map(|raw| CellValue::infer(raw)).collect())
            .collect();
        Self::new(header, rows)
    }

    /// `{"values": [[...], ...]}` 形式の JSON から構築する。
    ///
    /// # Errors
    /// JSON が不正な場合、またはグリッドがスキーマ検証に失敗した場合。
    pub fn from_values_json(raw: &str) -> Result<Self, SchemaError> {
        let range: ValueRange = serde_json::from_str(raw)?;
        Self::from_value_grid(range.values)
    }

    /// ヘッダ付き CSV を読み込む。
    ///
    /// # Errors
    /// CSV の解析に失敗した場合、または列名が重複している場合。
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SchemaError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = reader
            .headers()?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(CellValue::infer).collect());
        }
        Self::new(columns, rows)
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// 分類対象列を検証し、その列番号を返す。
    ///
    /// # Errors
    /// 列が存在しない場合、予約列 `Sentiment` を既に含む場合、
    /// または対象列のセルを持たない行がある場合は [`SchemaError`] を返す。
    pub fn text_column(&self, name: &str) -> Result<usize, SchemaError> {
        if self.column_index(SENTIMENT_COLUMN).is_some() {
            return Err(SchemaError::ReservedColumn);
        }
        let index = self
            .column_index(name)
            .ok_or_else(|| SchemaError::MissingColumn {
                column: name.to_string(),
                available: self.columns.clone(),
            })?;
        if let Some(row) = self.rows.iter().position(|cells| cells.len() <= index) {
            return Err(SchemaError::RaggedRow {
                row,
                column: name.to_string(),
            });
        }
        Ok(index)
    }

    /// 指定列の値を行順に列挙する。行が短い場合は欠損値を返す。
    pub fn text_records(&self, column: usize) -> impl Iterator<Item = TextRecord<'_>> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(move |(index, cells)| TextRecord {
                index,
                value: cells.get(column).unwrap_or(&MISSING),
            })
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<CellValue>>) {
        (self.columns, self.rows)
    }
}

pub(crate) fn ensure_unique(columns: &[String]) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(SchemaError::DuplicateColumn(column.clone()));
        }
    }
    Ok(())
}
