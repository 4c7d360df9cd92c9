//! 結果テーブルの区切りテキスト入出力。
//!
//! 形式は元の入力列を元の順序で並べ、末尾に `Sentiment` 列を1つ加えたもの。
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::iter;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer};
use thiserror::Error;

use crate::classification::{LabelSet, SentimentLabel};
use crate::dataset::{CellValue, SENTIMENT_COLUMN, SchemaError};
use crate::pipeline::LabeledResultSet;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode or decode results table: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// 結果集合を CSV として書き出す。短い行は空フィールドで埋める。
///
/// # Errors
/// 書き込みに失敗した場合は [`ExportError::Csv`]。
pub fn write_results<W: Write>(results: &LabeledResultSet, writer: W) -> Result<(), ExportError> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(
        results
            .columns()
            .iter()
            .map(String::as_str)
            .chain(iter::once(SENTIMENT_COLUMN)),
    )?;

    let width = results.columns().len();
    for result in results {
        let record = (0..width)
            .map(|column| result.value(column).to_string())
            .chain(iter::once(result.label().to_string()))
            .collect::<Vec<_>>();
        writer.write_record(&record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// [`write_results`] の出力を読み戻す。
///
/// 末尾の `Sentiment` 列と、各ラベルが `label_set` に含まれることを検証する。
///
/// # Errors
/// CSV が不正な場合は [`ExportError::Csv`]、列やラベルが不正な場合は
/// [`ExportError::Schema`]。
pub fn read_results<R: Read>(
    reader: R,
    label_set: LabelSet,
) -> Result<LabeledResultSet, ExportError> {
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let mut columns = reader
        .headers()?
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if columns.last().map(String::as_str) != Some(SENTIMENT_COLUMN) {
        return Err(SchemaError::MissingSentimentColumn.into());
    }
    columns.pop();
    let width = columns.len();

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw_label = record.get(width).unwrap_or_default();
        let label = raw_label
            .parse::<SentimentLabel>()
            .map_err(|_| SchemaError::InvalidLabel {
                row,
                value: raw_label.to_string(),
            })?;
        let cells = record
            .iter()
            .take(width)
            .map(CellValue::infer)
            .collect::<Vec<_>>();
        rows.push((cells, label));
    }

    Ok(LabeledResultSet::new(columns, label_set, rows)?)
}

/// # Errors
/// ファイルを作成できない場合は [`ExportError::Io`]。
pub fn save_results(results: &LabeledResultSet, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_results(results, BufWriter::new(file))?;
    tracing::info!(path = %path.display(), rows = results.len(), "results saved");
    Ok(())
}

/// # Errors
/// ファイルを開けない場合は [`ExportError::Io`]、内容が不正な場合は
/// [`read_results`] と同じエラー。
pub fn load_results(path: &Path, label_set: LabelSet) -> Result<LabeledResultSet, ExportError> {
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let results = read_results(BufReader::new(file), label_set)?;
    tracing::debug!(path = %path.display(), rows = results.len(), "results loaded");
    Ok(results)
}
