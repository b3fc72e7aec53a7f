use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::model::{Column, FoodRecord, HeaderStyle};
use crate::error::ExportError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Serialise records as CSV: UTF-8 byte-order mark, header row in `style`,
/// quantities as plain decimal text.
pub fn export_csv<'a, I>(records: I, style: HeaderStyle) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = &'a FoodRecord>,
{
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(Column::ALL.iter().map(|c| c.label(style)))?;
    for rec in records {
        writer.write_record(Column::ALL.iter().map(|&c| rec.cell(c)))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}

/// Suggested download name: `purine_data_<first 20 chars of the term>.csv`.
pub fn export_file_name(search_term: &str) -> String {
    let stem: String = search_term.trim().chars().take(20).collect();
    format!("purine_data_{stem}.csv")
}

// ---------------------------------------------------------------------------
// Arrow / Parquet
// ---------------------------------------------------------------------------

/// Column name of the stored romanised name.
pub const PINYIN_COLUMN: &str = "pinyin";
/// Column name of the stored initials.
pub const INITIALS_COLUMN: &str = "initials";

/// Build one Arrow batch: the eight table columns labelled in `style`,
/// optionally followed by the two search-key columns.
pub fn record_batch<'a, I>(
    records: I,
    style: HeaderStyle,
    with_search_keys: bool,
) -> Result<RecordBatch, ArrowError>
where
    I: IntoIterator<Item = &'a FoodRecord>,
{
    let records: Vec<&FoodRecord> = records.into_iter().collect();

    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();
    for column in Column::ALL {
        if column.is_quantity() {
            fields.push(Field::new(column.label(style), DataType::Float64, false));
            let values: Vec<f64> = records
                .iter()
                .map(|r| r.purines.get(column).unwrap_or_default())
                .collect();
            columns.push(Arc::new(Float64Array::from(values)));
        } else {
            fields.push(Field::new(column.label(style), DataType::Utf8, false));
            let values: Vec<String> = records.iter().map(|r| r.cell(column)).collect();
            columns.push(Arc::new(StringArray::from(values)));
        }
    }

    if with_search_keys {
        fields.push(Field::new(PINYIN_COLUMN, DataType::Utf8, false));
        columns.push(Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.romanized_name()),
        )));
        fields.push(Field::new(INITIALS_COLUMN, DataType::Utf8, false));
        columns.push(Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.initials()),
        )));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

/// Write records to a Parquet file with canonical column names plus the
/// stored search keys. Returns the number of rows written.
pub fn write_parquet<'a, I>(records: I, path: &Path) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = &'a FoodRecord>,
{
    let batch = record_batch(records, HeaderStyle::Canonical, true)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    log::info!("Wrote {} records to {}", batch.num_rows(), path.display());
    Ok(batch.num_rows())
}
