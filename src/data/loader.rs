use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int32Type, Int64Type, UInt32Type, UInt64Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, FoodRecord, FoodTable, HeaderStyle, PurineProfile};
use super::search_key::Transliterator;
use crate::error::LoadError;

/// Marker for a quantity below the detection threshold.
pub const TRACE_TOKEN: &str = "Tr";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the reference table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – UTF-8, optional byte-order mark, one header row
/// * `.json`    – `[{ "食物名称": "牛肉", "总嘌呤 Purine": "Tr", ... }, ...]`
/// * `.parquet` – as written by [`write_parquet`](super::export::write_parquet)
///
/// Header labels may follow any [`HeaderStyle`]; extra columns are ignored.
pub fn load_file(path: &Path, transliterator: &dyn Transliterator) -> Result<FoodTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_csv(open(path)?, &path.display().to_string(), transliterator),
        "json" => load_json(path, transliterator),
        "parquet" | "pq" => load_parquet(path, transliterator),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }?;

    log::info!(
        "Loaded {} food records ({} categories, {} headers) from {}",
        table.len(),
        table.categories.len(),
        table.header_style,
        path.display()
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: io::Error) -> LoadError {
    if source.kind() == io::ErrorKind::NotFound {
        LoadError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Coerce a raw quantity cell to a finite, non-negative number.
///
/// The trace token becomes `0`, every character other than an ASCII digit or
/// `.` is dropped, and whatever cannot be parsed afterwards is `0`.
pub fn coerce_quantity(raw: &str) -> f64 {
    let replaced = raw.replace(TRACE_TOKEN, "0");
    let digits: String = replaced
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Where each canonical column lives in the source, and which convention named it.
#[derive(Debug, Clone)]
struct HeaderLayout {
    positions: [Option<usize>; 8],
    style: HeaderStyle,
}

impl HeaderLayout {
    /// Map header labels to canonical columns.
    ///
    /// With `positional` set, a header of at least eight fields whose labels
    /// do not all resolve (e.g. `鸟嘌呤(mg)`) is read in the fixed column order
    /// instead, as plain-label data.
    fn resolve<'a>(
        labels: impl IntoIterator<Item = &'a str>,
        origin: &str,
        positional: bool,
    ) -> Result<Self, LoadError> {
        let labels: Vec<&str> = labels.into_iter().collect();
        let mut positions = [None; 8];
        let mut styles = Vec::new();

        for (idx, label) in labels.iter().enumerate() {
            let Some((column, style)) = Column::from_label(label) else {
                log::debug!("{origin}: ignoring column '{label}'");
                continue;
            };
            let slot = &mut positions[column as usize];
            if slot.is_none() {
                *slot = Some(idx);
                styles.push(style);
            }
        }

        let missing: Vec<&'static str> = Column::ALL
            .iter()
            .filter(|&&col| col != Column::Origin && positions[col as usize].is_none())
            .map(|col| col.key())
            .collect();
        if missing.is_empty() {
            return Ok(HeaderLayout {
                positions,
                style: dominant_style(&styles),
            });
        }

        if positional && labels.len() >= Column::ALL.len() {
            log::info!(
                "{origin}: unrecognised labels for {}, reading columns by position",
                missing.join(", ")
            );
            return Ok(HeaderLayout::by_position());
        }

        Err(LoadError::MissingColumns {
            origin: origin.to_string(),
            missing,
        })
    }

    fn by_position() -> Self {
        let mut positions = [None; 8];
        for (idx, column) in Column::ALL.iter().enumerate() {
            positions[*column as usize] = Some(idx);
        }
        HeaderLayout {
            positions,
            style: HeaderStyle::Plain,
        }
    }

    fn position(&self, column: Column) -> Option<usize> {
        self.positions[column as usize]
    }
}

/// Most frequent style among resolved labels; ties go to the first seen.
fn dominant_style(styles: &[HeaderStyle]) -> HeaderStyle {
    HeaderStyle::ALL
        .iter()
        .copied()
        .filter(|s| styles.contains(s))
        .max_by_key(|s| {
            let count = styles.iter().filter(|x| *x == s).count();
            let first = styles.iter().position(|x| x == s).unwrap_or(usize::MAX);
            (count, std::cmp::Reverse(first))
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Row normalisation (shared by every format)
// ---------------------------------------------------------------------------

fn normalise_row(
    origin: &str,
    row: usize,
    cell: impl Fn(Column) -> String,
    transliterator: &dyn Transliterator,
) -> FoodRecord {
    let mut purines = PurineProfile::default();
    for column in Column::QUANTITIES {
        let raw = cell(column);
        let value = coerce_quantity(&raw);
        if raw.trim().parse::<f64>().ok() != Some(value) {
            log::debug!("{origin} row {row}: {column} '{raw}' coerced to {value}");
        }
        purines.set(column, value);
    }

    let name = cell(Column::Name);
    if name.trim().is_empty() {
        log::warn!("{origin} row {row}: blank food name");
    }

    FoodRecord::new(
        cell(Column::Category),
        name,
        purines,
        cell(Column::Origin),
        transliterator,
    )
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read CSV text from any reader. `origin` names the source in errors and logs.
///
/// Short rows are tolerated; absent cells read as empty.
pub fn read_csv<R: Read>(
    reader: R,
    origin: &str,
    transliterator: &dyn Transliterator,
) -> Result<FoodTable, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        origin: origin.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let layout = HeaderLayout::resolve(headers.iter(), origin, true)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.map_err(csv_error)?;
        let cell = |column: Column| {
            layout
                .position(column)
                .and_then(|idx| row.get(idx))
                .unwrap_or("")
                .to_string()
        };
        records.push(normalise_row(origin, row_no, cell, transliterator));
    }

    Ok(FoodTable::from_records(records, layout.style))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the shape of `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "category": "畜肉类及制品", "name": "牛肉", "guanine": 40.1, ..., "total": "Tr" },
///   ...
/// ]
/// ```
fn load_json(path: &Path, transliterator: &dyn Transliterator) -> Result<FoodTable, LoadError> {
    let origin = path.display().to_string();
    let mut text = String::new();
    open(path)?
        .read_to_string(&mut text)
        .map_err(|source| io_error(path, source))?;
    parse_json(text.trim_start_matches('\u{feff}'), &origin, transliterator)
}

fn parse_json(
    text: &str,
    origin: &str,
    transliterator: &dyn Transliterator,
) -> Result<FoodTable, LoadError> {
    let json_error = |details: String| LoadError::Json {
        origin: origin.to_string(),
        details,
    };

    let root: JsonValue = serde_json::from_str(text).map_err(|e| json_error(e.to_string()))?;
    let rows = root
        .as_array()
        .ok_or_else(|| json_error("expected top-level JSON array".to_string()))?;

    // The union of keys across all rows acts as the header row.
    let mut labels = BTreeSet::new();
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| json_error(format!("row {i} is not a JSON object")))?;
        labels.extend(obj.keys().map(String::as_str));
    }
    let labels: Vec<&str> = labels.into_iter().collect();
    let layout = if rows.is_empty() {
        None
    } else {
        Some(HeaderLayout::resolve(labels.iter().copied(), origin, false)?)
    };

    let mut records = Vec::with_capacity(rows.len());
    for (row_no, row) in rows.iter().enumerate() {
        let Some(obj) = row.as_object() else { continue };
        let cell = |column: Column| {
            obj.iter()
                .find(|(key, _)| Column::from_label(key).map(|(c, _)| c) == Some(column))
                .map(|(_, v)| json_to_text(v))
                .unwrap_or_default()
        };
        records.push(normalise_row(origin, row_no, cell, transliterator));
    }

    let style = layout.map(|l| l.style).unwrap_or(HeaderStyle::Canonical);
    Ok(FoodTable::from_records(records, style))
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose column names follow any accepted convention.
///
/// Stored `pinyin` / `initials` columns are ignored; search keys are always
/// rebuilt from the name.
fn load_parquet(path: &Path, transliterator: &dyn Transliterator) -> Result<FoodTable, LoadError> {
    let origin = path.display().to_string();
    let parquet_error = |details: String| LoadError::Parquet {
        origin: origin.clone(),
        details,
    };

    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| parquet_error(format!("reading parquet metadata: {e}")))?;
    let layout = HeaderLayout::resolve(
        builder.schema().fields().iter().map(|f| f.name().as_str()),
        &origin,
        true,
    )?;
    let reader = builder
        .build()
        .map_err(|e| parquet_error(format!("building parquet reader: {e}")))?;

    let mut records = Vec::new();
    let mut row_base = 0;
    for batch_result in reader {
        let batch = batch_result.map_err(|e| parquet_error(format!("reading record batch: {e}")))?;
        for row in 0..batch.num_rows() {
            let cell = |column: Column| {
                layout
                    .position(column)
                    .map(|idx| arrow_cell_text(batch.column(idx), row))
                    .unwrap_or_default()
            };
            records.push(normalise_row(&origin, row_base + row, cell, transliterator));
        }
        row_base += batch.num_rows();
    }

    Ok(FoodTable::from_records(records, layout.style))
}

/// Render one Arrow cell as the text a CSV cell would have held.
fn arrow_cell_text(col: &Arc<dyn Array>, row: usize) -> String {
    if col.is_null(row) {
        return String::new();
    }
    match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::UInt64 => col.as_primitive::<UInt64Type>().value(row).to_string(),
        DataType::UInt32 => col.as_primitive::<UInt32Type>().value(row).to_string(),
        other => {
            log::debug!("unsupported parquet column type {other:?}, reading as empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::search_key::{IdentityTransliterator, PinyinTransliterator};

    const PLAIN_CSV: &str = "\u{feff}食物类,食物名称,鸟嘌呤,腺嘌呤,次黄嘌呤,黄嘌呤,总嘌呤,采样地\n\
        畜肉类及制品,牛肉,40.1,30,Tr,12.5mg,82.6,北京\n\
        蔬菜类及制品,白菜,--,,Tr,1,,\n";

    const BILINGUAL_CSV: &str = "食物类 Food group,食物名称 Food name,鸟嘌呤 Guanine,腺嘌呤 Adenine,\
        次黄嘌呤 Hypoxanthine,黄嘌呤 Xanthine,总嘌呤 Purine,采样地 Sampling site\n\
        畜肉类及制品,牛肉,40.1,30,Tr,12.5,82.6,北京\n";

    #[test]
    fn coerces_trace_and_junk_cells() {
        assert_eq!(coerce_quantity("Tr"), 0.0);
        assert_eq!(coerce_quantity("12.5mg"), 12.5);
        assert_eq!(coerce_quantity(""), 0.0);
        assert_eq!(coerce_quantity("--"), 0.0);
        assert_eq!(coerce_quantity("1.2.3"), 0.0);
        assert_eq!(coerce_quantity("-7"), 7.0);
        assert_eq!(coerce_quantity(" 95 "), 95.0);
        assert_eq!(coerce_quantity("tr"), 0.0);
        // The trace token is replaced wherever it occurs.
        assert_eq!(coerce_quantity("1Tr"), 10.0);
    }

    #[test]
    fn coercion_never_yields_infinite_values() {
        let huge = "9".repeat(400);
        assert_eq!(coerce_quantity(&huge), 0.0);
    }

    #[test]
    fn reads_plain_header_csv_with_bom() {
        let table = read_csv(PLAIN_CSV.as_bytes(), "plain", &PinyinTransliterator).unwrap();
        assert_eq!(table.header_style, HeaderStyle::Plain);
        assert_eq!(table.len(), 2);

        let beef = &table.records[0];
        assert_eq!(beef.category, "畜肉类及制品");
        assert_eq!(beef.name(), "牛肉");
        assert_eq!(beef.purines.hypoxanthine, 0.0);
        assert_eq!(beef.purines.xanthine, 12.5);
        assert_eq!(beef.total(), 82.6);
        assert_eq!(beef.origin, "北京");
        assert_eq!(beef.romanized_name(), "niurou");

        let cabbage = &table.records[1];
        assert_eq!(cabbage.purines, PurineProfile {
            xanthine: 1.0,
            ..Default::default()
        });
        assert_eq!(cabbage.origin, "");
    }

    #[test]
    fn both_conventions_normalise_to_the_same_records() {
        let plain = read_csv(PLAIN_CSV.as_bytes(), "plain", &IdentityTransliterator).unwrap();
        let bilingual =
            read_csv(BILINGUAL_CSV.as_bytes(), "bilingual", &IdentityTransliterator).unwrap();
        assert_eq!(bilingual.header_style, HeaderStyle::Bilingual);
        assert_eq!(plain.records[0], bilingual.records[0]);
    }

    #[test]
    fn missing_required_columns_is_an_error() {
        let csv = "食物类,食物名称,总嘌呤\n肉类,牛肉,80\n";
        let err = read_csv(csv.as_bytes(), "partial", &IdentityTransliterator).unwrap_err();
        match err {
            LoadError::MissingColumns { missing, .. } => {
                assert_eq!(missing, vec!["guanine", "adenine", "hypoxanthine", "xanthine"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decorated_headers_fall_back_to_column_order() {
        let csv = "食物类,食物名称,鸟嘌呤(mg),腺嘌呤(mg),次黄嘌呤(mg),黄嘌呤(mg),总嘌呤(mg),采样地\n\
                   肉类,牛肉,1,2,Tr,4,10,北京\n";
        let table = read_csv(csv.as_bytes(), "decorated", &PinyinTransliterator).unwrap();
        assert_eq!(table.header_style, HeaderStyle::Plain);

        let beef = &table.records[0];
        assert_eq!(beef.category, "肉类");
        assert_eq!(beef.name(), "牛肉");
        assert_eq!(beef.purines, PurineProfile {
            guanine: 1.0,
            adenine: 2.0,
            hypoxanthine: 0.0,
            xanthine: 4.0,
            total: 10.0,
        });
        assert_eq!(beef.origin, "北京");
        assert_eq!(beef.initials(), "nr");
    }

    #[test]
    fn json_keys_never_fall_back_to_position() {
        let json = r#"[{"a": "肉类", "b": "牛肉", "c": 1, "d": 2, "e": 3, "f": 4, "g": 10, "h": ""}]"#;
        let err = parse_json(json, "json", &IdentityTransliterator).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumns { .. }));
    }

    #[test]
    fn origin_column_is_optional() {
        let csv = "category,name,guanine,adenine,hypoxanthine,xanthine,total,pinyin\n\
                   肉类,牛肉,1,2,3,4,10,stale\n";
        let table = read_csv(csv.as_bytes(), "canonical", &PinyinTransliterator).unwrap();
        assert_eq!(table.header_style, HeaderStyle::Canonical);
        assert_eq!(table.records[0].origin, "");
        assert_eq!(table.records[0].romanized_name(), "niurou");
    }

    #[test]
    fn parses_json_rows_with_mixed_value_types() {
        let json = r#"[
            {"category": "肉类", "name": "牛肉", "guanine": 40, "adenine": "30",
             "hypoxanthine": "Tr", "xanthine": null, "total": 82.6, "origin": "北京"}
        ]"#;
        let table = parse_json(json, "json", &IdentityTransliterator).unwrap();
        assert_eq!(table.header_style, HeaderStyle::Canonical);
        let rec = &table.records[0];
        assert_eq!(rec.purines.guanine, 40.0);
        assert_eq!(rec.purines.adenine, 30.0);
        assert_eq!(rec.purines.hypoxanthine, 0.0);
        assert_eq!(rec.purines.xanthine, 0.0);
        assert_eq!(rec.total(), 82.6);
    }

    #[test]
    fn rejects_non_array_json() {
        let err = parse_json(r#"{"name": "牛肉"}"#, "json", &IdentityTransliterator).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.xlsx");
        std::fs::write(&path, b"").unwrap();
        let err = load_file(&path, &IdentityTransliterator).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_file(Path::new("/nonexistent/purine.csv"), &IdentityTransliterator)
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}
