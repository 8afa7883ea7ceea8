use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, Float64Array, Float64Builder, LargeListArray, ListArray, ListBuilder,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Cell, Column, Extension, Header, HeaderValue, TableFile};

/// Key-value metadata entry naming the extension stored in a Parquet file.
pub const EXTNAME: &str = "EXTNAME";
/// Arrow field metadata entry carrying a column unit.
pub const UNIT: &str = "unit";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a calibration or spectrum container from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one table extension per file, keywords in key-value metadata
/// * `.json`    – `{ "extensions": [ { "name", "header", "columns" }, ... ] }`
/// * `.csv`     – `# KEY = VALUE` header cards, then one table with
///   semicolon-separated array cells
pub fn load_file(path: &Path) -> Result<TableFile> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let file = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "{}: {} extension(s) {:?}",
        path.display(),
        file.len(),
        file.extensions.iter().map(|e| e.name.as_str()).collect::<Vec<_>>()
    );
    Ok(file)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// {
///   "extensions": [
///     {
///       "name": "MATRIX",
///       "header": { "DETCHANS": 6, "TLMIN4": 1 },
///       "columns": [
///         { "name": "ENERG_LO", "unit": "keV", "data": [1.0, 2.0] },
///         { "name": "F_CHAN", "data": [1, [3, 5]] }
///       ]
///     }
///   ]
/// }
/// ```
fn load_json(path: &Path) -> Result<TableFile> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let file: TableFile = serde_json::from_str(&text).context("parsing JSON")?;
    if file.is_empty() {
        bail!("JSON file declares no extensions");
    }
    Ok(file)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: leading comment cards, then a header row with column names.
///
/// ```text
/// # EXTNAME = SPECRESP
/// # EXPOSURE = 1e5
/// ENERG_LO [keV],ENERG_HI [keV],SPECRESP [cm**2]
/// 0.3,0.4,12.5
/// ```
///
/// Array cells hold semicolon-separated floats: `"3;5"`.
fn load_csv(path: &Path) -> Result<TableFile> {
    let text = std::fs::read_to_string(path).context("reading CSV file")?;

    let mut header = Header::new();
    let mut name = None;
    let mut body_start = 0;
    for line in text.split_inclusive('\n') {
        let Some(card) = line.trim_start().strip_prefix('#') else {
            break;
        };
        body_start += line.len();
        let Some((key, value)) = card.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key == EXTNAME {
            name = Some(value.trim().to_string());
        } else {
            header.insert(key, HeaderValue::guess(value));
        }
    }

    let mut reader = csv::Reader::from_reader(text[body_start..].as_bytes());
    let headers: Vec<(String, Option<String>)> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(split_unit)
        .collect();

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, (col_name, _)) in headers.iter().enumerate() {
            let raw = record.get(col_idx).unwrap_or("");
            cells[col_idx].push(parse_cell(raw, row_no, col_name)?);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|((name, unit), cells)| Column { name, unit, cells })
        .collect();

    Ok(TableFile::from_extensions(vec![Extension {
        name: name.unwrap_or_default(),
        header,
        columns,
    }]))
}

/// `"ENERG_LO [keV]"` → `("ENERG_LO", Some("keV"))`.
fn split_unit(h: &str) -> (String, Option<String>) {
    let h = h.trim();
    match h.split_once('[') {
        Some((name, rest)) if rest.ends_with(']') => (
            name.trim().to_string(),
            Some(rest.trim_end_matches(']').trim().to_string()),
        ),
        _ => (h.to_string(), None),
    }
}

fn parse_cell(s: &str, row: usize, col: &str) -> Result<Cell> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Cell::Array(Vec::new()));
    }
    let mut values = s
        .split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect::<Result<Vec<f64>>>()?;
    if values.len() == 1 && !s.contains(';') {
        Ok(Cell::Scalar(values.remove(0)))
    } else {
        Ok(Cell::Array(values))
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding a single table extension.
///
/// Expected layout:
/// - key-value metadata `EXTNAME` names the extension, every other entry is
///   a header keyword (type guessed from its text)
/// - numeric columns (any integer or float width) become scalar cells
/// - `List`/`LargeList` of numbers become array cells
/// - the Arrow field metadata entry `unit` carries the column unit
///
/// Columns of any other type are skipped.
fn load_parquet(path: &Path) -> Result<TableFile> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let mut header = Header::new();
    let mut name = String::new();
    for (key, value) in schema.metadata() {
        if key.starts_with("ARROW:") {
            continue;
        }
        if key == EXTNAME {
            name = value.clone();
        } else {
            header.insert(key.clone(), HeaderValue::guess(value));
        }
    }

    let mut columns: Vec<Option<Column>> = schema
        .fields()
        .iter()
        .map(|f| {
            is_supported(f.data_type()).then(|| Column {
                name: f.name().clone(),
                unit: f.metadata().get(UNIT).cloned(),
                cells: Vec::new(),
            })
        })
        .collect();
    for (field, col) in schema.fields().iter().zip(&columns) {
        if col.is_none() {
            log::debug!("skipping non-numeric column '{}'", field.name());
        }
    }

    let reader = builder.build().context("building parquet reader")?;
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, slot) in columns.iter_mut().enumerate() {
            let Some(column) = slot else { continue };
            let cells = extract_cells(batch.column(idx))
                .with_context(|| format!("column '{}'", column.name))?;
            column.cells.extend(cells);
        }
    }

    Ok(TableFile::from_extensions(vec![Extension {
        name,
        header,
        columns: columns.into_iter().flatten().collect(),
    }]))
}

// -- Parquet / Arrow helpers --

fn is_supported(dt: &DataType) -> bool {
    match dt {
        DataType::List(inner) | DataType::LargeList(inner) => inner.data_type().is_numeric(),
        other => other.is_numeric(),
    }
}

/// Convert one Arrow column into cells; nulls read as NaN (scalars) or empty
/// arrays (lists).
fn extract_cells(col: &ArrayRef) -> Result<Vec<Cell>> {
    match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            (0..list_arr.len())
                .map(|row| {
                    if list_arr.is_null(row) {
                        return Ok(Cell::Array(Vec::new()));
                    }
                    Ok(Cell::Array(to_f64_vec(&list_arr.value(row))?))
                })
                .collect()
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            (0..list_arr.len())
                .map(|row| {
                    if list_arr.is_null(row) {
                        return Ok(Cell::Array(Vec::new()));
                    }
                    Ok(Cell::Array(to_f64_vec(&list_arr.value(row))?))
                })
                .collect()
        }
        _ => Ok(to_f64_vec(col)?.into_iter().map(Cell::Scalar).collect()),
    }
}

fn to_f64_vec(values: &ArrayRef) -> Result<Vec<f64>> {
    let values = cast(values, &DataType::Float64)
        .with_context(|| format!("casting {:?} to Float64", values.data_type()))?;
    let f64_arr = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .context("expected Float64Array after cast")?;
    Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

/// Write one extension as a Parquet file in the layout [`load_file`] reads.
///
/// Columns holding any array cell are written as `List<Float64>`, all others
/// as `Float64`.
pub fn write_parquet(path: &Path, extension: &Extension) -> Result<()> {
    let mut fields = Vec::with_capacity(extension.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(extension.columns.len());

    for column in &extension.columns {
        let is_list = column.cells.iter().any(|c| matches!(c, Cell::Array(_)));
        let data_type = if is_list {
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true)))
        } else {
            DataType::Float64
        };

        let mut field = Field::new(&column.name, data_type, false);
        if let Some(unit) = &column.unit {
            field = field.with_metadata(HashMap::from([(UNIT.to_string(), unit.clone())]));
        }
        fields.push(field);

        if is_list {
            let mut builder = ListBuilder::new(Float64Builder::new());
            for cell in &column.cells {
                builder.values().append_slice(cell.as_slice());
                builder.append(true);
            }
            arrays.push(Arc::new(builder.finish()));
        } else {
            let values: Vec<f64> = column
                .cells
                .iter()
                .flat_map(|c| c.as_slice().iter().copied())
                .collect();
            arrays.push(Arc::new(Float64Array::from(values)));
        }
    }

    let mut metadata: HashMap<String, String> = extension
        .header
        .iter()
        .map(|(k, v)| {
            let text = match v {
                HeaderValue::Null => String::new(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect();
    metadata.insert(EXTNAME.to_string(), extension.name.clone());

    let schema = Arc::new(Schema::new_with_metadata(fields, metadata));
    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .with_context(|| format!("building record batch for '{}'", extension.name))?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
