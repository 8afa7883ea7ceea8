use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ResponseError, Result};

// ---------------------------------------------------------------------------
// HeaderValue – a single header keyword value
// ---------------------------------------------------------------------------

/// A dynamically-typed header keyword value, mirroring the card types of
/// calibration table headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::String(s) => write!(f, "{s}"),
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Bool(b) => write!(f, "{b}"),
            HeaderValue::Null => write!(f, "<null>"),
        }
    }
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view; integral floats are accepted since some writers store
    /// counts as `1.0`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(i) => Some(*i),
            HeaderValue::Float(v) => integral(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Guess the type of a textual keyword value (Parquet metadata, CSV cards).
    pub fn guess(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return HeaderValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return HeaderValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return HeaderValue::Float(f);
        }
        match s {
            "true" | "T" => return HeaderValue::Bool(true),
            "false" | "F" => return HeaderValue::Bool(false),
            _ => {}
        }
        HeaderValue::String(s.trim_matches('\'').trim().to_string())
    }
}

/// `v` as an `i64` when it is a whole number inside the `i64` range.
pub(crate) fn integral(v: f64) -> Option<i64> {
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Header – ordered keyword map of one extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(BTreeMap<String, HeaderValue>);

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: HeaderValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HeaderValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the single keyword whose name satisfies `pred`.
    ///
    /// Zero or several matches is a [`ResponseError::MalformedHeader`]: the
    /// caller asked for something the header must state exactly once.
    pub fn find_unique<P>(&self, what: &str, pred: P) -> Result<(&str, &HeaderValue)>
    where
        P: Fn(&str) -> bool,
    {
        let mut matches = self.0.iter().filter(|(k, _)| pred(k.as_str()));
        match (matches.next(), matches.next()) {
            (Some((k, v)), None) => Ok((k.as_str(), v)),
            (None, _) => Err(ResponseError::MalformedHeader(format!(
                "no keyword matching {what}"
            ))),
            (Some((first, _)), Some((second, _))) => {
                Err(ResponseError::MalformedHeader(format!(
                    "keyword matching {what} is ambiguous ({first}, {second}, ...)"
                )))
            }
        }
    }
}

impl FromIterator<(String, HeaderValue)> for Header {
    fn from_iter<I: IntoIterator<Item = (String, HeaderValue)>>(iter: I) -> Self {
        Header(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Cell / Column – one numeric table column
// ---------------------------------------------------------------------------

/// One table cell: fixed scalar or variable-length array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Cell {
    /// Uniform view: a scalar reads as a one-element sequence.
    pub fn as_slice(&self) -> &[f64] {
        match self {
            Cell::Scalar(v) => std::slice::from_ref(v),
            Cell::Array(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(rename = "data")]
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, unit: Option<&str>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            unit: unit.map(str::to_string),
            cells,
        }
    }

    /// Build a column of scalar cells.
    pub fn scalars(name: impl Into<String>, unit: Option<&str>, values: &[f64]) -> Self {
        Self::new(name, unit, values.iter().copied().map(Cell::Scalar).collect())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read the column as one number per row.
    pub fn to_f64(&self) -> Result<Vec<f64>> {
        self.cells
            .iter()
            .enumerate()
            .map(|(row, cell)| match cell.as_slice() {
                [v] => Ok(*v),
                other => Err(ResponseError::shape_mismatch(format!(
                    "column {} row {row}: expected a scalar, found {} values",
                    self.name,
                    other.len()
                ))),
            })
            .collect()
    }

    /// Read the column as one integer per row.
    pub fn to_i64(&self) -> Result<Vec<i64>> {
        self.to_f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                integral(v).ok_or_else(|| {
                    ResponseError::shape_mismatch(format!(
                        "column {} row {row}: {v} is not an integer",
                        self.name
                    ))
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Extension / TableFile – the loaded container
// ---------------------------------------------------------------------------

/// A named table section with its own header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Extension {
            name: name.into(),
            header: Header::new(),
            columns: Vec::new(),
        }
    }

    pub fn with_keyword(mut self, key: &str, value: HeaderValue) -> Self {
        self.header.insert(key, value);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ResponseError::missing_column(&self.name, name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Required integer keyword.
    pub fn keyword_i64(&self, key: &str) -> Result<i64> {
        self.header
            .get(key)
            .and_then(HeaderValue::as_i64)
            .ok_or_else(|| ResponseError::MissingKeyword {
                extension: self.name.clone(),
                keyword: key.to_string(),
                expected: "an integer",
            })
    }

    /// Optional numeric keyword; absent and null both read as `None`.
    pub fn keyword_f64(&self, key: &str) -> Option<f64> {
        self.header.get(key).and_then(HeaderValue::as_f64)
    }

    pub fn keyword_str(&self, key: &str) -> Option<&str> {
        self.header.get(key).and_then(HeaderValue::as_str)
    }

    /// Number of rows, taken from the longest column.
    pub fn num_rows(&self) -> usize {
        self.columns.iter().map(Column::len).max().unwrap_or(0)
    }
}

/// A loaded container: extensions in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableFile {
    pub extensions: Vec<Extension>,
}

impl TableFile {
    pub fn from_extensions(extensions: Vec<Extension>) -> Self {
        TableFile { extensions }
    }

    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.name == name)
    }

    /// First extension found among `names`, tried in order.
    pub fn extension_any(&self, names: &[&str]) -> Result<&Extension> {
        names
            .iter()
            .find_map(|n| self.extension(n))
            .ok_or_else(|| ResponseError::MissingExtension {
                tried: names.iter().map(|n| n.to_string()).collect(),
            })
    }

    pub fn first(&self) -> Option<&Extension> {
        self.extensions.first()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
