use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from a workbook sheet.
///
/// Organ sheets are hand-entered and mix representations freely (a count
/// typed as text, a mouse id typed as a number), so every cell is carried
/// dynamically until the join produces typed records.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date kept as text for simplicity.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the value as `f64` where a numeric reading exists.
    ///
    /// Text is parsed after trimming; this is the single place a textual
    /// number becomes numeric, so later stages never re-coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Label used for grouping keys and output text (integers print without
    /// a decimal point, so a mouse id entered as `3.0` still reads "3").
    pub fn label(&self) -> String {
        match self {
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => {
                format!("{}", *v as i64)
            }
            other => other.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// One long-format record: column name → cell. Columns a sheet never had
/// are simply absent from the map.
pub type Row = BTreeMap<String, CellValue>;

/// Column names the reshaper introduces and later stages key on.
pub mod columns {
    pub const ORGAN: &str = "organ";
    pub const GROUP: &str = "group";
    pub const MOUSE: &str = "mouse";
    pub const COUNT_DATE: &str = "count_date";
    pub const WHO_PLATED: &str = "who_plated";
    pub const WHO_COUNTED: &str = "who_counted";
    pub const DILUTION: &str = "dilution";
    pub const CFUS: &str = "CFUs";
}

// ---------------------------------------------------------------------------
// RawOrganTable – one organ sheet as read
// ---------------------------------------------------------------------------

/// A single organ sheet, positionally indexed, before reshaping.
#[derive(Debug, Clone)]
pub struct RawOrganTable {
    /// Organ name, taken from the sheet name.
    pub organ: String,
    /// Header row, in sheet order.
    pub headers: Vec<String>,
    /// Data rows; each row has one cell per header.
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// LongTable – replicate-level records with an ordered column index
// ---------------------------------------------------------------------------

/// Long-format table threaded between pipeline stages: rows plus the
/// ordered list of column names seen so far.
#[derive(Debug, Clone, Default)]
pub struct LongTable {
    /// First-seen column order, preserved through union for reproducible
    /// output ordering.
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl LongTable {
    pub fn new(column_names: Vec<String>) -> Self {
        LongTable {
            column_names,
            rows: Vec::new(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MetadataRecord – per-organ plating metadata
// ---------------------------------------------------------------------------

/// One row of the reserved `metadata` sheet; `organ` is unique.
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    pub organ: String,
    pub percent_organ_plated: f64,
    pub aliquot: f64,
    pub dilution_factor: f64,
    pub total_resuspension_ml: f64,
    pub volume_plated_ul: f64,
}

// ---------------------------------------------------------------------------
// TidyReplicate – one joined, concentration-bearing observation
// ---------------------------------------------------------------------------

/// Final replicate record; serialized field names match the output file
/// contract exactly.
#[derive(Debug, Clone, Serialize)]
pub struct TidyReplicate {
    pub organ: String,
    pub count_date: Option<String>,
    pub who_plated: Option<String>,
    pub who_counted: Option<String>,
    pub group: String,
    pub mouse: Option<String>,
    pub dilution: u32,
    #[serde(rename = "CFUs")]
    pub cfus: f64,
    #[serde(rename = "CFUs_per_ml")]
    pub cfus_per_ml: f64,
}
