//! Typed rows of the two record sheets.
//!
//! Rows are built from Arrow RecordBatches returned by a tabular store.
//! Missing columns and blank cells are tolerated: optional fields become
//! `None` and text fields become empty, with defaults resolved at the join
//! step of the series builder.

use std::fmt;

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cells::{format_date, format_number, get_string, parse_date, parse_number};
use crate::schema::sheets;

/// Type assigned to readings whose batch has no recorded type.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Identity of a soap batch: soap name plus optional batch number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoapKey {
    pub soap_name: String,
    /// Empty when the soap has no batch number.
    pub batch_number: String,
}

impl SoapKey {
    pub fn new(soap_name: impl AsRef<str>, batch_number: impl AsRef<str>) -> Self {
        Self {
            soap_name: soap_name.as_ref().trim().to_string(),
            batch_number: batch_number.as_ref().trim().to_string(),
        }
    }

    /// True if a raw sheet row (`soap_name`, `batch_number`, ...) belongs to this key.
    pub fn matches_row(&self, row: &[String]) -> bool {
        let name = row.first().map(|s| s.trim()).unwrap_or("");
        let batch = row.get(1).map(|s| s.trim()).unwrap_or("");
        name == self.soap_name && batch == self.batch_number
    }
}

impl fmt::Display for SoapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.batch_number.is_empty() {
            write!(f, "{}", self.soap_name)
        } else {
            write!(f, "{} (Batch {})", self.soap_name, self.batch_number)
        }
    }
}

/// One row of the `soap_batches` sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub key: SoapKey,
    /// Blank when the sheet has no type column or the cell is empty.
    pub soap_type: String,
    pub height_mm: Option<f64>,
    pub width_mm: Option<f64>,
    pub thickness_mm: Option<f64>,
    /// Stored value only; see [`BatchRecord::surface_area`] for the derived one.
    pub surface_area: Option<f64>,
    pub notes: String,
    pub initial_weight_g: Option<f64>,
    pub initial_date: Option<NaiveDate>,
}

/// Where a surface area figure came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceArea {
    Stored(f64),
    Calculated(f64),
}

impl SurfaceArea {
    pub fn value(self) -> f64 {
        match self {
            SurfaceArea::Stored(v) | SurfaceArea::Calculated(v) => v,
        }
    }
}

impl BatchRecord {
    /// Type with the `Uncategorized` default applied.
    pub fn resolved_type(&self) -> &str {
        let t = self.soap_type.trim();
        if t.is_empty() { UNCATEGORIZED } else { t }
    }

    /// Stored surface area, else height × width × thickness when all are known
    /// and non-zero.
    pub fn surface_area(&self) -> Option<SurfaceArea> {
        if let Some(sa) = self.surface_area {
            return Some(SurfaceArea::Stored(sa));
        }
        dimensions_product(self.height_mm, self.width_mm, self.thickness_mm)
            .map(SurfaceArea::Calculated)
    }

    /// Render as a sheet row in [`sheets::BATCH_COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.key.soap_name.clone(),
            self.key.batch_number.clone(),
            self.soap_type.clone(),
            opt_number(self.height_mm),
            opt_number(self.width_mm),
            opt_number(self.thickness_mm),
            opt_number(self.surface_area),
            self.notes.clone(),
            opt_number(self.initial_weight_g),
            self.initial_date.map(format_date).unwrap_or_default(),
        ]
    }

    /// Build batch records from `soap_batches` batches.
    ///
    /// Rows without a soap name are skipped; every other column is optional.
    pub fn from_batches(batches: &[RecordBatch]) -> Vec<Self> {
        let mut out = Vec::new();
        for batch in batches {
            let cols = Columns::new(batch);
            for row in 0..batch.num_rows() {
                let name = cols.text(sheets::SOAP_NAME, row);
                if name.trim().is_empty() {
                    continue;
                }
                out.push(Self {
                    key: SoapKey::new(&name, cols.text(sheets::BATCH_NUMBER, row)),
                    soap_type: cols.text(sheets::TYPE, row).trim().to_string(),
                    height_mm: cols.number(sheets::HEIGHT_MM, row),
                    width_mm: cols.number(sheets::WIDTH_MM, row),
                    thickness_mm: cols.number(sheets::THICKNESS_MM, row),
                    surface_area: cols.number(sheets::SURFACE_AREA, row),
                    notes: cols.text(sheets::NOTES, row),
                    initial_weight_g: cols.number(sheets::INITIAL_WEIGHT_G, row),
                    initial_date: cols.date(sheets::INITIAL_DATE, row),
                });
            }
        }
        out
    }
}

/// One row of the `weight_readings` sheet.
///
/// `date` and `weight_g` are `None` when the cell could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightReading {
    pub key: SoapKey,
    pub date: Option<NaiveDate>,
    pub weight_g: Option<f64>,
}

impl WeightReading {
    pub fn new(key: SoapKey, date: NaiveDate, weight_g: f64) -> Self {
        Self {
            key,
            date: Some(date),
            weight_g: Some(weight_g),
        }
    }

    /// Date and weight, if both cells parsed.
    pub fn valid(&self) -> Option<(NaiveDate, f64)> {
        Some((self.date?, self.weight_g?))
    }

    /// Render as a sheet row in [`sheets::READING_COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.key.soap_name.clone(),
            self.key.batch_number.clone(),
            self.date.map(format_date).unwrap_or_default(),
            opt_number(self.weight_g),
        ]
    }

    /// Build readings from `weight_readings` batches.
    ///
    /// Rows without a soap name are skipped. Malformed dates or weights are
    /// kept as `None` so callers decide whether to drop the row.
    pub fn from_batches(batches: &[RecordBatch]) -> Vec<Self> {
        let mut out = Vec::new();
        for batch in batches {
            let cols = Columns::new(batch);
            for row in 0..batch.num_rows() {
                let name = cols.text(sheets::SOAP_NAME, row);
                if name.trim().is_empty() {
                    continue;
                }
                out.push(Self {
                    key: SoapKey::new(&name, cols.text(sheets::BATCH_NUMBER, row)),
                    date: cols.date(sheets::DATE, row),
                    weight_g: cols.number(sheets::WEIGHT_G, row),
                });
            }
        }
        out
    }
}

/// Product of three dimensions when all are present and non-zero.
pub fn dimensions_product(h: Option<f64>, w: Option<f64>, t: Option<f64>) -> Option<f64> {
    match (h, w, t) {
        (Some(h), Some(w), Some(t)) if h != 0.0 && w != 0.0 && t != 0.0 => Some(h * w * t),
        _ => None,
    }
}

fn opt_number(v: Option<f64>) -> String {
    v.map(format_number).unwrap_or_default()
}

/// Column lookup by name for one RecordBatch; absent columns read as blank.
struct Columns<'a> {
    batch: &'a RecordBatch,
}

impl<'a> Columns<'a> {
    fn new(batch: &'a RecordBatch) -> Self {
        Self { batch }
    }

    fn column(&self, name: &str) -> Option<&'a ArrayRef> {
        self.batch.column_by_name(name)
    }

    fn text(&self, name: &str, row: usize) -> String {
        self.column(name)
            .and_then(|c| get_string(c.as_ref(), row))
            .unwrap_or_default()
    }

    fn number(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name)
            .and_then(|c| get_string(c.as_ref(), row))
            .and_then(|s| parse_number(&s))
    }

    fn date(&self, name: &str, row: usize) -> Option<NaiveDate> {
        self.column(name)
            .and_then(|c| get_string(c.as_ref(), row))
            .and_then(|s| parse_date(&s))
    }
}
