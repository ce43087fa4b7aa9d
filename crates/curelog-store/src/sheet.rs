//! The two record sheets and the row-store interface over them.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use curelog_core::cells::get_string;
use curelog_core::sheets;

use crate::StoreError;

/// One of the two sheets of the record book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sheet {
    Batches,
    Readings,
}

impl Sheet {
    pub const ALL: [Sheet; 2] = [Sheet::Batches, Sheet::Readings];

    /// Table / file stem name.
    pub fn name(self) -> &'static str {
        match self {
            Sheet::Batches => sheets::BATCHES,
            Sheet::Readings => sheets::READINGS,
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Sheet::Batches => sheets::BATCH_COLUMNS,
            Sheet::Readings => sheets::READING_COLUMNS,
        }
    }

    pub fn schema(self) -> Schema {
        match self {
            Sheet::Batches => sheets::batches_schema(),
            Sheet::Readings => sheets::readings_schema(),
        }
    }

    /// Reject rows that do not have exactly one cell per column.
    pub fn check_width(self, row: &[String]) -> Result<(), StoreError> {
        let expected = self.columns().len();
        if row.len() != expected {
            return Err(StoreError::RowWidth {
                sheet: self.name(),
                expected,
                got: row.len(),
            });
        }
        Ok(())
    }
}

/// A row-oriented store holding the two sheets.
///
/// Reads return all rows as Arrow batches of `Utf8` columns. Writes either
/// append one row or replace the whole sheet, which is all a spreadsheet
/// offers.
pub trait TabularStore {
    /// All rows of a sheet. A sheet that was never written reads as empty.
    fn read_all(&self, sheet: Sheet) -> Result<Vec<RecordBatch>, StoreError>;

    /// Append one row, in [`Sheet::columns`] order.
    fn append_row(&mut self, sheet: Sheet, row: &[String]) -> Result<(), StoreError>;

    /// Clear the sheet and write `rows` in its place.
    fn overwrite_all(&mut self, sheet: Sheet, rows: &[Vec<String>]) -> Result<(), StoreError>;

    /// All rows as raw cells in [`Sheet::columns`] order; absent columns and
    /// null cells read as empty strings.
    fn read_rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, StoreError> {
        let batches = self.read_all(sheet)?;
        Ok(batches_to_rows(sheet, &batches))
    }
}

impl<T: TabularStore + ?Sized> TabularStore for Box<T> {
    fn read_all(&self, sheet: Sheet) -> Result<Vec<RecordBatch>, StoreError> {
        (**self).read_all(sheet)
    }

    fn append_row(&mut self, sheet: Sheet, row: &[String]) -> Result<(), StoreError> {
        (**self).append_row(sheet, row)
    }

    fn overwrite_all(&mut self, sheet: Sheet, rows: &[Vec<String>]) -> Result<(), StoreError> {
        (**self).overwrite_all(sheet, rows)
    }
}

/// Build a `Utf8` RecordBatch from raw rows. Short rows are padded with nulls.
pub fn rows_to_batch<S: AsRef<str>>(
    columns: &[S],
    rows: &[Vec<String>],
) -> Result<RecordBatch, StoreError> {
    let schema = Arc::new(sheets::text_schema(columns));
    let arrays: Vec<ArrayRef> = (0..columns.len())
        .map(|c| {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|r| r.get(c).map(String::as_str))
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Flatten batches back to rows in the sheet's canonical column order.
pub fn batches_to_rows(sheet: Sheet, batches: &[RecordBatch]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for batch in batches {
        let cols: Vec<Option<&ArrayRef>> = sheet
            .columns()
            .iter()
            .map(|name| batch.column_by_name(name))
            .collect();
        for row in 0..batch.num_rows() {
            rows.push(
                cols.iter()
                    .map(|c| {
                        c.and_then(|c| get_string(c.as_ref(), row))
                            .unwrap_or_default()
                    })
                    .collect(),
            );
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sheet_names_and_widths() {
        assert_eq!(Sheet::Batches.name(), "soap_batches");
        assert_eq!(Sheet::Readings.columns().len(), 4);
        assert_eq!(Sheet::Batches.schema().fields().len(), 10);
    }

    #[test]
    fn check_width_rejects_short_rows() {
        let err = Sheet::Readings.check_width(&row(&["Oat", ""])).unwrap_err();
        assert!(matches!(
            err,
            StoreError::RowWidth {
                expected: 4,
                got: 2,
                ..
            }
        ));
        assert!(
            Sheet::Readings
                .check_width(&row(&["Oat", "", "2026-01-01", "90"]))
                .is_ok()
        );
    }

    #[test]
    fn rows_round_trip_through_batch() {
        let rows = vec![
            row(&["Oat", "1", "2026-01-01", "90"]),
            row(&["Rose", "", "2026-01-02"]),
        ];
        let batch = rows_to_batch(Sheet::Readings.columns(), &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert!(batch.column(3).is_null(1));

        let back = batches_to_rows(Sheet::Readings, &[batch]);
        assert_eq!(back[0], rows[0]);
        assert_eq!(back[1], row(&["Rose", "", "2026-01-02", ""]));
    }

    #[test]
    fn missing_columns_read_as_blank() {
        let batch =
            rows_to_batch(&["soap_name", "date"], &[row(&["Oat", "2026-01-01"])]).unwrap();
        let back = batches_to_rows(Sheet::Readings, &[batch]);
        assert_eq!(back, vec![row(&["Oat", "", "2026-01-01", ""])]);
    }
}
