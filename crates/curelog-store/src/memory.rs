//! In-memory sheets.

use std::collections::HashMap;

use arrow::record_batch::RecordBatch;

use crate::StoreError;
use crate::sheet::{Sheet, TabularStore, rows_to_batch};

/// Sheets held as rows in memory. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    sheets: HashMap<Sheet, Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, sheet: Sheet) -> usize {
        self.sheets.get(&sheet).map_or(0, Vec::len)
    }
}

impl TabularStore for MemoryStore {
    fn read_all(&self, sheet: Sheet) -> Result<Vec<RecordBatch>, StoreError> {
        match self.sheets.get(&sheet) {
            Some(rows) if !rows.is_empty() => Ok(vec![rows_to_batch(sheet.columns(), rows)?]),
            _ => Ok(Vec::new()),
        }
    }

    fn append_row(&mut self, sheet: Sheet, row: &[String]) -> Result<(), StoreError> {
        sheet.check_width(row)?;
        self.sheets.entry(sheet).or_default().push(row.to_vec());
        Ok(())
    }

    fn overwrite_all(&mut self, sheet: Sheet, rows: &[Vec<String>]) -> Result<(), StoreError> {
        for row in rows {
            sheet.check_width(row)?;
        }
        self.sheets.insert(sheet, rows.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_sheet_reads_as_no_batches() {
        let store = MemoryStore::new();
        assert!(store.read_all(Sheet::Readings).unwrap().is_empty());
        assert!(store.read_rows(Sheet::Batches).unwrap().is_empty());
    }

    #[test]
    fn append_then_read() {
        let mut store = MemoryStore::new();
        store
            .append_row(Sheet::Readings, &row(&["Oat", "", "2026-01-01", "90"]))
            .unwrap();
        store
            .append_row(Sheet::Readings, &row(&["Oat", "", "2026-01-02", "89"]))
            .unwrap();
        let batches = store.read_all(Sheet::Readings).unwrap();
        assert_eq!(batches[0].num_rows(), 2);
        assert_eq!(store.row_count(Sheet::Readings), 2);
        assert_eq!(store.row_count(Sheet::Batches), 0);
    }

    #[test]
    fn overwrite_replaces_rows() {
        let mut store = MemoryStore::new();
        store
            .append_row(Sheet::Readings, &row(&["Oat", "", "2026-01-01", "90"]))
            .unwrap();
        store
            .overwrite_all(Sheet::Readings, &[row(&["Rose", "2", "2026-02-01", "50"])])
            .unwrap();
        let rows = store.read_rows(Sheet::Readings).unwrap();
        assert_eq!(rows, vec![row(&["Rose", "2", "2026-02-01", "50"])]);
    }

    #[test]
    fn wrong_width_is_rejected() {
        let mut store = MemoryStore::new();
        assert!(store.append_row(Sheet::Readings, &row(&["Oat"])).is_err());
        assert!(
            store
                .overwrite_all(Sheet::Readings, &[row(&["Oat", "", "x"])])
                .is_err()
        );
        assert_eq!(store.row_count(Sheet::Readings), 0);
    }
}
