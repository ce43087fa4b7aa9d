//! DuckDB-backed sheets.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use duckdb::{Connection, params_from_iter};
use tracing::info;

use crate::StoreError;
use crate::sheet::{Sheet, TabularStore};

/// DuckDB store holding each sheet as a table of `VARCHAR` columns.
///
/// A hidden `row_id` column, filled from a per-table sequence, keeps rows in
/// the order they were written, the way a spreadsheet does.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across process restarts.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.ensure_tables()?;
        info!(path = %path.display(), "opened duckdb store");
        Ok(store)
    }

    fn ensure_tables(&self) -> Result<(), StoreError> {
        for sheet in Sheet::ALL {
            let name = sheet.name();
            let cols: Vec<String> = sheet
                .columns()
                .iter()
                .map(|c| format!("\"{c}\" VARCHAR"))
                .collect();
            let sql = format!(
                "CREATE SEQUENCE IF NOT EXISTS {name}_seq;
                 CREATE TABLE IF NOT EXISTS {name} (
                     row_id BIGINT DEFAULT nextval('{name}_seq'),
                     {}
                 );",
                cols.join(", ")
            );
            self.conn.execute_batch(&sql)?;
        }
        Ok(())
    }

    /// Number of rows in a sheet.
    pub fn count(&self, sheet: Sheet) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*) FROM {}", sheet.name());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn insert_sql(sheet: Sheet) -> String {
        let cols = sheet.columns();
        let placeholders = vec!["?"; cols.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            sheet.name(),
            column_list(sheet)
        )
    }
}

/// Quoted column names; `type` and `date` collide with SQL keywords.
fn column_list(sheet: Sheet) -> String {
    sheet
        .columns()
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

impl TabularStore for DuckStore {
    fn read_all(&self, sheet: Sheet) -> Result<Vec<RecordBatch>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY row_id",
            column_list(sheet),
            sheet.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt
            .query_arrow([])?
            .filter(|b| b.num_rows() > 0)
            .collect();
        Ok(batches)
    }

    fn append_row(&mut self, sheet: Sheet, row: &[String]) -> Result<(), StoreError> {
        sheet.check_width(row)?;
        self.conn.execute(
            &Self::insert_sql(sheet),
            params_from_iter(row.iter().map(String::as_str)),
        )?;
        Ok(())
    }

    fn overwrite_all(&mut self, sheet: Sheet, rows: &[Vec<String>]) -> Result<(), StoreError> {
        for row in rows {
            sheet.check_width(row)?;
        }
        let insert = Self::insert_sql(sheet);
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", sheet.name()), [])?;
        for row in rows {
            tx.execute(&insert, params_from_iter(row.iter().map(String::as_str)))?;
        }
        tx.commit()?;
        info!(sheet = sheet.name(), rows = rows.len(), "rewrote sheet");
        Ok(())
    }
}
