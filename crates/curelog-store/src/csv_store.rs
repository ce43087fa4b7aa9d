//! CSV-backed sheets: one file per sheet in a data directory.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use tracing::{debug, info};

use crate::StoreError;
use crate::sheet::{Sheet, TabularStore, rows_to_batch};

/// Directory of `soap_batches.csv` and `weight_readings.csv`.
///
/// Each file starts with a header row. Files are created on first write;
/// a missing file reads as an empty sheet. Files written by hand may use a
/// different column order or omit optional columns; columns are matched by
/// header name on read.
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    /// Open (and create if needed) a data directory.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        info!(dir = %dir.display(), "opened csv store");
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a sheet.
    pub fn path(&self, sheet: Sheet) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet.name()))
    }

    /// Header row and data rows of a sheet file, or `None` if it has no header.
    fn read_file(&self, sheet: Sheet) -> Result<Option<(Vec<String>, Vec<Vec<String>>)>, StoreError> {
        let path = self.path(sheet);
        if !path.exists() || fs::metadata(&path)?.len() == 0 {
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)?;
        let header: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Some((header, rows)))
    }

    fn has_canonical_header(&self, sheet: Sheet) -> Result<Option<bool>, StoreError> {
        let path = self.path(sheet);
        if !path.exists() || fs::metadata(&path)?.len() == 0 {
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new().from_path(&path)?;
        let header = reader.headers()?;
        Ok(Some(
            header.len() == sheet.columns().len()
                && header
                    .iter()
                    .zip(sheet.columns())
                    .all(|(h, c)| h.trim() == *c),
        ))
    }
}

/// Add a newline if the file's last line is unterminated, as hand-edited
/// files often are. The file must be open for reading and appending.
fn terminate_last_line(file: &mut File) -> std::io::Result<()> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

impl TabularStore for CsvStore {
    fn read_all(&self, sheet: Sheet) -> Result<Vec<RecordBatch>, StoreError> {
        let Some((header, rows)) = self.read_file(sheet)? else {
            return Ok(Vec::new());
        };
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        debug!(sheet = sheet.name(), rows = rows.len(), "read csv sheet");
        Ok(vec![rows_to_batch(&header, &rows)?])
    }

    fn append_row(&mut self, sheet: Sheet, row: &[String]) -> Result<(), StoreError> {
        sheet.check_width(row)?;
        match self.has_canonical_header(sheet)? {
            Some(true) => {
                let mut file = OpenOptions::new()
                    .read(true)
                    .append(true)
                    .open(self.path(sheet))?;
                terminate_last_line(&mut file)?;
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(file);
                writer.write_record(row)?;
                writer.flush()?;
                debug!(sheet = sheet.name(), "appended row");
                Ok(())
            }
            Some(false) => {
                // Rewrite in the canonical layout so the new row lines up.
                let mut rows = self.read_rows(sheet)?;
                rows.push(row.to_vec());
                info!(sheet = sheet.name(), "migrating sheet to canonical columns");
                self.overwrite_all(sheet, &rows)
            }
            None => self.overwrite_all(sheet, &[row.to_vec()]),
        }
    }

    fn overwrite_all(&mut self, sheet: Sheet, rows: &[Vec<String>]) -> Result<(), StoreError> {
        for row in rows {
            sheet.check_width(row)?;
        }
        let path = self.path(sheet);
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            writer.write_record(sheet.columns())?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        info!(sheet = sheet.name(), rows = rows.len(), "rewrote sheet");
        Ok(())
    }
}
