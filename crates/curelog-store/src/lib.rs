//! Storage layer: the two record sheets as CSV files, in memory, or in DuckDB.

mod error;
pub use error::StoreError;

mod sheet;
pub use sheet::{Sheet, TabularStore, batches_to_rows, rows_to_batch};

mod csv_store;
pub use csv_store::CsvStore;

mod memory;
pub use memory::MemoryStore;

pub mod ledger;
pub use ledger::{NewSoap, Removed, Snapshot, SoapLedger};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
