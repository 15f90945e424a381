//! Spreadsheet-backed persistence of scored records.

pub mod store;

pub use store::{check_columns, HistoryRow, HistoryStore, HISTORY_COLUMNS, RUN_COLUMN};
