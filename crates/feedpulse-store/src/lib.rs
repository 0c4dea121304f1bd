//! Data sources for feedback: the live response table (today) and the
//! pre-classified historical CSV dataset (any other day).

mod error;
mod history;
mod source;
mod table;

pub use error::StoreError;
pub use history::{HistoryStore, records_from_batches};
pub use source::{DataSource, LiveSource, Loaded, response_rows};
pub use table::{Table, read_csv_table};
