//! Everything that talks to the spreadsheet macro.

mod client;
mod sheet;

pub use client::{RetryPolicy, SheetClient};
pub use sheet::{sheet_for, Lookup, ObjectSheet, PriceSheet, RecordReply, RowSheet};
