//! HTTP gateway between a price-comparison frontend and a spreadsheet-backed
//! price store.
//!
//! `GET /api/index` looks prices up in the sheet and (for the row schema)
//! folds them together with prices recorded by this process into an
//! average/cheapest/range summary. `POST /api/index` validates a new price
//! observation, remembers it locally and forwards it to the sheet.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod upstream;

pub use api::{router, AppState};
pub use error::Error;
