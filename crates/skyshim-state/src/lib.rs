//! skyshim-state — write-once report storage.
//!
//! Backed by [redb](https://docs.rs/redb). A report is written once under
//! its key and read back as the exact bytes that were stored; the store
//! never interprets them. Reports produced by periodic status runs land
//! here so an external reader can fetch them later.
//!
//! The `ReportStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::{status_report_key, ReportStore};
