pub mod api;
pub mod chat;
pub mod config;
pub mod dataset;
pub mod error;
pub mod portal;
pub mod query;
pub mod record;

pub use dataset::{Field, Row, Table};
pub use error::{Error, Result};
pub use query::{FilterMode, Filters, GroupedRow};
pub use record::{GroupedRecord, YearValue};
