//! Status dashboard common types, IDs, and errors.
//!
//! This crate provides foundational types shared across sd-core modules:
//! - Calendar months and the month-name conventions of upstream tables
//! - Metric observations and fixed-window series
//! - Request identifiers for log correlation
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod id;
pub mod month;
pub mod observation;
pub mod output;
pub mod schema;

pub use error::{Error, Result};
pub use id::RequestId;
pub use month::{CalendarMonth, MonthNameStyle};
pub use observation::{MetricObservation, MetricSeries, WINDOW_MONTHS};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
