//! Status dashboard core library.
//!
//! Data flow for a forecast request:
//! store fetch per month ([`store`]) → windowed series ([`window`]) →
//! per-series estimation and keyed bundles ([`aggregate`], [`forecast`]) →
//! chart rendering ([`present`]) → JSON over HTTP ([`server`]).
//!
//! The live-status panels ([`status`]) and the current-month usage snapshot
//! ([`usage`], [`thresholds`]) share the same store and HTTP boundary.

pub mod aggregate;
pub mod cli;
pub mod exit_codes;
pub mod forecast;
pub mod logging;
pub mod present;
pub mod server;
pub mod status;
pub mod store;
pub mod thresholds;
pub mod usage;
pub mod window;

pub use aggregate::ForecastBundle;
pub use forecast::ForecastReport;
pub use store::{DashboardStore, DataFetchError};
