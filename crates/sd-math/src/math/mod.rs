//! Core math modules.

pub mod forecast;
pub mod stats;
