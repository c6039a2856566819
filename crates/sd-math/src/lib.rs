//! Status dashboard math utilities.

pub mod math;

pub use math::forecast::*;
pub use math::stats::*;
