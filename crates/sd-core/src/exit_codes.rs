//! Exit codes for the sd-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//! They are stable across releases.

use sd_common::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed
    Ok = 0,

    /// Configuration could not be resolved or failed validation
    ConfigError = 10,

    /// The store could not be opened or queried
    DataAccessError = 11,

    /// The HTTP server could not bind or stopped unexpectedly
    ServeError = 12,

    /// I/O error
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Ok)
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Map an error to its exit code by error-code range.
    pub fn for_error(err: &Error) -> Self {
        if err.is_data_access() {
            return ExitCode::DataAccessError;
        }
        match err.code() {
            10..=19 => ExitCode::ConfigError,
            30..=39 => ExitCode::ServeError,
            60..=69 => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
