//! LOD table validation errors.

use thiserror::Error;

/// Errors returned when building LOD tables from configuration.
#[derive(Debug, Error, PartialEq)]
pub enum LodError {
    /// A table must contain at least one entry.
    #[error("{0} table must not be empty")]
    EmptyTable(&'static str),

    /// Entries must be strictly monotonic in the documented direction.
    #[error("{0} table must be strictly {1}")]
    NotMonotonic(&'static str, &'static str),

    /// A screen-size threshold fell outside `[0, 1]`.
    #[error("{table} threshold {value} is outside [0, 1]")]
    OutOfRange {
        /// Table name.
        table: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A resolution of zero pixels was configured.
    #[error("{0} table contains a zero resolution")]
    ZeroResolution(&'static str),
}
