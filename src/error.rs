//! The [`MultiomeError`] `enum` definition and error messages.

use crate::Position;
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// The [`MultiomeError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum MultiomeError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),

    // Fatal pipeline errors, one per failing surface
    #[error("Data loading error: {0}")]
    DataLoad(String),
    #[error("Annotation parsing error: {0}")]
    AnnotationParse(String),
    #[error("Output write error: {0}")]
    OutputWrite(String),

    // File parsing related errors
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("Float parsing error: {0}")]
    ParseFloatError(#[from] ParseFloatError),

    // Invalid genomic range errors
    #[error("Invalid peak identifier '{0}': expected '<chrom>:<start>-<end>'")]
    InvalidPeakName(String),
    #[error("Range invalid: start ({0}) must be less than or equal to end ({1})")]
    InvalidGenomicRange(Position, Position),
    #[error("Position {0} exceeds the maximum supported coordinate (2147483647)")]
    CoordinateOverflow(Position),

    // Output serialization and rendering errors
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Chart rendering error: {0}")]
    Plot(String),

    // Command line tool related errors
    #[error("Command line argument error: {0}")]
    ArgumentError(#[from] clap::error::Error),
}
