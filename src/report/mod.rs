//! Report rendering and output.

pub mod generator;

pub use generator::{
    render, write_report, LineTerminator, OutputFormat, ReportOptions, DEFAULT_INCLUDE_HEADER,
};
