//! Output formatting for console and file export

mod formatter;

pub use formatter::{OutputFormat, ReportFormatter};
