//! Terminal output: throughput formatting and the live status line

pub mod format;
pub mod status;

pub use format::format_throughput;
pub use status::{Spinner, StatusLine, StatusReporter};
