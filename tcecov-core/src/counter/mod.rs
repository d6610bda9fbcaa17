//! Counter files: checksum-validated per-source blocks and their merging

mod merger;
mod record;
mod report;

pub use merger::{CounterMerger, ProcessMerger};
pub use record::{CounterHeader, CounterRecord, HEADER_KEYWORD};
pub use report::CounterReport;
