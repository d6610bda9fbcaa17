//! tcecov core - coverage data resolution, merging and roll-up
//!
//! This library rewrites `.gcov` artifacts to point at sources in the local
//! build tree, merges checksum-gated counter files through an external
//! merge program, and rolls per-component summary pages up into one report.

pub mod checksum;
pub mod config;
pub mod counter;
pub mod error;
pub mod gcov;
pub mod paths;
pub mod summary;

pub use checksum::{file_checksum, FileChecksum};
pub use config::{Config, ResolverConfig};
pub use counter::{CounterMerger, CounterRecord, CounterReport, ProcessMerger};
pub use error::CovError;
pub use gcov::{CoverageFile, CoverageInfo, CoverageRecord, ResolveSummary, SourceKind, TreeResolver};
pub use summary::{collect_summaries, render_html, SummaryStat, SummaryTree};

/// Result type alias for coverage operations
pub type Result<T> = std::result::Result<T, CovError>;
