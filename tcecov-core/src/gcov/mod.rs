//! `.gcov` artifacts: line records, whole files and source path resolution

mod file;
mod info;
mod record;
mod tree;

pub use file::{CoverageFile, SOURCE_TAG};
pub use info::{CoverageInfo, SourceKind};
pub use record::CoverageRecord;
pub use tree::{walk_artifacts, ResolveSummary, TreeResolver, ARTIFACT_EXTENSION};
