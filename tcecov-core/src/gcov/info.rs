//! Classify and remap the source path an artifact declares

use super::file::SOURCE_TAG;
use super::record::CoverageRecord;
use crate::config::ResolverConfig;
use crate::paths::{join_under, normalize, to_slash};
use crate::CovError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Not (yet) mapped to anything on this machine
    Unresolved,
    /// Relative to the build tree, usable as is
    BuildRelative,
    /// Absolute under the host install tree, remapped to the local one
    InstallAbsolute,
}

/// Header of one artifact, read without parsing the annotated lines
#[derive(Debug, Clone)]
pub struct CoverageInfo {
    pub artifact: PathBuf,
    /// Source path as written in the artifact
    pub original_source: String,
    /// Source path after remapping
    pub source: String,
    pub kind: SourceKind,
}

impl CoverageInfo {
    /// Read metadata records up to the `Source` one
    pub fn read(artifact: &Path) -> crate::Result<Self> {
        let reader = BufReader::new(File::open(artifact)?);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let record = CoverageRecord::parse(&line)
                .map_err(|e| e.at(format!("{}: line {}", artifact.display(), idx + 1)))?;
            match record {
                CoverageRecord::Info { tag, value } if tag == SOURCE_TAG => {
                    return Ok(Self::new(artifact, value));
                }
                CoverageRecord::Text { .. } => break,
                _ => {}
            }
        }
        Err(CovError::format(
            artifact.display().to_string(),
            "no Source metadata in header",
        ))
    }

    pub fn new(artifact: &Path, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            artifact: artifact.to_path_buf(),
            original_source: source.clone(),
            source,
            kind: SourceKind::Unresolved,
        }
    }

    /// Classify the declared source and check it exists in the platform build tree.
    ///
    /// Absolute paths outside the host install tree stay `Unresolved`; that
    /// is not an error. A classified path whose file is missing is.
    pub fn resolve(&mut self, config: &ResolverConfig) -> crate::Result<SourceKind> {
        let declared = Path::new(&self.original_source);

        if declared.has_root() {
            let host_root = normalize(&config.host_install_root);
            let normalized = normalize(declared);
            match normalized.strip_prefix(&host_root) {
                Ok(rest) => {
                    self.source = to_slash(&config.install_root.join(rest));
                    self.kind = SourceKind::InstallAbsolute;
                }
                Err(_) => {
                    self.kind = SourceKind::Unresolved;
                    return Ok(self.kind);
                }
            }
        } else {
            self.kind = SourceKind::BuildRelative;
        }

        let on_disk = join_under(&config.platform_build_root, Path::new(&self.source));
        if !on_disk.is_file() {
            return Err(CovError::Resolution {
                path: self.artifact.clone(),
                message: format!(
                    "source '{}' not found at {}",
                    self.source,
                    on_disk.display()
                ),
            });
        }
        Ok(self.kind)
    }
}
