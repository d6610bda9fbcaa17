//! A whole `.gcov` artifact as an ordered list of records

use super::record::CoverageRecord;
use crate::CovError;
use std::fs;
use std::path::Path;

/// Metadata tag naming the source file an artifact describes
pub const SOURCE_TAG: &str = "Source";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageFile {
    pub records: Vec<CoverageRecord>,
}

impl CoverageFile {
    /// Parse artifact text; format errors name the 1-indexed line
    pub fn parse(content: &str) -> crate::Result<Self> {
        let records = content
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                CoverageRecord::parse(line).map_err(|e| e.at(format!("line {}", idx + 1)))
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| e.at(path.display()))
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Serialize, one newline-terminated line per record
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for rec in &self.records {
            out.push_str(&rec.to_string());
            out.push('\n');
        }
        out
    }

    /// Declared source path, if the artifact has one
    pub fn source(&self) -> Option<&str> {
        self.records.iter().find_map(|rec| match rec {
            CoverageRecord::Info { tag, value } if tag == SOURCE_TAG => Some(value.as_str()),
            _ => None,
        })
    }

    /// Rewrite the value of the `Source` metadata record
    pub fn set_source(&mut self, new_source: &str) -> crate::Result<()> {
        let value = self
            .records
            .iter_mut()
            .find_map(|rec| match rec {
                CoverageRecord::Info { tag, value } if tag == SOURCE_TAG => Some(value),
                _ => None,
            })
            .ok_or_else(|| CovError::format("artifact", "no Source metadata record"))?;
        *value = new_source.to_string();
        Ok(())
    }
}
