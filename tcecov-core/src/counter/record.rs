//! One source file's block in a counter file

use super::merger::CounterMerger;
use crate::checksum::file_checksum;
use crate::CovError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Keyword opening every block header
pub const HEADER_KEYWORD: &str = "FILE";

/// `FILE <object> <checksum> <bytes> <source> [legacy] <runs>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterHeader {
    pub object: String,
    pub checksum: u32,
    pub bytes: u64,
    pub source: String,
    pub runs: u64,
}

impl CounterHeader {
    pub fn parse(line: &str) -> crate::Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first() != Some(&HEADER_KEYWORD) {
            return Err(CovError::format(
                "header",
                format!("expected '{}' header, got '{}'", HEADER_KEYWORD, line),
            ));
        }
        // Older files carry an extra field before the run count; it is dropped
        let runs_field = match fields.len() {
            6 => fields[5],
            7 => fields[6],
            n => {
                return Err(CovError::format(
                    "header",
                    format!("expected 6 or 7 fields, got {}", n),
                ))
            }
        };

        Ok(Self {
            object: fields[1].to_string(),
            checksum: parse_number(fields[2], "checksum")?,
            bytes: parse_number(fields[3], "byte size")?,
            source: fields[4].to_string(),
            runs: parse_number(runs_field, "run count")?,
        })
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, what: &str) -> crate::Result<T> {
    field
        .parse()
        .map_err(|_| CovError::format("header", format!("invalid {} '{}'", what, field)))
}

impl fmt::Display for CounterHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            HEADER_KEYWORD, self.object, self.checksum, self.bytes, self.source, self.runs
        )
    }
}

/// Header plus the opaque counter lines that follow it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRecord {
    pub header: CounterHeader,
    pub lines: Vec<String>,
}

impl CounterRecord {
    /// Parse a block without checking it against the build tree
    pub fn from_lines<'a>(mut lines: impl Iterator<Item = &'a str>) -> crate::Result<Self> {
        let header_line = lines
            .next()
            .ok_or_else(|| CovError::format("block", "empty counter block"))?;
        let header = CounterHeader::parse(header_line)?;
        Ok(Self {
            header,
            lines: lines.map(str::to_string).collect(),
        })
    }

    pub fn from_text(text: &str) -> crate::Result<Self> {
        Self::from_lines(text.lines())
    }

    /// Parse a block and check its checksum against `build_root`
    pub fn parse_validated(text: &str, build_root: &Path) -> crate::Result<Self> {
        let record = Self::from_text(text)?;
        record.validate(build_root)?;
        Ok(record)
    }

    pub fn source(&self) -> &str {
        &self.header.source
    }

    pub fn checksum(&self) -> u32 {
        self.header.checksum
    }

    /// Fail unless the recorded checksum matches the source file in `build_root`
    pub fn validate(&self, build_root: &Path) -> crate::Result<()> {
        check_source(build_root, &self.header.source, self.header.checksum)
    }

    /// Point the record at another path, which must hold the same bytes
    pub fn set_source(&mut self, new_source: &str, build_root: &Path) -> crate::Result<()> {
        check_source(build_root, new_source, self.header.checksum)?;
        debug!(from = %self.header.source, to = %new_source, "remapped counter source");
        self.header.source = new_source.to_string();
        Ok(())
    }

    /// Fold `other`'s counters into this record through `merger`
    pub fn merge(
        &mut self,
        other: &CounterRecord,
        merger: &dyn CounterMerger,
    ) -> crate::Result<()> {
        if self.header.checksum != other.header.checksum {
            return Err(CovError::merge(
                &self.header.source,
                format!(
                    "checksum {} does not match {} of {}",
                    self.header.checksum, other.header.checksum, other.header.source
                ),
            ));
        }

        let mut merged = merger.merge_counter_sets(self, other)?;
        if merged.header.checksum != self.header.checksum {
            return Err(CovError::merge(
                &self.header.source,
                format!(
                    "merged output has checksum {}, expected {}",
                    merged.header.checksum, self.header.checksum
                ),
            ));
        }
        // Reports key records by source path
        merged.header.source = self.header.source.clone();
        *self = merged;
        Ok(())
    }

    /// Header line followed by counter lines, newline-terminated
    pub fn to_text(&self) -> String {
        let mut out = self.header.to_string();
        out.push('\n');
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

fn check_source(build_root: &Path, source: &str, expected: u32) -> crate::Result<()> {
    let path = build_root.join(source);
    let found = file_checksum(&path)?.checksum;
    if found != expected {
        return Err(CovError::Checksum {
            path,
            expected,
            found,
        });
    }
    Ok(())
}
