//! A counter file: one validated record per source path

use super::merger::CounterMerger;
use super::record::{CounterRecord, HEADER_KEYWORD};
use crate::checksum::file_checksum;
use crate::paths::{relative_to, to_slash};
use crate::CovError;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CounterReport {
    build_root: PathBuf,
    records: BTreeMap<String, CounterRecord>,
    merger: Arc<dyn CounterMerger>,
}

impl CounterReport {
    /// Empty report whose records are checked against `build_root`
    pub fn new(build_root: impl Into<PathBuf>, merger: Arc<dyn CounterMerger>) -> Self {
        Self {
            build_root: build_root.into(),
            records: BTreeMap::new(),
            merger,
        }
    }

    /// Load a counter file. Any bad block fails the whole load.
    pub fn read(
        path: &Path,
        build_root: impl Into<PathBuf>,
        merger: Arc<dyn CounterMerger>,
    ) -> crate::Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut report = Self::new(build_root, merger);
        for (line_no, block) in split_blocks(&text).map_err(|e| e.at(path.display()))? {
            let record = CounterRecord::from_lines(block.into_iter())
                .map_err(|e| e.at(format!("{}: line {}", path.display(), line_no)))?;
            record.validate(&report.build_root)?;
            report.add(record)?;
        }
        debug!(path = %path.display(), records = report.len(), "read counter report");
        Ok(report)
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, source: &str) -> Option<&CounterRecord> {
        self.records.get(source)
    }

    /// Records sorted by source path
    pub fn records(&self) -> impl Iterator<Item = &CounterRecord> {
        self.records.values()
    }

    /// Insert `record`, merging it into an existing record for the same source
    pub fn add(&mut self, record: CounterRecord) -> crate::Result<()> {
        match self.records.entry(record.source().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                slot.get_mut().merge(&record, self.merger.as_ref())?;
            }
        }
        Ok(())
    }

    /// Merge a report that may come from a build rooted elsewhere.
    ///
    /// A record whose checksum disagrees with what this report expects for
    /// its path is re-pointed, relative to this build root, at the file the
    /// other report was validated against.
    pub fn merge_from(&mut self, other: CounterReport) -> crate::Result<()> {
        let other_root = other.build_root;
        let mut remapped = 0usize;
        for (source, mut record) in other.records {
            let expected = match self.records.get(&source) {
                Some(existing) => Some(existing.checksum()),
                None => file_checksum(&self.build_root.join(&source))
                    .ok()
                    .map(|sum| sum.checksum),
            };

            if expected != Some(record.checksum()) {
                let relative = relative_to(&self.build_root, &other_root.join(&source))?;
                record.set_source(&to_slash(&relative), &self.build_root)?;
                remapped += 1;
            }
            self.add(record)?;
        }
        info!(records = self.len(), remapped, "merged counter reports");
        Ok(())
    }

    /// Serialize every block in source path order
    pub fn to_text(&self) -> String {
        self.records.values().map(CounterRecord::to_text).collect()
    }

    pub fn write(&self, path: &Path) -> crate::Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }
}

/// Split counter file text into blocks, each tagged with its header's line number
fn split_blocks(text: &str) -> crate::Result<Vec<(usize, Vec<&str>)>> {
    let mut blocks: Vec<(usize, Vec<&str>)> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.split_whitespace().next() == Some(HEADER_KEYWORD) {
            blocks.push((idx + 1, vec![line]));
        } else if let Some((_, block)) = blocks.last_mut() {
            block.push(line);
        } else if !line.trim().is_empty() {
            return Err(CovError::format(
                format!("line {}", idx + 1),
                "counter data before the first FILE header",
            ));
        }
    }
    Ok(blocks)
}
