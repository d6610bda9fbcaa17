//! Resolve every artifact under a directory in place

use super::file::CoverageFile;
use super::info::{CoverageInfo, SourceKind};
use crate::config::ResolverConfig;
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension of coverage artifacts
pub const ARTIFACT_EXTENSION: &str = "gcov";

/// Outcome of a tree walk
#[derive(Debug, Default, Serialize)]
pub struct ResolveSummary {
    pub scanned: usize,
    pub rewritten: usize,
    pub untouched: usize,
    pub removed: usize,
    /// Declared sources of removed artifacts, sorted and deduplicated
    pub unresolved: BTreeSet<String>,
}

pub struct TreeResolver {
    config: ResolverConfig,
    unresolved_output: Option<PathBuf>,
}

impl TreeResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            unresolved_output: None,
        }
    }

    /// Also write the unresolved sources, one per line, to `path`
    pub fn with_unresolved_output(mut self, path: Option<PathBuf>) -> Self {
        self.unresolved_output = path;
        self
    }

    /// Walk `root`, rewriting remapped artifacts and deleting unresolvable ones
    pub fn resolve_dir(&self, root: &Path) -> crate::Result<ResolveSummary> {
        self.resolve_artifacts(walk_artifacts(root))
    }

    /// Resolve the given artifacts in order.
    ///
    /// Only writing the unresolved list can fail the batch; a bad or
    /// undeletable artifact is logged and listed as unresolved.
    pub fn resolve_artifacts(
        &self,
        artifacts: impl IntoIterator<Item = PathBuf>,
    ) -> crate::Result<ResolveSummary> {
        let mut summary = ResolveSummary::default();

        for artifact in artifacts {
            summary.scanned += 1;
            match self.resolve_artifact(&artifact) {
                Ok(SourceKind::BuildRelative) => summary.untouched += 1,
                Ok(SourceKind::InstallAbsolute) => summary.rewritten += 1,
                Ok(SourceKind::Unresolved) | Err(_) => {
                    let declared = CoverageInfo::read(&artifact)
                        .map(|info| info.original_source)
                        .unwrap_or_else(|_| artifact.display().to_string());
                    match fs::remove_file(&artifact) {
                        Ok(()) => {
                            debug!(artifact = %artifact.display(), source = %declared, "removed unresolved artifact");
                            summary.removed += 1;
                        }
                        Err(e) => {
                            warn!(artifact = %artifact.display(), error = %e, "cannot remove unresolved artifact");
                        }
                    }
                    summary.unresolved.insert(declared);
                }
            }
        }

        if let Some(out) = &self.unresolved_output {
            let mut text = String::new();
            for source in &summary.unresolved {
                text.push_str(source);
                text.push('\n');
            }
            fs::write(out, text)?;
        }

        info!(
            scanned = summary.scanned,
            rewritten = summary.rewritten,
            removed = summary.removed,
            "resolved coverage artifacts"
        );
        Ok(summary)
    }

    /// Resolve one artifact; errors are reported but leave the walk running
    fn resolve_artifact(&self, artifact: &Path) -> crate::Result<SourceKind> {
        let result = self.try_resolve_artifact(artifact);
        if let Err(e) = &result {
            warn!(artifact = %artifact.display(), error = %e, "treating artifact as unresolved");
        }
        result
    }

    fn try_resolve_artifact(&self, artifact: &Path) -> crate::Result<SourceKind> {
        let mut info = CoverageInfo::read(artifact)?;
        let kind = info.resolve(&self.config)?;
        if kind == SourceKind::InstallAbsolute {
            let mut file = CoverageFile::load(artifact)?;
            file.set_source(&info.source)?;
            file.save(artifact)?;
            debug!(artifact = %artifact.display(), source = %info.source, "rewrote artifact source");
        }
        Ok(kind)
    }
}

/// Artifacts below `root` in sorted order
pub fn walk_artifacts(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing::field::Field;
    use tracing::Level;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{Layer, Registry};

    /// Collects the fields of every `warn!` event
    struct WarnCollector {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl<S: tracing::Subscriber> Layer<S> for WarnCollector {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() != Level::WARN {
                return;
            }
            let mut line = String::new();
            event.record(&mut |field: &Field, value: &dyn std::fmt::Debug| {
                line.push_str(&format!("{}={:?} ", field.name(), value));
            });
            self.events.lock().unwrap().push(line);
        }
    }

    fn collect_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = Registry::default().with(WarnCollector {
            events: events.clone(),
        });
        let result = tracing::subscriber::with_default(subscriber, f);
        let warnings = events.lock().unwrap().clone();
        (result, warnings)
    }

    fn resolver(build: &Path) -> TreeResolver {
        TreeResolver::new(ResolverConfig {
            install_root: PathBuf::from("/srv/inst"),
            host_install_root: PathBuf::from("/opt/install"),
            platform_build_root: build.to_path_buf(),
        })
    }

    #[test]
    fn test_undeletable_artifact_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let vanished = dir.path().join("vanished.c.gcov");
        let foreign = dir.path().join("foreign.c.gcov");
        fs::write(&foreign, "        -:     0:Source:/usr/include/stdio.h\n").unwrap();
        let unresolved = dir.path().join("unresolved.txt");

        let (summary, warnings) = collect_warnings(|| {
            resolver(dir.path())
                .with_unresolved_output(Some(unresolved.clone()))
                .resolve_artifacts(vec![vanished.clone(), foreign.clone()])
        });
        let summary = summary.unwrap();

        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.removed, 1);
        assert!(!foreign.exists());
        let listed = fs::read_to_string(&unresolved).unwrap();
        assert!(listed.contains("/usr/include/stdio.h\n"));
        assert!(listed.contains(&format!("{}\n", vanished.display())));
        assert!(warnings
            .iter()
            .any(|w| w.contains("cannot remove unresolved artifact")));
    }

    #[test]
    fn test_walk_errors_are_logged() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-dir");
        let (found, warnings) = collect_warnings(|| walk_artifacts(&missing));
        assert!(found.is_empty());
        assert!(warnings.iter().any(|w| w.contains("skipping unreadable path")));
    }

    #[test]
    fn test_walk_artifacts_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b/c")).unwrap();
        fs::write(dir.path().join("b/c/z.c.gcov"), "").unwrap();
        fs::write(dir.path().join("a.c.gcov"), "").unwrap();
        fs::write(dir.path().join("a.c"), "").unwrap();
        fs::write(dir.path().join(".hidden.gcov"), "").unwrap();

        let found = walk_artifacts(dir.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from(".hidden.gcov"),
                PathBuf::from("a.c.gcov"),
                PathBuf::from("b/c/z.c.gcov"),
            ]
        );
    }
}
