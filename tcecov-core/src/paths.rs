//! Lexical path helpers shared by the resolvers and the counter report.
//!
//! None of these touch the filesystem beyond reading the current directory,
//! so they work for paths recorded on other hosts.

use std::path::{Component, Path, PathBuf};

/// Normalize `.` and `..` components without following symlinks
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Absolute, normalized form of `path`
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Place `path` under `root` even when `path` is absolute.
///
/// `Path::join` would discard `root` for an absolute `path`; here
/// `/srv/inst/a.c` under `/build` becomes `/build/srv/inst/a.c`.
pub fn join_under(root: &Path, path: &Path) -> PathBuf {
    let rel: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(rel)
}

/// Relative path leading from directory `base` to `target`
pub fn relative_to(base: &Path, target: &Path) -> std::io::Result<PathBuf> {
    let base = absolute(base)?;
    let target = absolute(target)?;

    let base_comps: Vec<_> = base.components().collect();
    let target_comps: Vec<_> = target.components().collect();
    let common = base_comps
        .iter()
        .zip(&target_comps)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_comps.len() {
        out.push("..");
    }
    for comp in &target_comps[common..] {
        out.push(comp.as_os_str());
    }
    Ok(out)
}

/// Render a path with forward slashes, as recorded in coverage files
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_join_under() {
        assert_eq!(
            join_under(Path::new("/build"), Path::new("/srv/inst/a.c")),
            PathBuf::from("/build/srv/inst/a.c")
        );
        assert_eq!(
            join_under(Path::new("/build"), Path::new("src/a.c")),
            PathBuf::from("/build/src/a.c")
        );
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/home/me/build"), Path::new("/home/ci/build/src/a.c")).unwrap(),
            PathBuf::from("../../ci/build/src/a.c")
        );
        assert_eq!(
            relative_to(Path::new("/b"), Path::new("/b/src/a.c")).unwrap(),
            PathBuf::from("src/a.c")
        );
    }
}
