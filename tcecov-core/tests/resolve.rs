use std::fs;
use std::path::Path;
use tcecov_core::{ResolverConfig, TreeResolver};
use tempfile::TempDir;

fn artifact(source: &str) -> String {
    format!(
        "        -:     0:Source:{}\n        -:     0:Runs:1\n        1:     1:int a;\n",
        source
    )
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_resolve_tree() {
    let build = TempDir::new().unwrap();
    let artifacts = TempDir::new().unwrap();

    write(&build.path().join("src/rel.c"), "int a;\n");
    write(&build.path().join("srv/inst/src/foo.c"), "int a;\n");

    let foo = artifacts.path().join("agents/foo.c.gcov");
    let rel = artifacts.path().join("agents/rel.c.gcov");
    let foreign = artifacts.path().join("lib/foreign.c.gcov");
    let missing = artifacts.path().join("lib/missing.c.gcov");
    write(&foo, &artifact("/opt/install/src/foo.c"));
    write(&rel, &artifact("src/rel.c"));
    write(&foreign, &artifact("/usr/include/stdio.h"));
    write(&missing, &artifact("src/missing.c"));
    write(&artifacts.path().join("notes.txt"), "not an artifact\n");

    let unresolved = artifacts.path().join("unresolved.txt");
    let resolver = TreeResolver::new(ResolverConfig {
        install_root: "/srv/inst".into(),
        host_install_root: "/opt/install".into(),
        platform_build_root: build.path().to_path_buf(),
    })
    .with_unresolved_output(Some(unresolved.clone()));

    let summary = resolver.resolve_dir(artifacts.path()).unwrap();
    assert_eq!(summary.scanned, 4);
    assert_eq!(summary.rewritten, 1);
    assert_eq!(summary.untouched, 1);
    assert_eq!(summary.removed, 2);

    assert_eq!(
        fs::read_to_string(&foo).unwrap(),
        artifact("/srv/inst/src/foo.c")
    );
    assert_eq!(fs::read_to_string(&rel).unwrap(), artifact("src/rel.c"));
    assert!(!foreign.exists());
    assert!(!missing.exists());
    assert_eq!(
        fs::read_to_string(&unresolved).unwrap(),
        "/usr/include/stdio.h\nsrc/missing.c\n"
    );
}
