//! End-to-end coverage driving `Engine`, `parser::Parser`, and `runner::run` together against a
//! real temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use rmake::{parser, runner, Engine};

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("rmake-graph-test-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        TempDir(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.0.join(name), content).unwrap();
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.0.join(name)).unwrap_or_default()
    }

    fn exists(&self, name: &str) -> bool {
        self.0.join(name).exists()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn build(dir: &TempDir, makefile: &str, targets: &[&str]) {
    let mut engine = Engine::new(dir.path().to_path_buf());
    let root = engine.root_scope();
    {
        let mut p = parser::Parser::new(&mut engine, root);
        p.parse_str(makefile).unwrap();
    }

    let wanted: Vec<_> = if targets.is_empty() {
        vec![engine.default_target().expect("a default target should exist")]
    } else {
        targets
            .iter()
            .map(|t| engine.declare_target(root, t).unwrap())
            .collect()
    };
    for t in wanted {
        engine.determine_dependencies_for_target(t).unwrap();
    }

    runner::run(&mut engine).unwrap();
}

#[test]
fn test_direct_rule_rebuilds_when_source_is_newer() {
    let dir = TempDir::new("direct");
    dir.write("a.c", "int main(){return 0;}");
    build(
        &dir,
        "a.obj: a.c\n\ttouch a.obj\n",
        &["a.obj"],
    );
    assert!(dir.exists("a.obj"));
}

#[test]
fn test_already_up_to_date_target_is_not_rebuilt() {
    let dir = TempDir::new("uptodate");
    dir.write("a.c", "");
    dir.write("a.obj", "stale-marker");

    // Make `a.obj` look newer than `a.c` by forcing the scheduler's own mtime probe order:
    // touch `a.obj` after `a.c` so the real filesystem clock reflects "already built".
    std::thread::sleep(std::time::Duration::from_millis(10));
    dir.write("a.obj", "stale-marker");

    let mut engine = Engine::new(dir.path().to_path_buf());
    let root = engine.root_scope();
    {
        let mut p = parser::Parser::new(&mut engine, root);
        p.parse_str("a.obj: a.c\n\techo should-not-run > a.obj\n").unwrap();
    }
    let obj = engine.declare_target(root, "a.obj").unwrap();
    engine.determine_dependencies_for_target(obj).unwrap();
    assert!(!engine.target(obj).rebuild_required);

    runner::run(&mut engine).unwrap();
    assert_eq!(dir.read("a.obj"), "stale-marker");
}

#[test]
fn test_chained_inference_rule_builds_through_intermediate() {
    let dir = TempDir::new("chained");
    dir.write("a.y", "");
    build(
        &dir,
        concat!(
            ".y.c:\n\tcp $< $@\n",
            ".c.obj:\n\tcp $< $@\n",
        ),
        &["a.obj"],
    );
    assert!(dir.exists("a.c"));
    assert!(dir.exists("a.obj"));
}

#[test]
fn test_default_target_is_first_real_target_in_file_order() {
    let dir = TempDir::new("default");
    dir.write("a.c", "");
    build(
        &dir,
        "all: a.obj\na.obj: a.c\n\ttouch a.obj\n",
        &[],
    );
    assert!(dir.exists("a.obj"));
}

#[test]
fn test_recipe_ignore_and_silent_prefixes_are_honored() {
    let dir = TempDir::new("prefixes");
    build(
        &dir,
        "all:\n\t@echo quiet\n\t-false\n\ttouch done\n",
        &["all"],
    );
    assert!(dir.exists("done"));
}

#[test]
fn test_missing_recipe_for_unbuildable_target_is_an_error() {
    let dir = TempDir::new("unbuildable");
    let mut engine = Engine::new(dir.path().to_path_buf());
    let root = engine.root_scope();
    {
        let mut p = parser::Parser::new(&mut engine, root);
        p.parse_str("a.obj: a.c\n").unwrap();
    }
    let obj = engine.declare_target(root, "a.obj").unwrap();
    let err = engine.determine_dependencies_for_target(obj).unwrap_err();
    assert_eq!(err.kind, rmake::ErrorKind::NoBuildableRecipe);
}

#[test]
fn test_variable_expansion_and_automatic_variable_cooperate() {
    let dir = TempDir::new("vars");
    dir.write("a.c", "");
    build(
        &dir,
        "CC = cp\nall.obj: a.c\n\t$(CC) $< $@\n",
        &["all.obj"],
    );
    assert!(dir.exists("all.obj"));
}
