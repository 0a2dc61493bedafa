use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Copy a fixture directory into an isolated temp dir and return both.
fn isolated_fixture(name: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let src = Path::new("tests/fixtures").join(name);
    let path = tmp.path().to_path_buf();
    copy_dir_recursive(&src, &path);
    (tmp, path)
}

fn copy_dir_recursive(src: &Path, dst: &Path) {
    for entry in std::fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let dest_path = dst.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            std::fs::create_dir_all(&dest_path).unwrap();
            copy_dir_recursive(&entry.path(), &dest_path);
        } else {
            std::fs::copy(entry.path(), &dest_path).unwrap();
        }
    }
}

fn doclink_at(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_doclink"));
    cmd.current_dir(dir);
    cmd
}

#[test]
fn resolve_prints_the_absolute_url() {
    let (_tmp, dir) = isolated_fixture("shapes");

    let output = doclink_at(&dir)
        .args(["resolve", "/ShapeKit/Circle/area()", "--symbol-link"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "resolve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "doc://com.example.shapes/ShapeKit/Circle/area()"
    );
}

#[test]
fn module_prefix_may_be_omitted_for_a_single_module() {
    let (_tmp, dir) = isolated_fixture("shapes");

    let output = doclink_at(&dir)
        .args(["resolve", "Circle/area()", "--symbol-link"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "resolve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn articles_resolve_without_the_symbol_flag() {
    let (_tmp, dir) = isolated_fixture("shapes");

    let output = doclink_at(&dir)
        .args(["resolve", "GettingStarted"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "resolve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/Shapes/GettingStarted"), "stdout: {stdout}");
}

#[test]
fn unresolved_links_exit_one_with_a_diagnostic() {
    let (_tmp, dir) = isolated_fixture("shapes");

    let output = doclink_at(&dir)
        .args(["resolve", "/ShapeKit/Triangle"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error: Unresolved Link"),
        "stderr: {stderr}"
    );
}

#[test]
fn relative_resolution_ascends_from_the_parent() {
    let (_tmp, dir) = isolated_fixture("shapes");

    let output = doclink_at(&dir)
        .args([
            "resolve",
            "../Square",
            "--parent",
            "/ShapeKit/Circle/area()",
            "--symbol-link",
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "resolve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/ShapeKit/Square"), "stdout: {stdout}");
}

#[test]
fn paths_lists_every_symbol() {
    let (_tmp, dir) = isolated_fixture("shapes");

    let output = doclink_at(&dir).arg("paths").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("s:8ShapeKit6CircleV4areaSdyF\t/ShapeKit/Circle/area()"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("s:8ShapeKit6SquareV\t/ShapeKit/Square"));
}

#[test]
fn dump_draws_the_tree() {
    let (_tmp, dir) = isolated_fixture("shapes");

    let output = doclink_at(&dir).arg("dump").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ShapeKit"), "stdout: {stdout}");
    assert!(
        stdout.contains('├') || stdout.contains('╰'),
        "stdout: {stdout}"
    );
}
