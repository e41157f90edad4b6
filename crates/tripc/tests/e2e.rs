//! End-to-end integration tests for the `tripc` binary: compile then link,
//! driving the CLI surface the way a user would.

use std::path::PathBuf;
use std::process::Command;

fn find_tripc() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();
    if path.file_name().map_or(false, |n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }
    let bin = path.join("tripc");
    assert!(
        bin.exists(),
        "tripc binary not found at {}. Run `cargo build -p tripc` first.",
        bin.display()
    );
    bin
}

#[test]
fn compiles_and_links_an_identity_main() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.trip");
    let obj = dir.path().join("a.tripc");
    std::fs::write(&src, "module A\nlet main : forall X. X -> X = /\\X. \\x:X. x\nexport main\n").unwrap();

    let tripc = find_tripc();
    let compile = Command::new(&tripc).args([&src, &obj]).output().unwrap();
    assert!(compile.status.success(), "compile failed: {}", String::from_utf8_lossy(&compile.stderr));

    let link = Command::new(&tripc).arg("--link").arg(&obj).output().unwrap();
    assert!(link.status.success(), "link failed: {}", String::from_utf8_lossy(&link.stderr));
    assert_eq!(String::from_utf8_lossy(&link.stdout).trim(), "I");
}

#[test]
fn ambiguous_export_across_modules_fails_with_exit_code_1() {
    let dir = tempfile::tempdir().unwrap();
    let a_src = dir.path().join("a.trip");
    let b_src = dir.path().join("b.trip");
    let a_obj = dir.path().join("a.tripc");
    let b_obj = dir.path().join("b.tripc");
    std::fs::write(&a_src, "module A\nlet helper = \\x. x\nexport helper\n").unwrap();
    std::fs::write(&b_src, "module B\nlet helper = \\x. x\nexport helper\n").unwrap();

    let tripc = find_tripc();
    for (src, obj) in [(&a_src, &a_obj), (&b_src, &b_obj)] {
        let compile = Command::new(&tripc).args([src, obj]).output().unwrap();
        assert!(compile.status.success(), "compile failed: {}", String::from_utf8_lossy(&compile.stderr));
    }

    let link = Command::new(&tripc).arg("--link").arg(&a_obj).arg(&b_obj).output().unwrap();
    assert_eq!(link.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&link.stderr).contains("helper"));
}

#[test]
fn rejects_a_source_path_with_the_wrong_extension() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.txt");
    let obj = dir.path().join("a.tripc");
    std::fs::write(&src, "module A\n").unwrap();

    let output = Command::new(find_tripc()).args([&src, &obj]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains(".trip"));
}

#[test]
fn linking_with_no_object_files_fails() {
    let output = Command::new(find_tripc()).arg("--link").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least one"));
}
