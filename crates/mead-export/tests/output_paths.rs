use std::fs;

use mead_export::{find_model_version, get_output_paths};
use tempfile::tempdir;

#[test]
fn missing_or_empty_directory_starts_at_one() {
    let dir = tempdir().expect("tempdir");
    assert_eq!(find_model_version(dir.path()).expect("version"), "1");
    assert_eq!(
        find_model_version(&dir.path().join("nope")).expect("version"),
        "1"
    );
}

#[test]
fn next_version_follows_the_largest_numeric_directory() {
    let dir = tempdir().expect("tempdir");
    for name in ["3", "7", "x"] {
        fs::create_dir(dir.path().join(name)).expect("mkdir");
    }
    fs::write(dir.path().join("12"), b"not a directory").expect("file");
    assert_eq!(find_model_version(dir.path()).expect("version"), "8");
}

#[test]
fn exhausted_version_numbers_are_an_error() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir(dir.path().join(u64::MAX.to_string())).expect("mkdir");
    let err = find_model_version(dir.path()).expect_err("no successor");
    assert_eq!(err.code(), "mead.export_version");

    let out = dir.path().join("out");
    fs::create_dir_all(out.join("p").join(u64::MAX.to_string())).expect("mkdir");
    let err =
        get_output_paths(&out, Some("p"), None, None, false, true).expect_err("no successor");
    assert_eq!(err.code(), "mead.export_version");
}

#[test]
fn remote_export_without_project_uses_the_basename() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let paths = get_output_paths(&out, None, None, Some("2"), true, true).expect("paths");
    assert_eq!(paths.client, out.join("client").join("out").join("2"));
    assert_eq!(paths.server, out.join("server").join("out").join("2"));
    assert!(paths.client.is_dir());
    assert!(paths.server.is_dir());
}

#[test]
fn local_export_collapses_the_client_prefix() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let paths =
        get_output_paths(&out, Some("p"), Some("n"), Some("1"), false, true).expect("paths");
    let expected = out.join("p").join("n").join("1");
    assert_eq!(paths.client, expected);
    assert_eq!(paths.server, expected);
    assert!(expected.is_dir());
    assert!(!out.join("client").exists());
    assert!(!out.join("server").exists());
}

#[test]
fn version_is_sniffed_from_the_server_prefix() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("models");
    let first =
        get_output_paths(&out, Some("ner"), Some("conll"), None, true, true).expect("first");
    assert_eq!(first.server, out.join("server").join("ner").join("conll").join("1"));
    let second =
        get_output_paths(&out, Some("ner"), Some("conll"), None, true, true).expect("second");
    assert_eq!(second.server, out.join("server").join("ner").join("conll").join("2"));
    assert_eq!(second.client, out.join("client").join("ner").join("conll").join("2"));
}

#[test]
fn make_server_false_leaves_the_server_directory_alone() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let paths = get_output_paths(&out, Some("p"), None, Some("4"), true, false).expect("paths");
    assert!(paths.client.is_dir());
    assert_eq!(paths.server, out.join("server").join("p").join("4"));
    assert!(!paths.server.exists());
}

#[test]
fn existing_export_is_not_overwritten() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("out");
    get_output_paths(&out, Some("p"), Some("n"), Some("1"), false, true).expect("first");
    let err = get_output_paths(&out, Some("p"), Some("n"), Some("1"), false, true)
        .expect_err("already exported");
    assert_eq!(err.code(), "mead.export_exists");
    assert_eq!(
        err.info().hint.as_deref(),
        Some("pick another version or leave it unset")
    );
}
