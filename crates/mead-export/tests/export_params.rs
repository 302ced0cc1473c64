use std::path::PathBuf;

use mead_export::{get_export_params, ExportOverrides, DEFAULT_OUTPUT_DIR};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn defaults_apply_when_nothing_is_set() {
    let params = get_export_params(&json!({}), &ExportOverrides::default()).expect("params");
    assert_eq!(params.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert_eq!(params.project, None);
    assert_eq!(params.name, None);
    assert_eq!(params.model_version, None);
    assert_eq!(params.exporter_type, "default");
    assert!(!params.return_labels);
    assert!(params.is_remote);
}

#[test]
fn config_values_fill_unset_overrides() {
    let config = json!({
        "output_dir": "/srv/models",
        "project": "ner",
        "name": "conll",
        "model_version": 3,
        "exporter_type": "preproc",
        "return_labels": "true",
        "is_remote": "no"
    });
    let params = get_export_params(&config, &ExportOverrides::default()).expect("params");
    assert_eq!(params.output_dir, PathBuf::from("/srv/models"));
    assert_eq!(params.project.as_deref(), Some("ner"));
    assert_eq!(params.name.as_deref(), Some("conll"));
    assert_eq!(params.model_version.as_deref(), Some("3"));
    assert_eq!(params.exporter_type, "preproc");
    assert!(params.return_labels);
    assert!(!params.is_remote);
}

#[test]
fn call_arguments_win_over_config() {
    let config = json!({"project": "ner", "type": "default", "is_remote": true});
    let overrides = ExportOverrides {
        output_dir: Some(PathBuf::from("/tmp/exports")),
        project: Some("intent".into()),
        exporter_type: Some("grpc".into()),
        is_remote: Some(false),
        ..ExportOverrides::default()
    };
    let params = get_export_params(&config, &overrides).expect("params");
    assert_eq!(params.output_dir, PathBuf::from("/tmp/exports"));
    assert_eq!(params.project.as_deref(), Some("intent"));
    assert_eq!(params.exporter_type, "grpc");
    assert!(!params.is_remote);
}

#[test]
fn type_takes_precedence_over_exporter_type() {
    let config = json!({"type": "preproc", "exporter_type": "default"});
    let params = get_export_params(&config, &ExportOverrides::default()).expect("params");
    assert_eq!(params.exporter_type, "preproc");
}

#[test]
fn non_boolean_flags_are_rejected() {
    let err = get_export_params(&json!({"return_labels": "sometimes"}), &ExportOverrides::default())
        .expect_err("bad flag");
    assert_eq!(err.code(), "mead.bool_expected");
}

#[test]
fn params_build_their_output_paths() {
    let dir = tempdir().expect("tempdir");
    let config = json!({
        "output_dir": dir.path().join("models").display().to_string(),
        "project": "ner",
        "is_remote": false
    });
    let params = get_export_params(&config, &ExportOverrides::default()).expect("params");
    let paths = params.output_paths(true).expect("paths");
    assert_eq!(paths.server, dir.path().join("models").join("ner").join("1"));
    assert!(paths.server.is_dir());
}
