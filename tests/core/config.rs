use hybrid_rag::core::config::{DEFAULT_CONFIG_FILE, Settings, load_settings};
use hybrid_rag::core::error::HybridRagError;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn missing_default_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let settings = load_settings(None, dir.path()).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.retrieval.top_k, 2);
    assert_eq!(settings.store.sample_size, 2);
    assert_eq!(settings.generation.args, vec!["-m", "{model}"]);
}

#[test]
fn partial_file_overrides_only_named_keys() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        r#"
[store]
db_path = "/srv/music.db"

[retrieval]
top_k = 5

[audit]
events_path = "/var/log/hybrid-rag/turns.events.jsonl"
"#,
    )
    .unwrap();

    let settings = load_settings(None, dir.path()).unwrap();
    assert_eq!(settings.store.db_path, PathBuf::from("/srv/music.db"));
    assert_eq!(settings.store.row_limit, 200);
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.retrieval.chunk_size, 512);
    assert_eq!(
        settings.audit.events_path.as_deref(),
        Some(std::path::Path::new("/var/log/hybrid-rag/turns.events.jsonl"))
    );
    assert_eq!(settings.logging.format, "compact");
}

#[test]
fn malformed_file_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[store\ndb_path = ").unwrap();

    let err = load_settings(Some(&path), dir.path()).unwrap_err();
    assert!(matches!(err, HybridRagError::ConfigError(_)), "{err:?}");
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    let err = Settings::from_toml_str("[retrieval]\nchunk_size = 10\nchunk_overlap = 10\n").unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));

    assert!(Settings::from_toml_str("[store]\nrow_limit = 0\n").is_err());
    assert!(Settings::from_toml_str("[retrieval]\ndimensions = 0\n").is_err());
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nowhere.toml");
    let err = load_settings(Some(&missing), dir.path()).unwrap_err();
    assert!(err.to_string().contains("nowhere.toml"));
}

#[test]
fn explicit_path_wins_over_default_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[retrieval]\ntop_k = 9\n").unwrap();
    let explicit = dir.path().join("other.toml");
    fs::write(&explicit, "[generation]\nmodel = \"local-small\"\n").unwrap();

    let settings = load_settings(Some(&explicit), dir.path()).unwrap();
    assert_eq!(settings.generation.model, "local-small");
    assert_eq!(settings.retrieval.top_k, 2);
}
