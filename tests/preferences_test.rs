use worklist_rs::error::Error;
use worklist_rs::preferences::{FilePreferences, PreferenceStore};

#[test]
fn missing_file_defaults_to_auto_advance() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = FilePreferences::load(dir.path().join("prefs.toml")).unwrap();
    assert!(prefs.auto_advance());
}

#[test]
fn toggle_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.toml");

    let mut prefs = FilePreferences::load(&path).unwrap();
    prefs.set_auto_advance(false).unwrap();
    assert!(path.exists());

    let reloaded = FilePreferences::load(&path).unwrap();
    assert!(!reloaded.auto_advance());
    assert_eq!(reloaded.path(), path.as_path());
}

#[test]
fn empty_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.toml");
    std::fs::write(&path, "").unwrap();

    assert!(FilePreferences::load(&path).unwrap().auto_advance());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.toml");
    std::fs::write(&path, "auto_advance = \"sometimes\"").unwrap();

    assert!(matches!(FilePreferences::load(&path), Err(Error::TomlDe(_))));
}
