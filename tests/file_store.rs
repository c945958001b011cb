//! File backend behaviour, including state surviving a restart

use name_keeper::attributes::PersistentAttributes;
use name_keeper::config::PersistenceBackend;
use name_keeper::envelope::Request;
use name_keeper::handlers::{MY_NAME_IS_INTENT, USER_NAME_SLOT, WHATS_MY_NAME_INTENT};
use name_keeper::persistence::{FileStore, PersistenceAdapter};
use name_keeper::{standard_skill, RequestEnvelope, SkillConfig, SkillError};
use std::fs;
use std::path::PathBuf;

const USER: &str = "amzn1.ask.account.AB/CD+EF";

#[test]
fn test_save_load_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path(), "names");

    assert_eq!(store.load(USER).unwrap(), None);

    store
        .save(USER, &PersistentAttributes::with_user_name("Ada"))
        .unwrap();
    assert_eq!(
        store.load(USER).unwrap(),
        Some(PersistentAttributes::with_user_name("Ada"))
    );

    store.delete(USER).unwrap();
    assert_eq!(store.load(USER).unwrap(), None);

    // Deleting again is not an error
    store.delete(USER).unwrap();
}

#[test]
fn test_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path(), "names");

    store
        .save(USER, &PersistentAttributes::with_user_name("Ada"))
        .unwrap();
    store
        .save(USER, &PersistentAttributes::with_user_name("Grace"))
        .unwrap();

    let record = store.load_record(USER).unwrap().unwrap();
    assert_eq!(record.partition_key, USER);
    assert_eq!(record.attributes.user_name.as_deref(), Some("Grace"));
}

#[test]
fn test_keys_stay_inside_table_dir() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path(), "names");

    store
        .save("../escape", &PersistentAttributes::with_user_name("Ada"))
        .unwrap();

    let files: Vec<_> = fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(!dir.path().join("escape.json").exists());
}

#[test]
fn test_corrupt_record_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path(), "names");
    store
        .save("user-1", &PersistentAttributes::with_user_name("Ada"))
        .unwrap();
    fs::write(store.dir().join("user-1.json"), "{ not json").unwrap();

    let err = store.load("user-1").unwrap_err();
    assert!(matches!(err, SkillError::PersistenceError(_)));
}

#[test]
fn test_name_survives_restart() {
    let data = tempfile::tempdir().unwrap();
    let config = SkillConfig::default()
        .with_languages_dir(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("languages"))
        .with_data_dir(data.path())
        .with_backend(PersistenceBackend::File);

    let set = RequestEnvelope::new(
        Request::intent("en-US", MY_NAME_IS_INTENT).with_slot(USER_NAME_SLOT, "Ada"),
    )
    .with_user(USER);
    standard_skill(&config).invoke(&set);

    // A fresh skill over the same directory sees the saved name
    let get = RequestEnvelope::new(Request::intent("en-US", WHATS_MY_NAME_INTENT)).with_user(USER);
    let out = standard_skill(&config).invoke(&get);
    assert!(out.response.speech_text().unwrap().contains("Ada"));

    let record = FileStore::new(data.path(), &config.persistence.table_name)
        .load_record(USER)
        .unwrap()
        .unwrap();
    assert_eq!(record.attributes.user_name.as_deref(), Some("Ada"));
}
