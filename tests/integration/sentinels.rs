//! CLEAR and BLOCK semantics, end to end through the files on disk

use crate::integration::{foo, load_str, read_toml, write_file, TwoLayer, FOO_UUID};
use prefstack::config::LoadPathEntry;
use prefstack::{DeleteOptions, PreferenceValue, PreferencesApi, Write, WriteOptions};

fn set(api: &mut PreferencesApi, key: &str, value: &str) {
    api.write(
        &foo(),
        key,
        Write::Set(PreferenceValue::from(value)),
        WriteOptions::default(),
    )
    .unwrap();
}

#[test]
fn test_set_clear_block_scenario() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();

    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));

    set(&mut api, "backend", "CUDA");
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("CUDA"));

    api.write(&foo(), "backend", Write::Clear, WriteOptions::default())
        .unwrap();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));

    api.write(&foo(), "backend", Write::Block, WriteOptions::default())
        .unwrap();
    assert!(!api.has(&foo(), "backend"));

    let global = read_toml(&fixture.global.join("Project.toml"));
    assert_eq!(
        global["preferences"]["Foo"]["backend"].as_str(),
        Some("OpenCL"),
        "blocking never touches the lower environment"
    );

    // A fresh process sees the same state.
    let reopened = fixture.api();
    assert!(!reopened.has(&foo(), "backend"));
}

#[test]
fn test_clear_lifts_block() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();

    api.write(&foo(), "backend", Write::Block, WriteOptions::default())
        .unwrap();
    assert!(!api.has(&foo(), "backend"));

    api.write(&foo(), "backend", Write::Clear, WriteOptions::default())
        .unwrap();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));
}

#[test]
fn test_block_then_set_gives_exact_value() {
    let fixture = TwoLayer::new();
    write_file(
        &fixture.global.join("Project.toml"),
        &format!(
            "[deps]\nFoo = \"{}\"\n\n[preferences.Foo]\nbackend = \"OpenCL\"\n",
            FOO_UUID
        ),
    );
    let mut api = fixture.api();

    api.set(
        &foo(),
        [
            ("backend", Write::Block),
            ("backend", Write::Set(PreferenceValue::from("CUDA"))),
        ],
        WriteOptions::default(),
    )
    .unwrap();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("CUDA"));

    // The set lifted the block, so clearing falls back to inheritance.
    api.write(&foo(), "backend", Write::Clear, WriteOptions::default())
        .unwrap();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));
}

#[test]
fn test_block_in_middle_layer_does_not_hide_higher_values() {
    let fixture = TwoLayer::opencl_global();
    let shared = fixture.dir.path().join("shared");
    write_file(
        &shared.join("LocalPreferences.toml"),
        "[preferences.Foo]\n__clear__ = [\"backend\"]\n",
    );
    write_file(
        &fixture.project.join("LocalPreferences.toml"),
        "[preferences.Foo]\nbackend = \"CUDA\"\n",
    );

    let mut config = fixture.config();
    config.load_path.insert(1, LoadPathEntry::writable(&shared));
    let api = PreferencesApi::from_config(&config).unwrap();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("CUDA"));

    std::fs::remove_file(fixture.project.join("LocalPreferences.toml")).unwrap();
    let api = PreferencesApi::from_config(&config).unwrap();
    assert!(!api.has(&foo(), "backend"));
}

#[test]
fn test_block_is_written_to_clear_list() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();
    api.write(&foo(), "backend", Write::Block, WriteOptions::default())
        .unwrap();

    let local = read_toml(&fixture.project.join("LocalPreferences.toml"));
    let clear = local["preferences"]["Foo"]["__clear__"].as_array().unwrap();
    assert_eq!(clear.len(), 1);
    assert_eq!(clear[0].as_str(), Some("backend"));
    assert!(local["preferences"]["Foo"].get("backend").is_none());
}

#[test]
fn test_delete_with_block_inheritance() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();
    set(&mut api, "backend", "CUDA");

    let outcomes = api
        .delete(
            &foo(),
            ["backend"],
            DeleteOptions {
                block_inheritance: true,
                ..DeleteOptions::default()
            },
        )
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(!api.has(&foo(), "backend"));
}

#[test]
fn test_delete_clear_reveals_inherited_value() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();
    set(&mut api, "backend", "CUDA");

    api.delete(&foo(), ["backend"], DeleteOptions::default())
        .unwrap();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));
}
