//! Where writes land: active environment, nearest referencing environment,
//! forced creation, read-only targets.

use crate::integration::{bar, foo, load_str, read_toml, write_file, TwoLayer, BAR_UUID};
use prefstack::{
    PreferenceError, PreferenceValue, PreferencesApi, StoreError, Tier, Write, WriteOptions,
};

#[test]
fn test_default_write_goes_to_active_local_tier() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();

    let outcome = api
        .write(
            &foo(),
            "backend",
            Write::Set(PreferenceValue::from("CUDA")),
            WriteOptions::default(),
        )
        .unwrap();

    assert_eq!(outcome.tier, Tier::Local);
    assert_eq!(outcome.location, dunce::canonicalize(&fixture.project).unwrap());
    assert!(outcome.registered);

    let local = read_toml(&fixture.project.join("LocalPreferences.toml"));
    assert_eq!(local["preferences"]["Foo"]["backend"].as_str(), Some("CUDA"));
    let project = read_toml(&fixture.project.join("Project.toml"));
    assert!(project["extras"].get("Foo").is_some());
}

#[test]
fn test_search_stack_writes_to_referencing_environment() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();

    let outcome = api
        .write(
            &foo(),
            "threads",
            Write::Set(PreferenceValue::Integer(16)),
            WriteOptions::default().search_stack(),
        )
        .unwrap();

    assert_eq!(outcome.location, dunce::canonicalize(&fixture.global).unwrap());
    assert!(!outcome.registered);
    assert!(!fixture.project.join("LocalPreferences.toml").exists());
    assert_eq!(
        api.load(&foo(), "threads", None).and_then(|v| v.as_integer()),
        Some(16)
    );
}

#[test]
fn test_export_writes_project_file() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();

    api.write(
        &foo(),
        "backend",
        Write::Set(PreferenceValue::from("CUDA")),
        WriteOptions::default().exported(),
    )
    .unwrap();

    let project = read_toml(&fixture.project.join("Project.toml"));
    assert_eq!(project["preferences"]["Foo"]["backend"].as_str(), Some("CUDA"));
    assert!(!fixture.project.join("LocalPreferences.toml").exists());
}

#[test]
fn test_unknown_component_requires_force() {
    let fixture = TwoLayer::opencl_global();
    let mut api = fixture.api();

    let err = api
        .write(
            &bar(),
            "mode",
            Write::Set(PreferenceValue::from("fast")),
            WriteOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, PreferenceError::NotFound(_)));
    assert!(!fixture.project.join("LocalPreferences.toml").exists());

    api.write(
        &bar(),
        "mode",
        Write::Set(PreferenceValue::from("fast")),
        WriteOptions::default().forced(),
    )
    .unwrap();
    assert_eq!(load_str(&api, &bar(), "mode").as_deref(), Some("fast"));

    let project = read_toml(&fixture.project.join("Project.toml"));
    assert_eq!(project["extras"]["Bar"].as_str(), Some(BAR_UUID));
}

#[test]
fn test_component_handle_may_always_create_its_entry() {
    let fixture = TwoLayer::new();
    let mut api = fixture.api();
    let mut prefs = api.component(bar());
    prefs.set("mode", "fast").unwrap();
    assert!(prefs.has("mode"));
}

#[test]
fn test_read_only_target_fails_and_leaves_state() {
    let fixture = TwoLayer::opencl_global();
    let mut api = PreferencesApi::from_config(&fixture.config_with(true)).unwrap();

    let err = api
        .write(
            &foo(),
            "backend",
            Write::Set(PreferenceValue::from("CUDA")),
            WriteOptions::default().search_stack(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        PreferenceError::Store(StoreError::ReadOnly(_))
    ));
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));

    let global = read_toml(&fixture.global.join("Project.toml"));
    assert_eq!(global["preferences"]["Foo"]["backend"].as_str(), Some("OpenCL"));
}

#[test]
fn test_empty_stack_rejects_writes() {
    let fixture = TwoLayer::new();
    let mut config = fixture.config();
    config.load_path.clear();
    let mut api = PreferencesApi::from_config(&config).unwrap();

    let err = api
        .write(
            &foo(),
            "backend",
            Write::Set(PreferenceValue::from("CUDA")),
            WriteOptions::for_self(),
        )
        .unwrap_err();
    assert!(matches!(err, PreferenceError::EmptyStack));
    assert!(!api.has(&foo(), "backend"));
}

#[test]
fn test_write_refuses_name_taken_by_other_component() {
    let fixture = TwoLayer::opencl_global();
    write_file(
        &fixture.project.join("Project.toml"),
        &format!("[extras]\nFoo = \"{}\"\n", BAR_UUID),
    );
    let mut api = fixture.api();

    let err = api.component(foo()).set("backend", "CUDA").unwrap_err();
    assert!(matches!(err, PreferenceError::NameConflict { .. }));

    let project = read_toml(&fixture.project.join("Project.toml"));
    assert_eq!(project["extras"]["Foo"].as_str(), Some(BAR_UUID));
    assert!(!fixture.project.join("LocalPreferences.toml").exists());
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));
}

#[test]
fn test_failed_local_persist_leaves_project_file_untouched() {
    let fixture = TwoLayer::opencl_global();
    write_file(&fixture.project.join("Project.toml"), "name = \"App\"\n");
    std::fs::create_dir_all(fixture.project.join("LocalPreferences.toml.tmp")).unwrap();
    let mut api = fixture.api();

    let err = api
        .write(
            &foo(),
            "backend",
            Write::Set(PreferenceValue::from("CUDA")),
            WriteOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        PreferenceError::Store(StoreError::Persist { .. })
    ));

    let project = read_toml(&fixture.project.join("Project.toml"));
    assert_eq!(project["name"].as_str(), Some("App"));
    assert!(project.get("extras").is_none());
    assert_eq!(load_str(&fixture.api(), &foo(), "backend").as_deref(), Some("OpenCL"));
}
