//! Merge precedence across environments and tiers

use crate::integration::{bar, foo, load_str, write_file, TwoLayer, BAR_UUID, FOO_UUID};
use prefstack::config::LoadPathEntry;
use prefstack::PreferencesApi;

#[test]
fn test_global_value_inherited_by_project() {
    let fixture = TwoLayer::opencl_global();
    let api = fixture.api();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));
}

#[test]
fn test_project_overrides_global() {
    let fixture = TwoLayer::opencl_global();
    write_file(
        &fixture.project.join("Project.toml"),
        &format!(
            "[deps]\nFoo = \"{}\"\n\n[preferences.Foo]\nbackend = \"CUDA\"\n",
            FOO_UUID
        ),
    );
    let api = fixture.api();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("CUDA"));
}

#[test]
fn test_local_tier_overrides_exported_in_same_environment() {
    let fixture = TwoLayer::new();
    write_file(
        &fixture.project.join("Project.toml"),
        &format!(
            "[deps]\nFoo = \"{}\"\n\n[preferences.Foo]\nbackend = \"OpenCL\"\nthreads = 2\n",
            FOO_UUID
        ),
    );
    write_file(
        &fixture.project.join("LocalPreferences.toml"),
        "[preferences.Foo]\nbackend = \"CUDA\"\n",
    );

    let api = fixture.api();
    let prefs = api.resolve(&foo());
    assert_eq!(prefs.get("backend").and_then(|v| v.as_str()), Some("CUDA"));
    assert_eq!(prefs.get("threads").and_then(|v| v.as_integer()), Some(2));
}

#[test]
fn test_nested_tables_replace_wholesale() {
    let fixture = TwoLayer::new();
    write_file(
        &fixture.global.join("Project.toml"),
        &format!(
            "[deps]\nFoo = \"{}\"\n\n[preferences.Foo.flags]\nopt = 2\ndebug = false\n",
            FOO_UUID
        ),
    );
    write_file(
        &fixture.project.join("LocalPreferences.toml"),
        "[preferences.Foo.flags]\ndebug = true\n",
    );

    let api = fixture.api();
    let flags = api.load(&foo(), "flags", None).unwrap();
    let flags = flags.as_table().unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags["debug"].as_bool(), Some(true));
}

#[test]
fn test_three_layers_nearest_wins() {
    let fixture = TwoLayer::opencl_global();
    let shared = fixture.dir.path().join("shared");
    write_file(
        &shared.join("LocalPreferences.toml"),
        "[preferences.Foo]\nbackend = \"Metal\"\nthreads = 8\n",
    );

    let mut config = fixture.config();
    config
        .load_path
        .insert(1, LoadPathEntry::writable(&shared));
    let api = PreferencesApi::from_config(&config).unwrap();

    assert_eq!(api.stack().len(), 3);
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("Metal"));
    assert_eq!(
        api.load(&foo(), "threads", None).and_then(|v| v.as_integer()),
        Some(8)
    );
}

#[test]
fn test_components_do_not_share_preferences() {
    let fixture = TwoLayer::opencl_global();
    write_file(
        &fixture.project.join("Project.toml"),
        &format!(
            "[deps]\nBar = \"{}\"\n\n[preferences.Bar]\nbackend = \"CUDA\"\n",
            BAR_UUID
        ),
    );
    let api = fixture.api();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));
    assert_eq!(load_str(&api, &bar(), "backend").as_deref(), Some("CUDA"));
}

#[test]
fn test_environment_names_component_its_own_way() {
    let fixture = TwoLayer::opencl_global();
    write_file(
        &fixture.project.join("Project.toml"),
        &format!(
            "[deps]\nFooRenamed = \"{}\"\n\n[preferences.FooRenamed]\nbackend = \"CUDA\"\n",
            FOO_UUID
        ),
    );
    let api = fixture.api();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("CUDA"));
}

#[test]
fn test_duplicate_load_path_entries_collapse() {
    let fixture = TwoLayer::opencl_global();
    let mut config = fixture.config();
    config
        .load_path
        .push(LoadPathEntry::writable(&fixture.project));
    let api = PreferencesApi::from_config(&config).unwrap();
    assert_eq!(api.stack().len(), 2);
    assert_eq!(
        api.stack().active().unwrap().location(),
        dunce::canonicalize(&fixture.project).unwrap()
    );
}

#[test]
fn test_table_under_name_bound_to_other_component_is_not_inherited() {
    let fixture = TwoLayer::opencl_global();
    write_file(
        &fixture.project.join("Project.toml"),
        &format!(
            "[deps]\nFoo = \"{}\"\n\n[preferences.Foo]\nbackend = \"Other\"\n",
            BAR_UUID
        ),
    );
    let api = fixture.api();
    assert_eq!(load_str(&api, &foo(), "backend").as_deref(), Some("OpenCL"));
}
