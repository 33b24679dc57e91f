//! Property-based tests for merge and write laws over random stacks

use prefstack::merge::resolve;
use prefstack::store::{Environment, Store};
use prefstack::write::WriteResolver;
use prefstack::{ComponentId, EnvironmentStack, PreferenceMap, PreferenceValue, Tier, Write, WriteOptions};
use proptest::prelude::*;
use std::collections::BTreeMap;
use tempfile::TempDir;
use uuid::Uuid;

const FOO_UUID: &str = "0b9a5a66-8e6b-4f6e-9c1e-2c3d4e5f6a7b";
const KEYS: &[&str] = &["a", "b", "c"];

fn foo() -> ComponentId {
    ComponentId::new(Uuid::parse_str(FOO_UUID).unwrap(), "Foo")
}

/// One tier of one environment: values plus a block list.
#[derive(Debug, Clone)]
struct TierLayout {
    values: BTreeMap<String, i64>,
    blocks: Vec<String>,
}

#[derive(Debug, Clone)]
struct EnvLayout {
    lists_foo: bool,
    exported: TierLayout,
    local: TierLayout,
}

fn key_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(KEYS).prop_map(String::from)
}

fn tier_strategy() -> impl Strategy<Value = TierLayout> {
    (
        prop::collection::btree_map(key_strategy(), 0i64..5, 0..3),
        prop::collection::vec(key_strategy(), 0..2),
    )
        .prop_map(|(values, mut blocks)| {
            blocks.sort();
            blocks.dedup();
            TierLayout { values, blocks }
        })
}

fn env_strategy() -> impl Strategy<Value = EnvLayout> {
    (any::<bool>(), tier_strategy(), tier_strategy()).prop_map(|(lists_foo, exported, local)| {
        EnvLayout {
            lists_foo,
            exported,
            local,
        }
    })
}

fn stack_strategy() -> impl Strategy<Value = Vec<EnvLayout>> {
    prop::collection::vec(env_strategy(), 1..5)
}

fn tier_doc(layout: &TierLayout, base: PreferenceMap) -> PreferenceMap {
    let mut doc = base;
    let mut table = PreferenceMap::new();
    for (key, value) in &layout.values {
        table.insert(key.clone(), PreferenceValue::Integer(*value));
    }
    if !layout.blocks.is_empty() {
        table.insert(
            "__clear__".to_string(),
            PreferenceValue::Array(
                layout.blocks
                    .iter()
                    .map(|k| PreferenceValue::String(k.clone()))
                    .collect(),
            ),
        );
    }
    if !table.is_empty() {
        let mut prefs = PreferenceMap::new();
        prefs.insert("Foo".to_string(), PreferenceValue::Table(table));
        doc.insert("preferences".to_string(), PreferenceValue::Table(prefs));
    }
    doc
}

fn project_base(layout: &EnvLayout) -> PreferenceMap {
    let mut doc = PreferenceMap::new();
    if layout.lists_foo {
        let mut deps = PreferenceMap::new();
        deps.insert("Foo".to_string(), PreferenceValue::from(FOO_UUID));
        doc.insert("deps".to_string(), PreferenceValue::Table(deps));
    }
    doc
}

fn in_memory_stack(layouts: &[EnvLayout]) -> EnvironmentStack {
    EnvironmentStack::new(
        layouts
            .iter()
            .enumerate()
            .map(|(idx, layout)| {
                Environment::from_documents(
                    format!("/envs/{}", idx),
                    tier_doc(&layout.exported, project_base(layout)),
                    tier_doc(&layout.local, PreferenceMap::new()),
                )
            })
            .collect(),
    )
}

fn on_disk_stack(store: &Store, dir: &TempDir, layouts: &[EnvLayout]) -> EnvironmentStack {
    let environments = layouts
        .iter()
        .enumerate()
        .map(|(idx, layout)| {
            let location = dir.path().join(format!("env{}", idx));
            std::fs::create_dir_all(&location).unwrap();
            let project = tier_doc(&layout.exported, project_base(layout));
            let local = tier_doc(&layout.local, PreferenceMap::new());
            std::fs::write(location.join("Project.toml"), toml::to_string(&project).unwrap())
                .unwrap();
            std::fs::write(
                location.join("LocalPreferences.toml"),
                toml::to_string(&local).unwrap(),
            )
            .unwrap();
            store.load_environment(&location, true).unwrap()
        })
        .collect();
    EnvironmentStack::new(environments)
}

fn knows(layout: &EnvLayout) -> bool {
    layout.lists_foo
        || !layout.exported.values.is_empty()
        || !layout.exported.blocks.is_empty()
        || !layout.local.values.is_empty()
        || !layout.local.blocks.is_empty()
}

/// Reference model: scan from the active environment down. The first
/// environment holding the key supplies it; a block stops the scan.
fn expected(layouts: &[EnvLayout], key: &str) -> Option<i64> {
    for layout in layouts.iter().rev() {
        if !knows(layout) {
            continue;
        }
        if let Some(v) = layout.local.values.get(key).or_else(|| layout.exported.values.get(key)) {
            return Some(*v);
        }
        if layout.local.blocks.iter().chain(&layout.exported.blocks).any(|b| b == key) {
            return None;
        }
    }
    None
}

fn resolved(stack: &EnvironmentStack, key: &str) -> Option<i64> {
    resolve(stack, &foo()).get(key).and_then(|v| v.as_integer())
}

#[test]
fn test_resolution_matches_reference_model() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&stack_strategy(), |layouts| {
            let stack = in_memory_stack(&layouts);
            for key in KEYS {
                prop_assert_eq!(resolved(&stack, key), expected(&layouts, key));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_resolution_is_deterministic() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&stack_strategy(), |layouts| {
            let stack = in_memory_stack(&layouts);
            prop_assert_eq!(resolve(&stack, &foo()), resolve(&stack, &foo()));
            prop_assert_eq!(
                resolve(&stack, &foo()),
                resolve(&in_memory_stack(&layouts), &foo())
            );
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_set_then_clear_equals_clear() {
    let config = proptest::test_runner::Config::with_cases(48);
    let mut runner = proptest::test_runner::TestRunner::new(config);

    runner
        .run(&(stack_strategy(), key_strategy(), 10i64..20), |(layouts, key, value)| {
            let store = Store::default();
            let resolver = WriteResolver::new(&store);
            let options = WriteOptions::for_self();

            let dir_a = TempDir::new().unwrap();
            let mut cleared = on_disk_stack(&store, &dir_a, &layouts);
            resolver
                .write(&mut cleared, &foo(), &key, Write::Clear, options)
                .unwrap();

            let dir_b = TempDir::new().unwrap();
            let mut set_cleared = on_disk_stack(&store, &dir_b, &layouts);
            resolver
                .write(
                    &mut set_cleared,
                    &foo(),
                    &key,
                    Write::Set(PreferenceValue::Integer(value)),
                    options,
                )
                .unwrap();
            prop_assert_eq!(resolved(&set_cleared, &key), Some(value));
            resolver
                .write(&mut set_cleared, &foo(), &key, Write::Clear, options)
                .unwrap();

            let cleared_resolved = resolve(&cleared, &foo());
            let set_cleared_resolved = resolve(&set_cleared, &foo());
            prop_assert_eq!(
                cleared_resolved.as_map(),
                set_cleared_resolved.as_map()
            );
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_block_leaves_only_same_environment_exported_value() {
    let config = proptest::test_runner::Config::with_cases(48);
    let mut runner = proptest::test_runner::TestRunner::new(config);

    runner
        .run(&(stack_strategy(), key_strategy()), |(layouts, key)| {
            let store = Store::default();
            let dir = TempDir::new().unwrap();
            let mut stack = on_disk_stack(&store, &dir, &layouts);

            WriteResolver::new(&store)
                .write(&mut stack, &foo(), &key, Write::Block, WriteOptions::for_self())
                .unwrap();

            let active = layouts.last().unwrap();
            let own_exported = active.exported.values.get(&key).copied();
            prop_assert_eq!(resolved(&stack, &key), own_exported);

            let active_env = stack.active().unwrap();
            prop_assert!(active_env.block_list(&foo()).contains(&key));
            prop_assert!(!active_env.has_value(&foo(), Tier::Local, &key));
            Ok(())
        })
        .unwrap();
}
