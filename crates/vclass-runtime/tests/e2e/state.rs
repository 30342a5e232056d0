//! State fields before and after wiring.

use super::harness::*;
use serde_json::json;
use vclass_engine::{ModuleOptions, Modules, Store};
use vclass_runtime::create_store;

// ============================================================================
// Detached
// ============================================================================

#[test]
fn test_state_round_trip_detached() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let facade = todo.facade();
    assert!(!facade.is_attached());

    assert_eq!(facade.get("items").unwrap(), json!([]));
    assert_eq!(facade.get("filter").unwrap(), json!("all"));

    facade.set("filter", json!("done")).unwrap();
    assert_eq!(facade.get("filter").unwrap(), json!("done"));
    facade.set("items", json!(["a", "b"])).unwrap();
    assert_eq!(facade.get("items").unwrap(), json!(["a", "b"]));
}

#[test]
fn test_initial_values_reach_the_store() {
    let todo = module(&todo_class(), ModuleOptions::default());
    todo.facade().set("filter", json!("open")).unwrap();

    let store = root_store(&todo);
    assert_eq!(store.read_state(None, "filter"), Some(json!("open")));
    assert_eq!(store.read_state(None, "items"), Some(json!([])));
}

// ============================================================================
// Attached
// ============================================================================

#[test]
fn test_state_round_trip_attached() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let store = root_store(&todo);
    let probe = Probe::attach(&store);
    let facade = todo.facade();
    assert!(facade.is_attached());

    facade.set("items", json!(["x"])).unwrap();
    assert_eq!(store.read_state(None, "items"), Some(json!(["x"])));
    assert_eq!(facade.get("items").unwrap(), json!(["x"]));
    assert_eq!(probe.commit_kinds(), vec!["items"]);

    // The local snapshot is stale once wired.
    assert_eq!(todo.descriptor().local_state().fields().get("items"), Some(&json!([])));
}

#[test]
fn test_store_is_the_source_of_truth() {
    let counter = module(&counter_class(), ModuleOptions::default());
    let store = root_store(&counter);

    store.commit("count", json!(41)).unwrap();
    assert_eq!(counter.facade().get("count").unwrap(), json!(41));
}

#[test]
fn test_getter_marked_field_reads_through_getter() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let store = root_store(&todo);

    assert_eq!(store.getter_names(), vec!["count", "filter", "nth"]);
    store.commit("filter", json!("done")).unwrap();
    assert_eq!(todo.facade().get("filter").unwrap(), json!("done"));
}

// ============================================================================
// Passthrough
// ============================================================================

#[test]
fn test_excluded_field_stays_local() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let store = root_store(&todo);
    let facade = todo.facade();

    assert_eq!(store.read_state(None, "cache"), None);
    facade.set("cache", json!({ "hit": 1 })).unwrap();
    assert_eq!(facade.get("cache").unwrap(), json!({ "hit": 1 }));
    assert_eq!(store.read_state(None, "cache"), None);
    assert!(!store.mutation_names().contains(&"cache"));
}

#[test]
fn test_strict_store_accepts_facade_writes() {
    let counter = module(&counter_class(), ModuleOptions::default());
    let store = create_store(true, &Modules::new().root(counter.clone()), vec![]).unwrap();
    assert!(store.is_strict());

    counter.facade().set("count", json!(3)).unwrap();
    counter.facade().call("increment", vec![json!(2)]).unwrap();
    assert_eq!(store.read_state(None, "count"), Some(json!(5)));

    let outside = store.module_state(None);
    assert!(matches!(
        outside.set("count", json!(0)),
        Err(vclass_engine::Error::OutsideMutation(_))
    ));
    assert_eq!(store.read_state(None, "count"), Some(json!(5)));
}
