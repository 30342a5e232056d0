//! The counter walkthrough: mutate locally, wire, keep mutating.

use super::harness::*;
use serde_json::json;
use vclass_engine::{ModuleOptions, Modules, Store, ROOT_MODULE};
use vclass_runtime::{create_store, logger_plugin};

#[test]
fn test_counter_scenario() {
    init_tracing();
    let counter = module(&counter_class(), ModuleOptions::default());
    let facade = counter.facade();

    facade.call("increment", vec![json!(5)]).unwrap();
    assert_eq!(facade.get("count").unwrap(), json!(5));

    let mut modules = Modules::new();
    modules.insert(ROOT_MODULE, counter.clone());
    let store = create_store(false, &modules, vec![logger_plugin()]).unwrap();
    assert_eq!(facade.get("count").unwrap(), json!(5));
    assert_eq!(store.read_state(None, "count"), Some(json!(5)));

    facade.call("increment", vec![json!(3)]).unwrap();
    assert_eq!(facade.get("count").unwrap(), json!(8));
    assert_eq!(store.state(), json!({ "count": 8 }));
}

#[test]
fn test_counter_commits_are_observable() {
    let counter = module(&counter_class(), ModuleOptions::default());
    let store = root_store(&counter);
    let probe = Probe::attach(&store);

    counter.facade().call("increment", vec![json!(2)]).unwrap();
    // The body writes through the facade, so the field commit nests inside.
    assert_eq!(probe.commit_kinds(), vec!["count", "increment"]);
    let commits = probe.commits.lock();
    assert_eq!(commits[1].1, json!([2]));
}

#[test]
fn test_instances_share_the_module() {
    let counter = module(&counter_class(), ModuleOptions::default());
    let a = counter.instantiate(vec![]).unwrap();
    let b = counter.instantiate(vec![]).unwrap();

    a.call("increment", vec![json!(1)]).unwrap();
    assert_eq!(b.get("count").unwrap(), json!(1));
}
