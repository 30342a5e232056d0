//! Native accessors and derived computations.

use super::harness::*;
use serde_json::json;
use vclass_engine::Store;
use vclass_engine::{ClassDef, Error, ModuleOptions, Value};

fn thermometer() -> ClassDef {
    ClassDef::builder("Thermometer")
        .field("kelvin", json!(273))
        .computed("celsius", |_, args| Ok(json!(int(&args.state["kelvin"]) - 273)))
        .setter("celsius", |_, value, args| args.state.set("kelvin", json!(int(&value) + 273)))
        .setter("reset", |_, _, args| args.state.set("kelvin", json!(0)))
        .build()
}

#[test]
fn test_get_only_accessor_is_read_only() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let facade = todo.facade();

    assert_eq!(facade.get("count").unwrap(), json!(0));
    assert!(matches!(facade.set("count", json!(5)), Err(Error::ReadOnly(_))));

    let store = root_store(&todo);
    assert!(matches!(facade.set("count", json!(5)), Err(Error::ReadOnly(_))));
    assert!(!store.mutation_names().contains(&"count"));
}

#[test]
fn test_accessor_tracks_current_state() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let facade = todo.facade();
    facade.call("add", vec![json!("a")]).unwrap();
    assert_eq!(facade.get("count").unwrap(), json!(1));

    let store = root_store(&todo);
    store.commit("items", json!(["a", "b", "c"])).unwrap();
    assert_eq!(facade.get("count").unwrap(), json!(3));
    let via_store = store.getter("count").unwrap().into_value("count").unwrap();
    assert_eq!(via_store, json!(3));
}

#[test]
fn test_accessor_pair_routes_through_mutation() {
    let thermo = module(&thermometer(), ModuleOptions::default());
    let facade = thermo.facade();

    facade.set("celsius", json!(10)).unwrap();
    assert_eq!(facade.get("kelvin").unwrap(), json!(283));

    let store = root_store(&thermo);
    let probe = Probe::attach(&store);
    facade.set("celsius", json!(-273)).unwrap();
    assert_eq!(store.read_state(None, "kelvin"), Some(json!(0)));
    assert_eq!(facade.get("celsius").unwrap(), json!(-273));
    assert_eq!(probe.commit_kinds(), vec!["celsius"]);
}

#[test]
fn test_set_only_accessor_is_write_only() {
    let thermo = module(&thermometer(), ModuleOptions::default());
    let facade = thermo.facade();
    assert!(matches!(facade.get("reset"), Err(Error::WriteOnly(_))));
    facade.set("reset", Value::Null).unwrap();
    assert_eq!(facade.get("kelvin").unwrap(), json!(0));
}

#[test]
fn test_derived_computation_with_arguments() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let facade = todo.facade();
    facade.set("items", json!(["a", "b"])).unwrap();
    assert_eq!(facade.call("nth", vec![json!(1)]).unwrap(), json!("b"));

    let store = root_store(&todo);
    store.commit("items", json!(["x", "y", "z"])).unwrap();
    assert_eq!(facade.call("nth", vec![json!(2)]).unwrap(), json!("z"));
    // Omitted arguments are padded with null.
    assert_eq!(facade.call("nth", vec![]).unwrap(), json!("x"));

    let nth = store.getter("nth").unwrap();
    assert!(nth.is_function());
    assert_eq!(nth.call("nth", vec![json!(0)]).unwrap(), json!("x"));
}

#[test]
fn test_user_errors_pass_through() {
    let class = ClassDef::builder("Failing")
        .field("n", json!(0))
        .mutation("explode", vclass_engine::NO_PARAMS, |_, _, _| Err(Error::msg("boom")))
        .build();
    let failing = module(&class, ModuleOptions::default());

    let err = failing.facade().call("explode", vec![]).unwrap_err();
    assert_eq!(err.to_string(), "boom");

    let _store = root_store(&failing);
    let err = failing.facade().call("explode", vec![]).unwrap_err();
    assert!(matches!(err, Error::Custom(_)));
    assert_eq!(err.to_string(), "boom");
}
