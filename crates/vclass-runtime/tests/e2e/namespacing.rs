//! Qualified names for namespaced and root modules.

use super::harness::*;
use serde_json::json;
use vclass_engine::{ClassDef, Error, ModuleOptions, Modules, Store, Value};
use vclass_runtime::create_store;

fn app(todo: &vclass_engine::ModuleClass, counter: &vclass_engine::ModuleClass) -> std::sync::Arc<vclass_runtime::MemoryStore> {
    let modules = Modules::new().root(counter.clone()).module("todo", todo.clone());
    create_store(false, &modules, vec![]).unwrap()
}

#[test]
fn test_namespaced_names_are_prefixed() {
    let todo = module(&todo_class(), ModuleOptions::named("todo"));
    let counter = module(&counter_class(), ModuleOptions::default());
    let store = app(&todo, &counter);

    assert_eq!(store.mutation_names(), vec!["count", "increment", "todo/add", "todo/filter", "todo/items"]);
    assert_eq!(store.action_names(), vec!["todo/describe", "todo/load"]);
    assert_eq!(store.getter_names(), vec!["todo/count", "todo/filter", "todo/nth"]);
    assert_eq!(todo.descriptor().qualified("add"), "todo/add");
    assert_eq!(counter.descriptor().qualified("increment"), "increment");
}

#[test]
fn test_state_tree_layout() {
    let todo = module(&todo_class(), ModuleOptions::named("todo"));
    let counter = module(&counter_class(), ModuleOptions::default());
    let store = app(&todo, &counter);

    todo.facade().call("add", vec![json!("milk")]).unwrap();
    counter.facade().call("increment", vec![json!(2)]).unwrap();
    assert_eq!(
        store.state(),
        json!({ "count": 2, "todo": { "items": ["milk"], "filter": "all" } })
    );
    assert_eq!(store.read_state(Some("todo"), "items"), Some(json!(["milk"])));
    assert!(matches!(store.commit("add", json!(["x"])), Err(Error::UnknownMutation(_))));
}

#[test]
fn test_getters_see_module_and_root_scope() {
    let class = ClassDef::builder("Stats")
        .field("factor", json!(10))
        .getter_fn("scaled", vclass_engine::NO_PARAMS, |_, _, ctx| {
            let ctx = ctx.getter().ok_or_else(|| Error::msg("getter context"))?;
            let factor = int(&ctx.state["factor"]);
            let count = int(&ctx.root_state["count"]);
            let local = ctx.getters.getter("tenfold")?.into_value("tenfold")?;
            let rooted = ctx.root_getters.getter("stats/tenfold")?.into_value("tenfold")?;
            Ok(json!([factor * count, local, rooted]))
        })
        .computed("tenfold", |_, args| Ok(json!(int(&args.state["factor"]) * 10)))
        .build();
    let stats = module(&class, ModuleOptions::named("stats"));
    let counter = module(&counter_class(), ModuleOptions::default());

    // Detached: root state is the module state under its name.
    assert_eq!(stats.facade().call("scaled", vec![]).unwrap(), json!([0, 100, 100]));

    counter.facade().set("count", json!(3)).unwrap();
    let modules = Modules::new().root(counter.clone()).module("stats", stats.clone());
    let _store = create_store(false, &modules, vec![]).unwrap();
    assert_eq!(stats.facade().call("scaled", vec![]).unwrap(), json!([30, 100, 100]));
}

#[test]
fn test_child_modules_must_match_their_key() {
    let todo = module(&todo_class(), ModuleOptions::named("todo"));
    let modules = Modules::new().module("tasks", todo.clone());
    assert!(matches!(
        create_store(false, &modules, vec![]),
        Err(Error::ModuleLayout(_))
    ));
    assert!(!todo.facade().is_attached());

    let root = module(&counter_class(), ModuleOptions::named("counter"));
    assert!(matches!(
        create_store(false, &Modules::new().root(root), vec![]),
        Err(Error::ModuleLayout(_))
    ));
}

#[test]
fn test_module_key_cannot_shadow_root_state() {
    let class = ClassDef::builder("Shadow").field("todo", Value::Null).build();
    let root = module(&class, ModuleOptions::default());
    let todo = module(&todo_class(), ModuleOptions::named("todo"));
    let modules = Modules::new().root(root).module("todo", todo);
    assert!(matches!(
        create_store(false, &modules, vec![]),
        Err(Error::ModuleLayout(_))
    ));
}
