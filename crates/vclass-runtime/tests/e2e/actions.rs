//! Action forwarding and the unmarked-method policy.

use super::harness::*;
use serde_json::json;
use vclass_engine::{ClassDef, Error, MemberRole, ModuleOptions, Modules, UnmarkedMethodPolicy, Value, NO_PARAMS};
use vclass_runtime::create_store;

#[test]
fn test_action_runs_directly_before_wiring() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let result = block_on(todo.facade().dispatch("load", vec![json!(3)])).unwrap();
    assert_eq!(result, json!({ "wired": false, "count": 3 }));
}

#[test]
fn test_action_dispatches_once_after_wiring() {
    let todo = module(&todo_class(), ModuleOptions::named("todo"));
    let store = create_store(false, &Modules::new().module("todo", todo.clone()), vec![]).unwrap();
    let probe = Probe::attach(&store);

    let result = block_on(todo.facade().dispatch("load", vec![json!(1)])).unwrap();
    assert_eq!(result, json!({ "wired": true, "count": 1 }));

    assert_eq!(probe.dispatched(), 1);
    let dispatches = probe.dispatches.lock();
    assert_eq!(dispatches[0].kind, "todo/load");
    assert_eq!(dispatches[0].payload, json!([1]));
    assert_eq!(probe.commit_kinds(), vec!["todo/add"]);
}

#[test]
fn test_action_pads_declared_defaults() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let store = root_store(&todo);

    block_on(todo.facade().dispatch("load", vec![])).unwrap();
    assert_eq!(todo.facade().get("items").unwrap(), json!(["item0", "item1"]));
    assert_eq!(todo.descriptor().cached_arg_count("load"), Some(1));
    drop(store);
}

#[test]
fn test_action_failures_pass_through() {
    let class = ClassDef::builder("Remote")
        .action("fetch", ["url"], |_, args, _| async move {
            Err::<Value, _>(Error::msg(format!("unreachable: {}", args[0].as_str().unwrap_or(""))))
        })
        .build();
    let remote = module(&class, ModuleOptions::default());
    let err = block_on(remote.facade().dispatch("fetch", vec![json!("a")])).unwrap_err();
    assert_eq!(err.to_string(), "unreachable: a");

    let _store = root_store(&remote);
    let err = block_on(remote.facade().dispatch("fetch", vec![json!("b")])).unwrap_err();
    assert_eq!(err.to_string(), "unreachable: b");
}

#[test]
fn test_action_context_commits_in_namespace() {
    let class = ClassDef::builder("Session")
        .field("user", Value::Null)
        .action("login", ["name"], |_, args, ctx| {
            let engine = ctx.action().and_then(|a| a.context.clone());
            async move {
                let ctx = engine.ok_or_else(|| Error::msg("needs a store"))?;
                ctx.commit("user", args[0].clone())?;
                Ok::<_, Error>(ctx.store.read_state(ctx.namespace.as_deref(), "user").unwrap_or(Value::Null))
            }
        })
        .build();
    let session = module(&class, ModuleOptions::named("session"));
    assert!(block_on(session.facade().dispatch("login", vec![json!("ada")])).is_err());

    let _store = create_store(false, &Modules::new().module("session", session.clone()), vec![]).unwrap();
    let user = block_on(session.facade().dispatch("login", vec![json!("ada")])).unwrap();
    assert_eq!(user, json!("ada"));
    assert_eq!(session.facade().get("user").unwrap(), json!("ada"));
}

// ============================================================================
// Unmarked methods
// ============================================================================

#[test]
fn test_unmarked_method_defaults_to_action() {
    let todo = module(&todo_class(), ModuleOptions::default());
    let facade = todo.facade();
    assert_eq!(facade.role_of("describe"), Some(MemberRole::AsyncOperation));
    assert!(matches!(facade.call("describe", vec![]), Err(Error::WrongKind { .. })));

    let store = root_store(&todo);
    let probe = Probe::attach(&store);
    facade.set("items", json!(["a"])).unwrap();
    assert_eq!(block_on(facade.dispatch("describe", vec![])).unwrap(), json!("1 items"));
    assert_eq!(probe.dispatched(), 1);
}

#[test]
fn test_unmarked_method_passthrough() {
    let options = ModuleOptions::default().with_unmarked_methods(UnmarkedMethodPolicy::Passthrough);
    let todo = module(&todo_class(), options);
    let store = root_store(&todo);
    let probe = Probe::attach(&store);
    let facade = todo.facade();

    assert_eq!(facade.role_of("describe"), Some(MemberRole::Passthrough));
    assert!(!store.action_names().contains(&"describe"));
    assert_eq!(facade.call("describe", vec![]).unwrap(), json!("0 items"));
    assert_eq!(probe.dispatched(), 0);
}

#[test]
fn test_sync_method_as_action_resolves_immediately() {
    let class = ClassDef::builder("Ping")
        .method("ping", NO_PARAMS, |_, _, _| Ok(json!("pong")))
        .build();
    let ping = module(&class, ModuleOptions::default());
    let _store = root_store(&ping);
    assert_eq!(block_on(ping.facade().dispatch("ping", vec![])).unwrap(), json!("pong"));
}
