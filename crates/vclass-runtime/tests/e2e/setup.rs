//! Registration-time failures.

use super::harness::*;
use serde_json::json;
use vclass_engine::{project, ClassDef, ConflictPolicy, Error, MemberRole, ModuleOptions, Role, NO_PARAMS};

#[test]
fn test_failing_initializer_aborts_registration() {
    let class = ClassDef::builder("Broken")
        .init(|| Err(Error::msg("database url missing")))
        .build();
    let err = project(&class, &ModuleOptions::default()).unwrap_err();
    match &err {
        Error::Setup { class, .. } => assert_eq!(class, "Broken"),
        other => panic!("expected setup error, got {:?}", other),
    }
    assert!(err.to_string().contains("Broken"));
    assert!(err.to_string().contains("database url missing"));
}

#[test]
fn test_initializer_fields_are_state() {
    let class = ClassDef::builder("Seeded")
        .init(|| Ok(json!({ "seed": 7 })))
        .build();
    let seeded = module(&class, ModuleOptions::default());
    assert_eq!(seeded.facade().get("seed").unwrap(), json!(7));
    assert!(seeded.config().mutations.contains_key("seed"));
}

#[test]
fn test_conflicting_marks() {
    let class = ClassDef::builder("Ambiguous")
        .mutation("touch", NO_PARAMS, |_, _, _| Ok(json!(1)))
        .mark("touch", Role::Action)
        .build();

    let resolved = module(&class, ModuleOptions::default());
    assert_eq!(resolved.facade().role_of("touch"), Some(MemberRole::StateMutator));

    let strict = ModuleOptions::default().with_conflicts(ConflictPolicy::Reject);
    assert!(matches!(project(&class, &strict), Err(Error::RoleConflict { .. })));
}

#[test]
fn test_mark_on_missing_member() {
    let class = ClassDef::builder("Typo").field("count", json!(0)).exclude("cuont").build();
    assert!(matches!(
        project(&class, &ModuleOptions::default()),
        Err(Error::UnknownMember { .. })
    ));
}

#[test]
fn test_initializer_alias_runs_with_arguments() {
    let class = ClassDef::builder("Profile")
        .field("name", json!(""))
        .field("age", json!(0))
        .initializer("setup", |this, args| {
            this.set("name", args.first().cloned().unwrap_or_default())?;
            this.set("age", args.get(1).cloned().unwrap_or_default())
        })
        .build();
    let profile = module(&class, ModuleOptions::default());
    assert_eq!(profile.facade().constructor_alias(), Some("setup"));

    let instance = profile.instantiate(vec![json!("ada"), json!(36)]).unwrap();
    assert_eq!(instance.get("name").unwrap(), json!("ada"));

    let store = root_store(&profile);
    assert_eq!(store.mutation_names(), vec!["age", "name"]);
    assert_eq!(vclass_engine::Store::read_state(&*store, None, "age"), Some(json!(36)));
}

#[test]
fn test_options_from_json() {
    let options: ModuleOptions = serde_json::from_str(r#"{ "name": "todo", "conflicts": "reject" }"#).unwrap();
    let todo = module(&todo_class(), options);
    assert!(todo.descriptor().is_namespaced());
    assert_eq!(todo.descriptor().module_name(), "todo");
}
