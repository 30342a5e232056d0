//! Test harness for end-to-end module tests
//!
//! Provides sample module classes, store construction helpers, and probes
//! that count commits and dispatches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use parking_lot::Mutex;
use serde_json::json;
use vclass_engine::{
    project, ClassDef, Error, ModuleClass, ModuleOptions, Modules, MutationRecord, Param, Role, Value, NO_PARAMS,
};
use vclass_engine::Store;
use vclass_runtime::{create_store, ActionRecord, MemoryStore};

pub use futures::executor::block_on;

static TRACING: Once = Once::new();

/// Install a test subscriber once; `RUST_LOG` controls the filter
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Read an integer, treating anything else as zero
pub fn int(v: &Value) -> i64 {
    v.as_i64().unwrap_or(0)
}

// ============================================================================
// Sample classes
// ============================================================================

/// `Counter { count = 0 }` with a mutation `increment(step)`
pub fn counter_class() -> ClassDef {
    ClassDef::builder("Counter")
        .field("count", json!(0))
        .mutation("increment", ["step"], |this, args, _ctx| {
            let count = int(&this.get("count")?);
            this.set("count", json!(count + int(&args[0])))?;
            Ok(Value::Null)
        })
        .build()
}

/// Todo list exercising every role
pub fn todo_class() -> ClassDef {
    ClassDef::builder("Todo")
        .field("items", json!([]))
        .field("filter", json!("all"))
        .field("cache", json!({}))
        .exclude("cache")
        .mark("filter", Role::Getter)
        .computed("count", |_, args| {
            Ok(json!(args.state["items"].as_array().map_or(0, Vec::len)))
        })
        .getter_fn("nth", ["index"], |_, args, ctx| {
            let ctx = ctx.getter().ok_or_else(|| Error::msg("missing getter context"))?;
            let index = args[0].as_u64().unwrap_or(0) as usize;
            Ok(ctx.state["items"].get(index).cloned().unwrap_or(Value::Null))
        })
        .mutation("add", ["item"], |_, args, ctx| {
            let state = &ctx.mutation().ok_or_else(|| Error::msg("missing mutation context"))?.state;
            let mut items = state.get("items").unwrap_or_else(|| json!([]));
            if let Value::Array(list) = &mut items {
                list.push(args[0].clone());
            }
            state.set("items", items)?;
            Ok(Value::Null)
        })
        .action("load", [Param::optional("n", json!(2))], |this, args, ctx| {
            let this = this.clone();
            let wired = ctx.store().is_some();
            async move {
                for i in 0..args[0].as_u64().unwrap_or(0) {
                    this.call("add", vec![json!(format!("item{}", i))])?;
                }
                Ok::<_, Error>(json!({ "wired": wired, "count": this.get("count")? }))
            }
        })
        .method("describe", NO_PARAMS, |this, _, _| {
            Ok(json!(format!("{} items", int(&this.get("count")?))))
        })
        .build()
}

/// Project with options, panicking on failure
pub fn module(class: &ClassDef, options: ModuleOptions) -> ModuleClass {
    project(class, &options).unwrap_or_else(|e| panic!("projection of {} failed: {}", class.name(), e))
}

/// Build a non-strict store over a single root module
pub fn root_store(module: &ModuleClass) -> Arc<MemoryStore> {
    create_store(false, &Modules::new().root(module.clone()), vec![]).expect("store construction failed")
}

// ============================================================================
// Probes
// ============================================================================

/// Records committed mutations and dispatched actions
#[derive(Clone, Default)]
pub struct Probe {
    pub commits: Arc<Mutex<Vec<(String, Value)>>>,
    pub dispatches: Arc<Mutex<Vec<ActionRecord>>>,
    pub dispatch_count: Arc<AtomicUsize>,
}

impl Probe {
    /// Subscribe to `store`
    pub fn attach(store: &MemoryStore) -> Self {
        let probe = Probe::default();
        let commits = probe.commits.clone();
        store.subscribe(Arc::new(move |record: &MutationRecord, _: &Value| {
            commits.lock().push((record.kind.clone(), record.payload.clone()));
        }));
        let dispatches = probe.dispatches.clone();
        let count = probe.dispatch_count.clone();
        store.subscribe_action(Arc::new(move |record: &ActionRecord, _: &Value| {
            count.fetch_add(1, Ordering::SeqCst);
            dispatches.lock().push(record.clone());
        }));
        probe
    }

    /// Qualified names of committed mutations, in order
    pub fn commit_kinds(&self) -> Vec<String> {
        self.commits.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Number of dispatches seen
    pub fn dispatched(&self) -> usize {
        self.dispatch_count.load(Ordering::SeqCst)
    }
}
