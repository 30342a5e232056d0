//! In-Memory Store
//!
//! [`MemoryStore`] is the reference store engine. It keeps one root state
//! tree, with each submodule's state under its key, and a flat table of
//! handlers keyed by qualified name.
//!
//! No lock is held while a handler runs: state is read into owned values
//! before a getter or action starts, and mutation handlers write through a
//! [`StateRef`] that takes the lock per field. Handlers may therefore commit,
//! dispatch, and read getters re-entrantly.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::future;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, error, info};

use vclass_engine::store::{
    ActionHandler, GetterHandler, GetterSource, GetterSourceRef, MutationHandler, MutationSubscriber, StateAccess,
    StateRef, SubscriptionId,
};
use vclass_engine::value::{qualify, ActionFuture, GetterValue, StateMap, Value};
use vclass_engine::{
    ActionContext, Error, GetterArgs, MutationArgs, MutationRecord, Result, Store, StoreEngine, StoreHandle,
    StoreOptions,
};

/// Dispatched action, as seen by action subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    /// Qualified action name
    pub kind: String,
    /// Payload passed to `dispatch`
    pub payload: Value,
}

/// Callback invoked before every dispatch with the record and current root state
pub type ActionSubscriber = Arc<dyn Fn(&ActionRecord, &Value) + Send + Sync>;

/// Handler registered under a qualified name
struct Registered<H> {
    /// Key of the module whose state the handler sees; `None` for root
    module: Option<String>,
    /// Prefix used to resolve unqualified names from inside the handler
    namespace: Option<String>,
    handler: H,
}

/// Handler tables keyed by qualified name
#[derive(Default)]
struct Registry {
    getters: FxHashMap<String, Registered<GetterHandler>>,
    mutations: FxHashMap<String, Registered<MutationHandler>>,
    actions: FxHashMap<String, Registered<ActionHandler>>,
}

impl Registry {
    fn register<H>(
        table: &mut FxHashMap<String, Registered<H>>,
        kind: &'static str,
        module: Option<&str>,
        namespace: Option<&str>,
        handlers: FxHashMap<String, H>,
    ) -> Result<()> {
        for (name, handler) in handlers {
            let qualified = qualify(namespace, &name);
            if table.contains_key(&qualified) {
                return Err(Error::DuplicateHandler { kind, name: qualified });
            }
            table.insert(
                qualified,
                Registered {
                    module: module.map(str::to_string),
                    namespace: namespace.map(str::to_string),
                    handler,
                },
            );
        }
        Ok(())
    }
}

/// Reference in-memory store
pub struct MemoryStore {
    this: Weak<MemoryStore>,
    strict: bool,
    state: RwLock<Value>,
    registry: Registry,
    /// Depth of currently running mutations
    committing: AtomicUsize,
    subscribers: RwLock<Vec<(SubscriptionId, MutationSubscriber)>>,
    action_subscribers: RwLock<Vec<(SubscriptionId, ActionSubscriber)>>,
    next_subscription: AtomicU64,
}

/// Decrements the commit depth when a mutation finishes, even on error
struct CommitGuard<'a>(&'a AtomicUsize);

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryStore {
    /// Build a store from `options` and run its plugins in order
    pub fn build(options: StoreOptions) -> Result<Arc<Self>> {
        let StoreOptions {
            strict,
            state,
            getters,
            mutations,
            actions,
            modules,
            plugins,
        } = options;

        let mut root = state;
        let mut registry = Registry::default();
        Registry::register(&mut registry.getters, "getter", None, None, getters)?;
        Registry::register(&mut registry.mutations, "mutation", None, None, mutations)?;
        Registry::register(&mut registry.actions, "action", None, None, actions)?;

        for (key, config) in modules {
            if root.contains_key(&key) {
                return Err(Error::ModuleLayout(format!(
                    "module `{}` collides with a root state field of the same name",
                    key
                )));
            }
            let namespace = config.namespaced.then_some(key.as_str());
            Registry::register(&mut registry.getters, "getter", Some(key.as_str()), namespace, config.getters)?;
            Registry::register(&mut registry.mutations, "mutation", Some(key.as_str()), namespace, config.mutations)?;
            Registry::register(&mut registry.actions, "action", Some(key.as_str()), namespace, config.actions)?;
            root.insert(key, Value::Object(config.state));
        }

        let store = Arc::new_cyclic(|this| MemoryStore {
            this: this.clone(),
            strict,
            state: RwLock::new(Value::Object(root)),
            registry,
            committing: AtomicUsize::new(0),
            subscribers: RwLock::new(Vec::new()),
            action_subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        });
        info!(
            strict,
            getters = store.registry.getters.len(),
            mutations = store.registry.mutations.len(),
            actions = store.registry.actions.len(),
            "store constructed"
        );

        let handle: StoreHandle = store.clone();
        for plugin in &plugins {
            plugin(&handle)?;
        }
        debug!(plugins = plugins.len(), "store plugins installed");
        Ok(store)
    }

    fn handle(&self) -> Result<StoreHandle> {
        let store: Arc<MemoryStore> = self.this.upgrade().ok_or_else(|| Error::msg("store has been dropped"))?;
        Ok(store)
    }

    /// State access for the root (`None`) or a submodule's slice
    pub fn module_state(&self, module: Option<&str>) -> StateRef {
        Arc::new(ModuleState {
            store: self.this.clone(),
            module: module.map(str::to_string),
        })
    }

    /// Replace the whole state tree. Allowed in strict mode.
    pub fn replace_state(&self, state: Value) {
        *self.state.write() = state;
        debug!("state replaced");
    }

    /// Register an action subscriber, called before each dispatch runs
    pub fn subscribe_action(&self, subscriber: ActionSubscriber) -> SubscriptionId {
        let id = self.next_id();
        self.action_subscribers.write().push((id, subscriber));
        id
    }

    /// Remove an action subscriber
    pub fn unsubscribe_action(&self, id: SubscriptionId) -> bool {
        let mut subs = self.action_subscribers.write();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    /// Qualified names of registered mutations, sorted
    pub fn mutation_names(&self) -> Vec<&str> {
        sorted(self.registry.mutations.keys())
    }

    /// Qualified names of registered actions, sorted
    pub fn action_names(&self) -> Vec<&str> {
        sorted(self.registry.actions.keys())
    }

    /// Qualified names of registered getters, sorted
    pub fn getter_names(&self) -> Vec<&str> {
        sorted(self.registry.getters.keys())
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }

    fn slice(&self, module: Option<&str>) -> Value {
        let state = self.state.read();
        match module {
            Some(key) => state.get(key).cloned().unwrap_or(Value::Null),
            None => state.clone(),
        }
    }

    fn write_field(&self, module: Option<&str>, key: &str, value: Value) -> Result<()> {
        if self.strict && self.committing.load(Ordering::SeqCst) == 0 {
            return Err(Error::OutsideMutation(qualify(module, key)));
        }
        let mut state = self.state.write();
        let target = match module {
            Some(m) => state.get_mut(m),
            None => Some(&mut *state),
        };
        match target {
            Some(Value::Object(map)) => {
                map.insert(key.to_string(), value);
                Ok(())
            }
            _ => Err(Error::msg(format!(
                "state of module `{}` is not an object",
                module.unwrap_or("root")
            ))),
        }
    }

    fn scoped_getters(&self, namespace: Option<&str>) -> GetterSourceRef {
        Arc::new(ScopedGetters {
            store: self.this.clone(),
            namespace: namespace.map(str::to_string),
        })
    }
}

fn sorted<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut names: Vec<&str> = keys.map(String::as_str).collect();
    names.sort_unstable();
    names
}

impl Store for MemoryStore {
    fn state(&self) -> Value {
        self.state.read().clone()
    }

    fn read_state(&self, module: Option<&str>, key: &str) -> Option<Value> {
        let state = self.state.read();
        match module {
            Some(m) => state.get(m)?.get(key).cloned(),
            None => state.get(key).cloned(),
        }
    }

    fn getter(&self, qualified: &str) -> Result<GetterValue> {
        let Some(entry) = self.registry.getters.get(qualified) else {
            error!(getter = %qualified, "unknown getter");
            return Err(Error::UnknownGetter(qualified.to_string()));
        };
        let args = GetterArgs {
            state: self.slice(entry.module.as_deref()),
            getters: self.scoped_getters(entry.namespace.as_deref()),
            root_state: self.state(),
            root_getters: self.scoped_getters(None),
            store: Some(self.handle()?),
        };
        (entry.handler)(args)
    }

    fn commit(&self, qualified: &str, payload: Value) -> Result<()> {
        let Some(entry) = self.registry.mutations.get(qualified) else {
            error!(mutation = %qualified, "unknown mutation");
            return Err(Error::UnknownMutation(qualified.to_string()));
        };
        let args = MutationArgs {
            state: self.module_state(entry.module.as_deref()),
            store: Some(self.handle()?),
        };
        {
            self.committing.fetch_add(1, Ordering::SeqCst);
            let _guard = CommitGuard(&self.committing);
            (entry.handler)(args, payload.clone())?;
        }

        let record = MutationRecord {
            kind: qualified.to_string(),
            payload,
        };
        let subscribers: Vec<MutationSubscriber> = self.subscribers.read().iter().map(|(_, s)| s.clone()).collect();
        if !subscribers.is_empty() {
            let state = self.state();
            for subscriber in subscribers {
                subscriber(&record, &state);
            }
        }
        Ok(())
    }

    fn dispatch(&self, qualified: &str, payload: Value) -> ActionFuture {
        let Some(entry) = self.registry.actions.get(qualified) else {
            error!(action = %qualified, "unknown action");
            return Box::pin(future::ready(Err(Error::UnknownAction(qualified.to_string()))));
        };
        let store = match self.handle() {
            Ok(store) => store,
            Err(e) => return Box::pin(future::ready(Err(e))),
        };

        let subscribers: Vec<ActionSubscriber> =
            self.action_subscribers.read().iter().map(|(_, s)| s.clone()).collect();
        if !subscribers.is_empty() {
            let record = ActionRecord {
                kind: qualified.to_string(),
                payload: payload.clone(),
            };
            let state = self.state();
            for subscriber in subscribers {
                subscriber(&record, &state);
            }
        }

        let ctx = ActionContext {
            namespace: entry.namespace.clone(),
            state: self.slice(entry.module.as_deref()),
            root_state: self.state(),
            store,
        };
        (entry.handler)(ctx, payload)
    }

    fn subscribe(&self, subscriber: MutationSubscriber) -> SubscriptionId {
        let id = self.next_id();
        self.subscribers.write().push((id, subscriber));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    fn is_strict(&self) -> bool {
        self.strict
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("strict", &self.strict)
            .field("state", &*self.state.read())
            .field("getters", &self.getter_names())
            .field("mutations", &self.mutation_names())
            .field("actions", &self.action_names())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Scoped views
// ============================================================================

/// Live view of one module's state slice
struct ModuleState {
    store: Weak<MemoryStore>,
    module: Option<String>,
}

impl StateAccess for ModuleState {
    fn get(&self, key: &str) -> Option<Value> {
        self.store.upgrade()?.read_state(self.module.as_deref(), key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let store = self.store.upgrade().ok_or_else(|| Error::msg("store has been dropped"))?;
        store.write_field(self.module.as_deref(), key, value)
    }

    fn snapshot(&self) -> Value {
        match self.store.upgrade() {
            Some(store) => store.slice(self.module.as_deref()),
            None => Value::Object(StateMap::new()),
        }
    }
}

/// Getter namespace resolving names relative to a module namespace
struct ScopedGetters {
    store: Weak<MemoryStore>,
    namespace: Option<String>,
}

impl GetterSource for ScopedGetters {
    fn getter(&self, name: &str) -> Result<GetterValue> {
        let store = self.store.upgrade().ok_or_else(|| Error::UnknownGetter(name.to_string()))?;
        store.getter(&qualify(self.namespace.as_deref(), name))
    }
}

// ============================================================================
// Engine
// ============================================================================

/// [`StoreEngine`] building [`MemoryStore`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryEngine;

impl StoreEngine for MemoryEngine {
    fn build(&self, options: StoreOptions) -> Result<StoreHandle> {
        let store: StoreHandle = MemoryStore::build(options)?;
        Ok(store)
    }
}
