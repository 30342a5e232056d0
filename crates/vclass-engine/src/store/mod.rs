//! Store Engine Contract
//!
//! The store engine is an external collaborator. This module defines what the
//! projection core needs from it:
//!
//! - A [`StoreOptions`] structure carrying root maps, named submodules, and
//!   ordered plugins
//! - A constructed [`Store`] exposing the state tree, the getter namespace,
//!   `commit`, `dispatch`, and mutation subscriptions
//! - Handler signatures for getters, mutations, and actions
//!
//! `vclass-runtime` ships an in-memory engine implementing this contract.

mod options;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::module::{GetterArgs, MutationArgs};
use crate::value::{qualify, ActionFuture, GetterValue, StateMap, Value};

pub use options::{create_options, create_store_with, wiring_plugin, Modules, ROOT_MODULE};

// ============================================================================
// Scoped access traits
// ============================================================================

/// Lookup into a getter namespace (module-local or root)
pub trait GetterSource: Send + Sync {
    /// Evaluate the getter registered under `name`
    fn getter(&self, name: &str) -> Result<GetterValue>;
}

/// Shared getter namespace handle
pub type GetterSourceRef = Arc<dyn GetterSource>;

/// Read/write access to one module's state object
pub trait StateAccess: Send + Sync {
    /// Read a state field
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a state field
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Copy of the whole state object
    fn snapshot(&self) -> Value;
}

/// Shared state handle
pub type StateRef = Arc<dyn StateAccess>;

// ============================================================================
// Store
// ============================================================================

/// Committed mutation, as seen by subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    /// Qualified mutation name
    pub kind: String,
    /// Payload passed to `commit`
    pub payload: Value,
}

/// Callback invoked after every commit with the record and new root state
pub type MutationSubscriber = Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>;

/// Handle returned by [`Store::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A constructed store
pub trait Store: Send + Sync {
    /// Copy of the root state tree
    fn state(&self) -> Value;

    /// Read `state[key]` or, for a namespaced module, `state[module][key]`
    fn read_state(&self, module: Option<&str>, key: &str) -> Option<Value>;

    /// Evaluate a getter by qualified name
    fn getter(&self, qualified: &str) -> Result<GetterValue>;

    /// Run the mutation registered under a qualified name
    fn commit(&self, qualified: &str, payload: Value) -> Result<()>;

    /// Run the action registered under a qualified name
    fn dispatch(&self, qualified: &str, payload: Value) -> ActionFuture;

    /// Register a mutation subscriber
    fn subscribe(&self, subscriber: MutationSubscriber) -> SubscriptionId;

    /// Remove a subscriber; returns false if it was not registered
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Whether state writes outside mutations are rejected
    fn is_strict(&self) -> bool;
}

/// Shared store handle
pub type StoreHandle = Arc<dyn Store>;

/// Compare two store handles by identity
pub fn same_store(a: &StoreHandle, b: &StoreHandle) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Context handed to action handlers by the engine.
///
/// Unqualified names resolve inside the action's namespace; the `*_root`
/// variants address the root namespace.
#[derive(Clone)]
pub struct ActionContext {
    /// Namespace of the module the action belongs to
    pub namespace: Option<String>,
    /// Module state at dispatch time
    pub state: Value,
    /// Root state at dispatch time
    pub root_state: Value,
    /// The store running the action
    pub store: StoreHandle,
}

impl ActionContext {
    /// Commit a mutation of this module
    pub fn commit(&self, name: &str, payload: Value) -> Result<()> {
        self.store.commit(&qualify(self.namespace.as_deref(), name), payload)
    }

    /// Dispatch an action of this module
    pub fn dispatch(&self, name: &str, payload: Value) -> ActionFuture {
        self.store.dispatch(&qualify(self.namespace.as_deref(), name), payload)
    }

    /// Read a getter of this module
    pub fn getter(&self, name: &str) -> Result<GetterValue> {
        self.store.getter(&qualify(self.namespace.as_deref(), name))
    }

    /// Commit a mutation by root-level name
    pub fn commit_root(&self, qualified: &str, payload: Value) -> Result<()> {
        self.store.commit(qualified, payload)
    }

    /// Dispatch an action by root-level name
    pub fn dispatch_root(&self, qualified: &str, payload: Value) -> ActionFuture {
        self.store.dispatch(qualified, payload)
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("namespace", &self.namespace)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Handlers and options
// ============================================================================

/// Store-facing getter handler
pub type GetterHandler = Arc<dyn Fn(GetterArgs) -> Result<GetterValue> + Send + Sync>;

/// Store-facing mutation handler, called with the commit payload
pub type MutationHandler = Arc<dyn Fn(MutationArgs, Value) -> Result<()> + Send + Sync>;

/// Store-facing action handler, called with the dispatch payload
pub type ActionHandler = Arc<dyn Fn(ActionContext, Value) -> ActionFuture + Send + Sync>;

/// Function run once with the constructed store
pub type Plugin = Arc<dyn Fn(&StoreHandle) -> Result<()> + Send + Sync>;

/// Configuration of one module: `{namespaced, state, getters, mutations, actions}`
#[derive(Clone, Default)]
pub struct ModuleConfig {
    /// Whether names are prefixed with the module key
    pub namespaced: bool,
    /// Initial state
    pub state: StateMap,
    /// Getter handlers by bare name
    pub getters: FxHashMap<String, GetterHandler>,
    /// Mutation handlers by bare name
    pub mutations: FxHashMap<String, MutationHandler>,
    /// Action handlers by bare name
    pub actions: FxHashMap<String, ActionHandler>,
}

impl fmt::Debug for ModuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("namespaced", &self.namespaced)
            .field("state", &self.state)
            .field("getters", &sorted_keys(&self.getters))
            .field("mutations", &sorted_keys(&self.mutations))
            .field("actions", &sorted_keys(&self.actions))
            .finish()
    }
}

/// Options a store engine is built from
#[derive(Clone, Default)]
pub struct StoreOptions {
    /// Reject state writes outside mutations
    pub strict: bool,
    /// Root state
    pub state: StateMap,
    /// Root getters
    pub getters: FxHashMap<String, GetterHandler>,
    /// Root mutations
    pub mutations: FxHashMap<String, MutationHandler>,
    /// Root actions
    pub actions: FxHashMap<String, ActionHandler>,
    /// Named submodules, in registration order
    pub modules: Vec<(String, ModuleConfig)>,
    /// Plugins, run in order after construction
    pub plugins: Vec<Plugin>,
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("strict", &self.strict)
            .field("state", &self.state)
            .field("getters", &sorted_keys(&self.getters))
            .field("mutations", &sorted_keys(&self.mutations))
            .field("actions", &sorted_keys(&self.actions))
            .field("modules", &self.modules)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

fn sorted_keys<V>(map: &FxHashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

/// A store implementation that can be built from [`StoreOptions`].
///
/// `build` must run `options.plugins` in order, once, with the new store.
pub trait StoreEngine {
    /// Construct a store
    fn build(&self, options: StoreOptions) -> Result<StoreHandle>;
}
