//! Module Descriptor
//!
//! Per-class record built once at projection time. It holds the namespace,
//! the local state snapshot, the store-facing handler maps, and the wiring
//! state machine:
//!
//! ```text
//! Detached ──attach(store)──▶ Attached(store)
//!                               │
//!                               └─ attach(same store) is a no-op
//! ```
//!
//! Before wiring, facades read and write the local snapshot. After wiring,
//! the store's state tree is the source of truth and the snapshot is stale.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::reflect::Param;
use crate::store::{same_store, ActionHandler, GetterHandler, ModuleConfig, MutationHandler, StateAccess, StoreHandle};
use crate::value::{qualify, Args, StateMap, Value};

/// Wiring state of a descriptor
#[derive(Clone, Default)]
pub enum Wiring {
    /// No store yet; accessors use the local snapshot
    #[default]
    Detached,
    /// Accessors route through this store
    Attached(StoreHandle),
}

impl fmt::Debug for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wiring::Detached => f.write_str("Detached"),
            Wiring::Attached(_) => f.write_str("Attached"),
        }
    }
}

/// Local state snapshot used before wiring
#[derive(Debug, Default)]
pub struct LocalState {
    fields: RwLock<StateMap>,
}

impl LocalState {
    /// Create from initial fields
    pub fn new(fields: StateMap) -> Self {
        Self {
            fields: RwLock::new(fields),
        }
    }

    /// Copy of the fields
    pub fn fields(&self) -> StateMap {
        self.fields.read().clone()
    }
}

impl StateAccess for LocalState {
    fn get(&self, key: &str) -> Option<Value> {
        self.fields.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.fields.write().insert(key.to_string(), value);
        Ok(())
    }

    fn snapshot(&self) -> Value {
        Value::Object(self.fields())
    }
}

/// Per-class module record
pub struct ModuleDescriptor {
    class_name: String,
    namespaced: bool,
    module_name: String,
    state: Arc<LocalState>,
    pub(crate) getters: FxHashMap<String, GetterHandler>,
    pub(crate) mutations: FxHashMap<String, MutationHandler>,
    pub(crate) actions: FxHashMap<String, ActionHandler>,
    wiring: RwLock<Wiring>,
    arg_count_cache: Mutex<FxHashMap<String, usize>>,
}

impl ModuleDescriptor {
    pub(crate) fn new(class_name: &str, module_name: Option<&str>, state: StateMap) -> Self {
        let module_name = module_name.unwrap_or_default().to_string();
        Self {
            class_name: class_name.to_string(),
            namespaced: !module_name.is_empty(),
            module_name,
            state: Arc::new(LocalState::new(state)),
            getters: FxHashMap::default(),
            mutations: FxHashMap::default(),
            actions: FxHashMap::default(),
            wiring: RwLock::new(Wiring::Detached),
            arg_count_cache: Mutex::new(FxHashMap::default()),
        }
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Name of the class this module was projected from
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether store-facing names are prefixed
    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    /// Module name, empty for root modules
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Namespace used for qualified names
    pub fn namespace(&self) -> Option<&str> {
        self.namespaced.then_some(self.module_name.as_str())
    }

    /// Store-facing name of a member (`"mod/name"` when namespaced)
    pub fn qualified(&self, name: &str) -> String {
        qualify(self.namespace(), name)
    }

    // ========================================================================
    // State and handlers
    // ========================================================================

    /// Local state snapshot
    pub fn local_state(&self) -> &Arc<LocalState> {
        &self.state
    }

    /// Store-facing getter handlers, by bare name
    pub fn getters(&self) -> &FxHashMap<String, GetterHandler> {
        &self.getters
    }

    /// Store-facing mutation handlers, by bare name
    pub fn mutations(&self) -> &FxHashMap<String, MutationHandler> {
        &self.mutations
    }

    /// Store-facing action handlers, by bare name
    pub fn actions(&self) -> &FxHashMap<String, ActionHandler> {
        &self.actions
    }

    /// Module configuration for store assembly.
    ///
    /// The state is taken from the current local snapshot, so writes made
    /// before wiring become the store's initial state.
    pub fn config(&self) -> ModuleConfig {
        ModuleConfig {
            namespaced: self.namespaced,
            state: self.state.fields(),
            getters: self.getters.clone(),
            mutations: self.mutations.clone(),
            actions: self.actions.clone(),
        }
    }

    // ========================================================================
    // Wiring
    // ========================================================================

    /// Attached store, if any
    pub fn store(&self) -> Option<StoreHandle> {
        match &*self.wiring.read() {
            Wiring::Attached(store) => Some(store.clone()),
            Wiring::Detached => None,
        }
    }

    /// Whether a store is attached
    pub fn is_attached(&self) -> bool {
        matches!(&*self.wiring.read(), Wiring::Attached(_))
    }

    /// Check that `store` could be attached without changing anything
    pub fn check_attach(&self, store: &StoreHandle) -> Result<()> {
        match &*self.wiring.read() {
            Wiring::Attached(current) if !same_store(current, store) => {
                Err(Error::AlreadyWired(self.class_name.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Attach a store. Attaching the same store again is a no-op; attaching
    /// a different one fails.
    pub fn attach(&self, store: StoreHandle) -> Result<()> {
        let mut wiring = self.wiring.write();
        match &*wiring {
            Wiring::Attached(current) if same_store(current, &store) => {
                debug!(class = %self.class_name, "store already attached");
                Ok(())
            }
            Wiring::Attached(_) => Err(Error::AlreadyWired(self.class_name.clone())),
            Wiring::Detached => {
                *wiring = Wiring::Attached(store);
                info!(
                    class = %self.class_name,
                    namespace = %self.module_name,
                    "module wired to store"
                );
                Ok(())
            }
        }
    }

    // ========================================================================
    // Argument padding
    // ========================================================================

    /// Number of declared arguments of a method, computed once per member
    pub fn arg_count(&self, member: &str, params: &[Param]) -> usize {
        *self
            .arg_count_cache
            .lock()
            .entry(member.to_string())
            .or_insert(params.len())
    }

    /// Cached argument count, if the member has been invoked
    pub fn cached_arg_count(&self, member: &str) -> Option<usize> {
        self.arg_count_cache.lock().get(member).copied()
    }

    /// Pad `args` to the method's declared arity.
    ///
    /// Omitted trailing parameters take their declared default, or null.
    /// Arguments beyond the declared list pass through unchanged.
    pub fn apply_args(&self, member: &str, params: &[Param], mut args: Args) -> Args {
        let count = self.arg_count(member, params);
        while args.len() < count {
            let default = params
                .get(args.len())
                .and_then(|p| p.default.clone())
                .unwrap_or(Value::Null);
            args.push(default);
        }
        args
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("class_name", &self.class_name)
            .field("namespaced", &self.namespaced)
            .field("module_name", &self.module_name)
            .field("state", &self.state.fields())
            .field("wiring", &*self.wiring.read())
            .finish_non_exhaustive()
    }
}
