//! Module Facade
//!
//! The facade replaces the class prototype. Every member keeps its declared
//! name and is routed by role and wiring state:
//!
//! | Role                | `get` / `set`                        | `call` / `dispatch`         |
//! |---------------------|--------------------------------------|-----------------------------|
//! | State               | store state or getter / local copy   | -                           |
//! | Accessor            | store getter, commit / declared body | -                           |
//! | Derived computation | -                                    | store getter fn / body      |
//! | State mutator       | -                                    | commit / body               |
//! | Async operation     | -                                    | dispatch / body (async)     |
//! | Passthrough         | local value or accessor              | body, no context            |
//!
//! Nothing here fails because the store is missing: detached facades fall
//! back to the local snapshot and the declared bodies.

use std::fmt;
use std::sync::{Arc, Weak};

use futures::future;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::json;

use super::context::{ActionArgs, Context, GetterArgs, MutationArgs};
use super::descriptor::ModuleDescriptor;
use crate::error::{Error, Result};
use crate::reflect::{AccessorDef, Classified, MemberRole, MethodDef};
use crate::store::{GetterSource, GetterSourceRef, StateAccess, StateRef};
use crate::value::{ActionFuture, Args, GetterFn, GetterValue, Value};

/// Facade-side routing of one member
#[derive(Clone)]
pub(crate) enum Slot {
    State { getter: bool },
    Accessor(AccessorDef),
    Computation(MethodDef),
    Mutator(MethodDef),
    Action(MethodDef),
    Constructor(MethodDef),
    PassValue,
    PassMethod(MethodDef),
    PassAccessor(AccessorDef),
}

pub(crate) struct FacadeInner {
    pub(crate) descriptor: ModuleDescriptor,
    pub(crate) slots: FxHashMap<String, Slot>,
    pub(crate) classified: Vec<Classified>,
    pub(crate) passthrough: RwLock<FxHashMap<String, Value>>,
    pub(crate) constructor: Option<String>,
}

/// Handle to a projected module's facade. Clones share the module.
#[derive(Clone)]
pub struct ModuleFacade(pub(crate) Arc<FacadeInner>);

impl ModuleFacade {
    pub(crate) fn upgrade(weak: &Weak<FacadeInner>, class: &str) -> Result<Self> {
        weak.upgrade()
            .map(ModuleFacade)
            .ok_or_else(|| Error::ModuleDropped(class.to_string()))
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Descriptor backing this facade
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.0.descriptor
    }

    /// Name of the projected class
    pub fn class_name(&self) -> &str {
        self.0.descriptor.class_name()
    }

    /// Whether a store is attached
    pub fn is_attached(&self) -> bool {
        self.0.descriptor.is_attached()
    }

    /// Member names in classification order
    pub fn members(&self) -> Vec<&str> {
        self.0.classified.iter().map(|c| c.name.as_str()).collect()
    }

    /// Role decided for a member
    pub fn role_of(&self, name: &str) -> Option<MemberRole> {
        self.0.classified.iter().find(|c| c.name == name).map(|c| c.role)
    }

    /// Classification of every member
    pub fn classification(&self) -> &[Classified] {
        &self.0.classified
    }

    /// Name of the post-construction initializer, if one was designated
    pub fn constructor_alias(&self) -> Option<&str> {
        self.0.constructor.as_deref()
    }

    fn slot(&self, name: &str) -> Result<&Slot> {
        self.0.slots.get(name).ok_or_else(|| Error::UnknownMember {
            class: self.class_name().to_string(),
            member: name.to_string(),
        })
    }

    // ========================================================================
    // Property access
    // ========================================================================

    /// Read a property
    pub fn get(&self, name: &str) -> Result<Value> {
        let desc = self.descriptor();
        match self.slot(name)? {
            Slot::State { getter } => match desc.store() {
                Some(store) if *getter => store.getter(&desc.qualified(name))?.into_value(name),
                Some(store) => Ok(store.read_state(desc.namespace(), name).unwrap_or(Value::Null)),
                None => Ok(desc.local_state().get(name).unwrap_or(Value::Null)),
            },
            Slot::Accessor(acc) => {
                let get = acc.get.as_ref().ok_or_else(|| Error::WriteOnly(name.to_string()))?;
                match desc.store() {
                    Some(store) => store.getter(&desc.qualified(name))?.into_value(name),
                    None => get(self, &self.local_getter_args()),
                }
            }
            Slot::PassValue => Ok(self.0.passthrough.read().get(name).cloned().unwrap_or(Value::Null)),
            Slot::PassAccessor(acc) => {
                let get = acc.get.as_ref().ok_or_else(|| Error::WriteOnly(name.to_string()))?;
                get(self, &self.local_getter_args())
            }
            _ => Err(Error::WrongKind {
                member: name.to_string(),
                expected: "a property",
            }),
        }
    }

    /// Write a property
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        let desc = self.descriptor();
        match self.slot(name)? {
            Slot::State { .. } => match desc.store() {
                Some(store) => store.commit(&desc.qualified(name), value),
                None => desc.local_state().set(name, value),
            },
            Slot::Accessor(acc) => {
                let set = acc.set.as_ref().ok_or_else(|| Error::ReadOnly(name.to_string()))?;
                match desc.store() {
                    Some(store) => store.commit(&desc.qualified(name), value),
                    None => set(self, value, &self.local_mutation_args()),
                }
            }
            Slot::PassValue => {
                self.0.passthrough.write().insert(name.to_string(), value);
                Ok(())
            }
            Slot::PassAccessor(acc) => {
                let set = acc.set.as_ref().ok_or_else(|| Error::ReadOnly(name.to_string()))?;
                set(self, value, &self.local_mutation_args())
            }
            _ => Err(Error::WrongKind {
                member: name.to_string(),
                expected: "assignable",
            }),
        }
    }

    // ========================================================================
    // Method invocation
    // ========================================================================

    /// Call a synchronous method: derived computation, mutation,
    /// passthrough method, or the constructor alias
    pub fn call(&self, name: &str, args: Args) -> Result<Value> {
        let desc = self.descriptor();
        match self.slot(name)? {
            Slot::Computation(def) => match desc.store() {
                Some(store) => store.getter(&desc.qualified(name))?.call(name, args),
                None => {
                    let args = desc.apply_args(name, &def.params, args);
                    def.body
                        .invoke_sync(name, self, args, Context::Getter(self.local_getter_args()))
                }
            },
            Slot::Mutator(def) => {
                match desc.store() {
                    Some(store) => store.commit(&desc.qualified(name), Value::Array(args))?,
                    None => {
                        let args = desc.apply_args(name, &def.params, args);
                        def.body.invoke_sync(
                            name,
                            self,
                            args,
                            Context::Mutation(self.local_mutation_args()),
                        )?;
                    }
                }
                Ok(Value::Null)
            }
            Slot::PassMethod(def) | Slot::Constructor(def) => {
                let args = desc.apply_args(name, &def.params, args);
                def.body.invoke_sync(name, self, args, Context::None)
            }
            Slot::Action(_) => Err(Error::WrongKind {
                member: name.to_string(),
                expected: "synchronous; dispatch it instead",
            }),
            _ => Err(Error::WrongKind {
                member: name.to_string(),
                expected: "callable",
            }),
        }
    }

    /// Dispatch an action (or run a passthrough method asynchronously).
    ///
    /// After wiring this returns exactly what the store's dispatch returns.
    pub fn dispatch(&self, name: &str, args: Args) -> ActionFuture {
        let slot = match self.slot(name) {
            Ok(slot) => slot,
            Err(e) => return Box::pin(future::ready(Err(e))),
        };
        let desc = self.descriptor();
        match slot {
            Slot::Action(def) => match desc.store() {
                Some(store) => store.dispatch(&desc.qualified(name), Value::Array(args)),
                None => {
                    let args = desc.apply_args(name, &def.params, args);
                    def.body
                        .invoke_async(self, args, Context::Action(ActionArgs::default()))
                }
            },
            Slot::PassMethod(def) => {
                let args = desc.apply_args(name, &def.params, args);
                def.body.invoke_async(self, args, Context::None)
            }
            _ => Box::pin(future::ready(Err(Error::WrongKind {
                member: name.to_string(),
                expected: "an action",
            }))),
        }
    }

    // ========================================================================
    // Local (detached) contexts
    // ========================================================================

    /// Getter context backed by the local snapshot
    pub fn local_getter_args(&self) -> GetterArgs {
        let desc = self.descriptor();
        let state = desc.local_state().snapshot();
        let root_state = match desc.namespace() {
            Some(ns) => json!({ ns: state.clone() }),
            None => state.clone(),
        };
        let weak = Arc::downgrade(&self.0);
        let getters: GetterSourceRef = Arc::new(LocalGetters {
            facade: weak.clone(),
            prefix: None,
        });
        let root_getters: GetterSourceRef = Arc::new(LocalGetters {
            facade: weak,
            prefix: desc.namespace().map(|ns| format!("{}/", ns)),
        });
        GetterArgs {
            state,
            getters,
            root_state,
            root_getters,
            store: None,
        }
    }

    /// Mutation context backed by the local snapshot
    pub fn local_mutation_args(&self) -> MutationArgs {
        let state: StateRef = self.descriptor().local_state().clone();
        MutationArgs { state, store: None }
    }

    /// Evaluate a getter against the local snapshot
    pub fn local_getter(&self, name: &str) -> Result<GetterValue> {
        let unknown = || Error::UnknownGetter(name.to_string());
        match self.0.slots.get(name).ok_or_else(unknown)? {
            Slot::State { getter: true } => Ok(GetterValue::Value(
                self.descriptor().local_state().get(name).unwrap_or(Value::Null),
            )),
            Slot::Accessor(AccessorDef { get: Some(get), .. }) => {
                Ok(GetterValue::Value(get(self, &self.local_getter_args())?))
            }
            Slot::Computation(def) => {
                let this = self.clone();
                let def = def.clone();
                let member = name.to_string();
                let f: GetterFn = Arc::new(move |args: Args| {
                    let args = this.descriptor().apply_args(&member, &def.params, args);
                    def.body
                        .invoke_sync(&member, &this, args, Context::Getter(this.local_getter_args()))
                });
                Ok(GetterValue::Function(f))
            }
            _ => Err(unknown()),
        }
    }
}

impl fmt::Debug for ModuleFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleFacade")
            .field("class", &self.class_name())
            .field("members", &self.members())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Getter namespace view over a detached facade
struct LocalGetters {
    facade: Weak<FacadeInner>,
    /// Qualified-name prefix accepted for root lookups
    prefix: Option<String>,
}

impl GetterSource for LocalGetters {
    fn getter(&self, name: &str) -> Result<GetterValue> {
        let facade = self
            .facade
            .upgrade()
            .map(ModuleFacade)
            .ok_or_else(|| Error::UnknownGetter(name.to_string()))?;
        let bare = match &self.prefix {
            Some(prefix) => name
                .strip_prefix(prefix.as_str())
                .ok_or_else(|| Error::UnknownGetter(name.to_string()))?,
            None => name,
        };
        facade.local_getter(bare)
    }
}
