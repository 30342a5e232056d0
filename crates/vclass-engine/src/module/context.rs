//! Method Contexts
//!
//! Every module method receives its positional arguments plus one trailing
//! [`Context`]. The variant depends on the role the method was classified as:
//!
//! | Role                | Context                  |
//! |---------------------|--------------------------|
//! | Derived computation | `Context::Getter`        |
//! | State mutator       | `Context::Mutation`      |
//! | Async operation     | `Context::Action`        |
//! | Passthrough / init  | `Context::None`          |
//!
//! Before wiring, the contexts are backed by the module's local snapshot and
//! `store` is `None`.

use std::fmt;

use crate::store::{ActionContext, GetterSourceRef, StateRef, StoreHandle};
use crate::value::Value;

/// Context of a getter evaluation
#[derive(Clone)]
pub struct GetterArgs {
    /// Module state
    pub state: Value,
    /// Module getters, by bare name
    pub getters: GetterSourceRef,
    /// Root state
    pub root_state: Value,
    /// Root getters, by qualified name
    pub root_getters: GetterSourceRef,
    /// The store, once wired
    pub store: Option<StoreHandle>,
}

impl fmt::Debug for GetterArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetterArgs")
            .field("state", &self.state)
            .field("root_state", &self.root_state)
            .field("wired", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

/// Context of a mutation
#[derive(Clone)]
pub struct MutationArgs {
    /// Writable module state
    pub state: StateRef,
    /// The store, once wired
    pub store: Option<StoreHandle>,
}

impl fmt::Debug for MutationArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationArgs")
            .field("state", &self.state.snapshot())
            .field("wired", &self.store.is_some())
            .finish()
    }
}

/// Context of an action
#[derive(Clone, Default)]
pub struct ActionArgs {
    /// Engine context, present when the action was dispatched by a store
    pub context: Option<ActionContext>,
    /// The store, once wired
    pub store: Option<StoreHandle>,
}

impl fmt::Debug for ActionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionArgs")
            .field("context", &self.context)
            .field("wired", &self.store.is_some())
            .finish()
    }
}

/// Trailing context passed to every module method
#[derive(Debug, Clone, Default)]
pub enum Context {
    /// No store context (passthrough methods, initializers)
    #[default]
    None,
    /// Getter context
    Getter(GetterArgs),
    /// Mutation context
    Mutation(MutationArgs),
    /// Action context
    Action(ActionArgs),
}

impl Context {
    /// Getter context, if this is one
    pub fn getter(&self) -> Option<&GetterArgs> {
        match self {
            Context::Getter(args) => Some(args),
            _ => None,
        }
    }

    /// Mutation context, if this is one
    pub fn mutation(&self) -> Option<&MutationArgs> {
        match self {
            Context::Mutation(args) => Some(args),
            _ => None,
        }
    }

    /// Action context, if this is one
    pub fn action(&self) -> Option<&ActionArgs> {
        match self {
            Context::Action(args) => Some(args),
            _ => None,
        }
    }

    /// The store attached to the module, if any
    pub fn store(&self) -> Option<&StoreHandle> {
        match self {
            Context::None => None,
            Context::Getter(args) => args.store.as_ref(),
            Context::Mutation(args) => args.store.as_ref(),
            Context::Action(args) => args.store.as_ref(),
        }
    }
}
