//! VClass Engine
//!
//! Projects class-shaped state modules onto a centralized store:
//! - **Reflect**: declarative class definitions, role marks, and the member
//!   classifier (`reflect` module)
//! - **Module**: descriptors, facades, and the projector producing them
//!   (`module` module)
//! - **Store**: the store-engine contract and store option assembly
//!   (`store` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use vclass_engine::{create_store_with, project, ClassDef, ModuleOptions, Modules};
//! use serde_json::json;
//!
//! let counter = ClassDef::builder("Counter")
//!     .field("count", json!(0))
//!     .mutation("increment", ["step"], |this, args, _ctx| {
//!         let count = this.get("count")?.as_i64().unwrap_or(0);
//!         this.set("count", json!(count + args[0].as_i64().unwrap_or(1)))?;
//!         Ok(json!(null))
//!     })
//!     .build();
//!
//! let module = project(&counter, &ModuleOptions::default())?;
//! module.facade().call("increment", vec![json!(5)])?;
//!
//! // Any StoreEngine; vclass-runtime ships an in-memory one.
//! let store = create_store_with(&engine, false, &Modules::new().root(module.clone()), vec![])?;
//! assert_eq!(module.facade().get("count")?, json!(5));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Error types
pub mod error;

/// Value model shared by state, payloads, and getters
pub mod value;

/// Class definitions, role marks, and classification
pub mod reflect;

/// Module descriptors, facades, and projection
pub mod module;

/// Store engine contract and option assembly
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{BoxError, Error, Result};
pub use module::{
    project, ActionArgs, ConflictPolicy, Context, GetterArgs, LocalState, ModuleClass, ModuleDescriptor,
    ModuleFacade, ModuleOptions, MutationArgs, UnmarkedMethodPolicy, Wiring,
};
pub use reflect::{classify, ClassBuilder, ClassDef, Classified, MemberRole, Param, Role, NO_PARAMS};
pub use store::{
    create_options, create_store_with, wiring_plugin, ActionContext, ModuleConfig, Modules, MutationRecord,
    Plugin, Store, StoreEngine, StoreHandle, StoreOptions, ROOT_MODULE,
};
pub use value::{Args, GetterValue, StateMap, Value};
