//! VClass Runtime
//!
//! Reference in-memory store engine for projected modules:
//! - [`MemoryStore`]: state tree, handler registry, commit/dispatch, and
//!   mutation and action subscriptions
//! - [`MemoryEngine`]: the [`StoreEngine`](vclass_engine::StoreEngine)
//!   building it
//! - [`create_store`]: assemble modules and build a store in one call
//! - [`logger_plugin`]: mutation logging through `tracing`

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod plugins;
mod store;

use std::sync::Arc;

pub use plugins::logger_plugin;
pub use store::{ActionRecord, ActionSubscriber, MemoryEngine, MemoryStore};

pub use vclass_engine::{Modules, Plugin, Result};

/// Assemble `modules` into a store.
///
/// The wiring plugin runs first, then `plugins` in order; once this returns,
/// every module's facade routes through the store.
pub fn create_store(strict: bool, modules: &Modules, plugins: Vec<Plugin>) -> Result<Arc<MemoryStore>> {
    MemoryStore::build(vclass_engine::create_options(strict, modules, plugins)?)
}
