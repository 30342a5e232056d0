//! Store option assembly.
//!
//! Collects projected modules into [`StoreOptions`] and prepends the wiring
//! plugin that attaches every module's descriptor to the constructed store.

use std::sync::Arc;

use tracing::debug;

use super::{Plugin, StoreEngine, StoreHandle, StoreOptions};
use crate::error::{Error, Result};
use crate::module::ModuleClass;

/// Key of the root (non-namespaced) module
pub const ROOT_MODULE: &str = "root";

/// Modules to assemble into a store: an optional root plus named children
#[derive(Clone, Debug, Default)]
pub struct Modules {
    root: Option<ModuleClass>,
    children: Vec<(String, ModuleClass)>,
}

impl Modules {
    /// Empty module set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root module
    pub fn root(mut self, module: ModuleClass) -> Self {
        self.root = Some(module);
        self
    }

    /// Add a named child module
    pub fn module(mut self, key: impl Into<String>, module: ModuleClass) -> Self {
        self.insert(key, module);
        self
    }

    /// Insert a module by key; [`ROOT_MODULE`] sets the root. An existing
    /// entry under the same key is replaced.
    pub fn insert(&mut self, key: impl Into<String>, module: ModuleClass) {
        let key = key.into();
        if key == ROOT_MODULE {
            self.root = Some(module);
            return;
        }
        match self.children.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = module,
            None => self.children.push((key, module)),
        }
    }

    /// Module by key
    pub fn get(&self, key: &str) -> Option<&ModuleClass> {
        if key == ROOT_MODULE {
            return self.root.as_ref();
        }
        self.children.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    /// Modules in assembly order, root first
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleClass)> {
        self.root
            .iter()
            .map(|m| (ROOT_MODULE, m))
            .chain(self.children.iter().map(|(k, m)| (k.as_str(), m)))
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.children.len() + usize::from(self.root.is_some())
    }

    /// Check if there are no modules
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assemble store options from `modules`.
///
/// The wiring plugin is always first, followed by `plugins` in order.
pub fn create_options(strict: bool, modules: &Modules, plugins: Vec<Plugin>) -> Result<StoreOptions> {
    let mut options = StoreOptions {
        strict,
        ..StoreOptions::default()
    };

    if let Some((_, wired)) = modules.iter().find(|(_, m)| m.descriptor().is_attached()) {
        return Err(Error::AlreadyWired(wired.name().to_string()));
    }

    if let Some(root) = &modules.root {
        if root.descriptor().is_namespaced() {
            return Err(Error::ModuleLayout(format!(
                "root module `{}` must not be namespaced (it is named `{}`)",
                root.name(),
                root.descriptor().module_name()
            )));
        }
        let config = root.config();
        options.state = config.state;
        options.getters = config.getters;
        options.mutations = config.mutations;
        options.actions = config.actions;
    }

    for (key, module) in &modules.children {
        let desc = module.descriptor();
        if !desc.is_namespaced() {
            return Err(Error::ModuleLayout(format!(
                "module `{}` registered under `{}` must be namespaced",
                module.name(),
                key
            )));
        }
        if desc.module_name() != key {
            return Err(Error::ModuleLayout(format!(
                "module `{}` is named `{}` but registered under `{}`",
                module.name(),
                desc.module_name(),
                key
            )));
        }
        options.modules.push((key.clone(), module.config()));
    }

    let classes: Vec<ModuleClass> = modules.iter().map(|(_, m)| m.clone()).collect();
    options.plugins = Vec::with_capacity(plugins.len() + 1);
    options.plugins.push(wiring_plugin(classes));
    options.plugins.extend(plugins);

    debug!(
        strict,
        modules = modules.len(),
        plugins = options.plugins.len(),
        "assembled store options"
    );
    Ok(options)
}

/// Plugin attaching each module's descriptor to the store it runs with.
///
/// Every descriptor is checked before any is attached, so a rejected store
/// leaves all modules as they were.
pub fn wiring_plugin(classes: Vec<ModuleClass>) -> Plugin {
    Arc::new(move |store: &StoreHandle| {
        for class in &classes {
            class.descriptor().check_attach(store)?;
        }
        for class in &classes {
            class.descriptor().attach(store.clone())?;
        }
        Ok(())
    })
}

/// Assemble options and build a store with `engine`
pub fn create_store_with<E>(engine: &E, strict: bool, modules: &Modules, plugins: Vec<Plugin>) -> Result<StoreHandle>
where
    E: StoreEngine + ?Sized,
{
    engine.build(create_options(strict, modules, plugins)?)
}
