//! Module Projector
//!
//! Turns a [`ClassDef`] into a [`ModuleClass`]: a facade plus a descriptor
//! whose handler maps are ready to be placed in a store's options.
//!
//! The projection runs in two phases. Everything that can fail (instantiation,
//! mark validation, classification) runs first; the facade and its handlers
//! are then built in one infallible step so handlers can hold a weak
//! reference back to the facade they belong to.

use std::sync::{Arc, Weak};

use futures::future;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::info;

use super::context::{ActionArgs, Context, GetterArgs, MutationArgs};
use super::descriptor::ModuleDescriptor;
use super::facade::{FacadeInner, ModuleFacade, Slot};
use super::options::ModuleOptions;
use crate::error::Result;
use crate::reflect::{classify, AccessorDef, ClassDef, Classified, Member, MemberRole, MethodDef};
use crate::store::{ActionContext, ActionHandler, GetterHandler, ModuleConfig, MutationHandler};
use crate::value::{payload_args, Args, GetterFn, GetterValue, StateMap, Value};

/// A projected store module class
#[derive(Clone, Debug)]
pub struct ModuleClass {
    facade: ModuleFacade,
}

impl ModuleClass {
    /// Project `class` with default options (root module, unmarked methods
    /// become actions)
    pub fn new(class: &ClassDef) -> Result<Self> {
        project(class, &ModuleOptions::default())
    }

    /// The shared facade
    pub fn facade(&self) -> &ModuleFacade {
        &self.facade
    }

    /// The module descriptor
    pub fn descriptor(&self) -> &ModuleDescriptor {
        self.facade.descriptor()
    }

    /// Class name
    pub fn name(&self) -> &str {
        self.facade.class_name()
    }

    /// Module configuration for store assembly
    pub fn config(&self) -> ModuleConfig {
        self.descriptor().config()
    }

    /// Create an instance. Instances share the facade; the designated
    /// initializer, if any, runs with `args`.
    pub fn instantiate(&self, args: Args) -> Result<ModuleFacade> {
        let facade = self.facade.clone();
        if let Some(name) = facade.constructor_alias() {
            facade.call(name, args)?;
        }
        Ok(facade)
    }
}

/// Project a class into a store module
pub fn project(class: &ClassDef, options: &ModuleOptions) -> Result<ModuleClass> {
    let fields = class.instantiate()?;
    let field_names: Vec<String> = fields.keys().cloned().collect();
    let classified = classify(class, &field_names, options)?;
    let module_name = options.name.as_deref().filter(|_| options.is_namespaced());

    let inner = Arc::new_cyclic(|weak| build(class, fields, classified, module_name, weak));
    let facade = ModuleFacade(inner);

    let desc = facade.descriptor();
    info!(
        class = %desc.class_name(),
        namespace = %desc.module_name(),
        state = desc.local_state().fields().len(),
        getters = desc.getters().len(),
        mutations = desc.mutations().len(),
        actions = desc.actions().len(),
        "projected module class"
    );
    Ok(ModuleClass { facade })
}

// ============================================================================
// Assembly
// ============================================================================

#[derive(Default)]
struct Handlers {
    getters: FxHashMap<String, GetterHandler>,
    mutations: FxHashMap<String, MutationHandler>,
    actions: FxHashMap<String, ActionHandler>,
}

fn build(
    class: &ClassDef,
    mut fields: StateMap,
    classified: Vec<Classified>,
    module_name: Option<&str>,
    weak: &Weak<FacadeInner>,
) -> FacadeInner {
    let class_name = class.name().to_string();
    let mut state = StateMap::new();
    let mut passthrough = FxHashMap::default();
    let mut slots = FxHashMap::default();
    let mut handlers = Handlers::default();
    let mut constructor = None;

    for entry in &classified {
        let name = entry.name.clone();
        let member = class.member(&name);
        let slot = match (entry.role, member) {
            (MemberRole::State { getter }, _) => {
                state.insert(name.clone(), fields.remove(&name).unwrap_or(Value::Null));
                handlers.mutations.insert(name.clone(), state_mutation(&name));
                if getter {
                    handlers.getters.insert(name.clone(), state_getter(&name));
                }
                Slot::State { getter }
            }
            (MemberRole::Passthrough, None) => {
                passthrough.insert(name.clone(), fields.remove(&name).unwrap_or(Value::Null));
                Slot::PassValue
            }
            (MemberRole::Passthrough, Some(Member::Constant(value))) => {
                passthrough.insert(name.clone(), value.clone());
                Slot::PassValue
            }
            (MemberRole::Passthrough, Some(Member::Method(def))) => Slot::PassMethod(def.clone()),
            (MemberRole::Passthrough, Some(Member::Accessor(acc))) => Slot::PassAccessor(acc.clone()),
            (MemberRole::Constructor, Some(Member::Method(def))) => {
                constructor = Some(name.clone());
                Slot::Constructor(def.clone())
            }
            (MemberRole::Accessor, Some(Member::Accessor(acc))) => {
                if acc.get.is_some() {
                    handlers
                        .getters
                        .insert(name.clone(), accessor_getter(&class_name, acc, weak));
                }
                if acc.set.is_some() {
                    handlers
                        .mutations
                        .insert(name.clone(), accessor_mutation(&class_name, acc, weak));
                }
                Slot::Accessor(acc.clone())
            }
            (MemberRole::DerivedComputation, Some(Member::Method(def))) => {
                handlers
                    .getters
                    .insert(name.clone(), computation_getter(&class_name, &name, def, weak));
                Slot::Computation(def.clone())
            }
            (MemberRole::StateMutator, Some(Member::Method(def))) => {
                handlers
                    .mutations
                    .insert(name.clone(), method_mutation(&class_name, &name, def, weak));
                Slot::Mutator(def.clone())
            }
            (MemberRole::AsyncOperation, Some(Member::Method(def))) => {
                handlers
                    .actions
                    .insert(name.clone(), method_action(&class_name, &name, def, weak));
                Slot::Action(def.clone())
            }
            // The classifier only pairs these roles with the shapes above.
            _ => continue,
        };
        slots.insert(name, slot);
    }

    let mut descriptor = ModuleDescriptor::new(&class_name, module_name, state);
    descriptor.getters = handlers.getters;
    descriptor.mutations = handlers.mutations;
    descriptor.actions = handlers.actions;

    FacadeInner {
        descriptor,
        slots,
        classified,
        passthrough: RwLock::new(passthrough),
        constructor,
    }
}

// ============================================================================
// Store-facing handlers
// ============================================================================

fn state_mutation(key: &str) -> MutationHandler {
    let key = key.to_string();
    Arc::new(move |args: MutationArgs, payload: Value| args.state.set(&key, payload))
}

fn state_getter(key: &str) -> GetterHandler {
    let key = key.to_string();
    Arc::new(move |args: GetterArgs| {
        Ok(GetterValue::Value(
            args.state.get(&key).cloned().unwrap_or(Value::Null),
        ))
    })
}

fn accessor_getter(class: &str, acc: &AccessorDef, weak: &Weak<FacadeInner>) -> GetterHandler {
    let class = class.to_string();
    let get = acc.get.clone();
    let weak = weak.clone();
    Arc::new(move |args: GetterArgs| {
        let this = ModuleFacade::upgrade(&weak, &class)?;
        match &get {
            Some(get) => Ok(GetterValue::Value(get(&this, &args)?)),
            None => Ok(GetterValue::Value(Value::Null)),
        }
    })
}

fn accessor_mutation(class: &str, acc: &AccessorDef, weak: &Weak<FacadeInner>) -> MutationHandler {
    let class = class.to_string();
    let set = acc.set.clone();
    let weak = weak.clone();
    Arc::new(move |args: MutationArgs, payload: Value| {
        let this = ModuleFacade::upgrade(&weak, &class)?;
        match &set {
            Some(set) => set(&this, payload, &args),
            None => Ok(()),
        }
    })
}

fn computation_getter(class: &str, name: &str, def: &MethodDef, weak: &Weak<FacadeInner>) -> GetterHandler {
    let class = class.to_string();
    let name = name.to_string();
    let def = def.clone();
    let weak = weak.clone();
    Arc::new(move |args: GetterArgs| {
        let this = ModuleFacade::upgrade(&weak, &class)?;
        let name = name.clone();
        let def = def.clone();
        let f: GetterFn = Arc::new(move |call_args: Args| {
            let call_args = this.descriptor().apply_args(&name, &def.params, call_args);
            def.body
                .invoke_sync(&name, &this, call_args, Context::Getter(args.clone()))
        });
        Ok(GetterValue::Function(f))
    })
}

fn method_mutation(class: &str, name: &str, def: &MethodDef, weak: &Weak<FacadeInner>) -> MutationHandler {
    let class = class.to_string();
    let name = name.to_string();
    let def = def.clone();
    let weak = weak.clone();
    Arc::new(move |args: MutationArgs, payload: Value| {
        let this = ModuleFacade::upgrade(&weak, &class)?;
        let call_args = this.descriptor().apply_args(&name, &def.params, payload_args(payload));
        def.body
            .invoke_sync(&name, &this, call_args, Context::Mutation(args))
            .map(|_| ())
    })
}

fn method_action(class: &str, name: &str, def: &MethodDef, weak: &Weak<FacadeInner>) -> ActionHandler {
    let class = class.to_string();
    let name = name.to_string();
    let def = def.clone();
    let weak = weak.clone();
    Arc::new(move |ctx: ActionContext, payload: Value| {
        let this = match ModuleFacade::upgrade(&weak, &class) {
            Ok(this) => this,
            Err(e) => return Box::pin(future::ready(Err(e))),
        };
        let call_args = this.descriptor().apply_args(&name, &def.params, payload_args(payload));
        let store = Some(ctx.store.clone());
        let args = ActionArgs {
            context: Some(ctx),
            store,
        };
        def.body.invoke_async(&this, call_args, Context::Action(args))
    })
}
