//! Module projection: options, contexts, descriptor, facade, and the
//! projector tying them together.

mod context;
mod descriptor;
mod facade;
mod options;
mod projector;

pub use context::{ActionArgs, Context, GetterArgs, MutationArgs};
pub use descriptor::{LocalState, ModuleDescriptor, Wiring};
pub use facade::ModuleFacade;
pub use options::{ConflictPolicy, ModuleOptions, UnmarkedMethodPolicy};
pub use projector::{project, ModuleClass};
