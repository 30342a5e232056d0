//! Class reflection: declarative class definitions, role marks, and member
//! classification.

mod annotation;
mod class_def;
mod classifier;

pub use annotation::{is_reserved_name, AnnotationRecord, Role, CONSTRUCTOR_SENTINEL};
pub use class_def::{
    AccessorDef, AsyncMethodFn, ClassBuilder, ClassDef, GetFn, InitFn, Member, MethodBody, MethodDef, Param,
    SetFn, SyncMethodFn, NO_PARAMS,
};
pub use classifier::{classify, AccessorKind, Classified, MemberRole};
