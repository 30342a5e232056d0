//! Member Classifier
//!
//! Decides the role of every own member of a class. Instance fields come from
//! one zero-argument instantiation; prototype members come from the class
//! definition. Each member is checked against the marks in this order:
//!
//! 1. `Exclude` → passthrough
//! 2. `Constructor` → post-construction initializer
//! 3. Instance field → state (plus a read-back getter when marked `Getter`)
//! 4. Accessor → getter for `get`, mutation for `set`
//! 5. Method → `Getter`, `Mutation`, `Action`, else the unmarked-method policy
//!
//! The classifier only reads; it never changes the class.

use tracing::{debug, warn};

use super::annotation::{is_reserved_name, AnnotationRecord, Role};
use super::class_def::{ClassDef, Member};
use crate::error::{Error, Result};
use crate::module::{ConflictPolicy, ModuleOptions, UnmarkedMethodPolicy};

/// Structural shape of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// Instance field
    Field,
    /// Prototype accessor with the given halves
    Accessor {
        /// Has a read body
        get: bool,
        /// Has a write body
        set: bool,
    },
    /// Prototype method
    Method {
        /// Body returns a future
        is_async: bool,
    },
    /// Plain prototype value
    Constant,
}

/// Role a member plays in the projected module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Copied onto the facade, never store-routed
    Passthrough,
    /// Post-construction initializer
    Constructor,
    /// State field; `getter` adds a read-back getter
    State {
        /// Marked `Getter`
        getter: bool,
    },
    /// Native accessor: `get` becomes a getter, `set` a mutation
    Accessor,
    /// Getter-marked method, stored as a function in the getter namespace
    DerivedComputation,
    /// Mutation-marked method
    StateMutator,
    /// Action-marked (or default) method
    AsyncOperation,
}

/// Classification of one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// Member name
    pub name: String,
    /// Decided role
    pub role: MemberRole,
    /// Structural shape
    pub kind: AccessorKind,
}

/// Classify the members of `class`.
///
/// `fields` are the names of the instance's own fields, in instantiation
/// order. Fields are listed first, then prototype members in declaration
/// order. Reserved bookkeeping names are skipped.
pub fn classify(class: &ClassDef, fields: &[String], options: &ModuleOptions) -> Result<Vec<Classified>> {
    let marks = class.annotations();
    validate_marks(class, fields)?;

    let mut out = Vec::with_capacity(fields.len() + class.members().len());

    for name in fields {
        if is_reserved_name(name) {
            debug!(class = %class.name(), member = %name, "skipping reserved field name");
            continue;
        }
        if class.member(name).is_some() {
            return Err(Error::setup(
                class.name(),
                format!("`{}` is declared both as a field and as a prototype member", name),
            ));
        }
        let kind = AccessorKind::Field;
        let role = resolve_field(class, name, marks, options)?;
        debug!(class = %class.name(), member = %name, role = ?role, "classified field");
        out.push(Classified {
            name: name.clone(),
            role,
            kind,
        });
    }

    for (name, member) in class.members() {
        if is_reserved_name(name) {
            debug!(class = %class.name(), member = %name, "skipping reserved member name");
            continue;
        }
        let kind = match member {
            Member::Method(m) => AccessorKind::Method {
                is_async: m.body.is_async(),
            },
            Member::Accessor(a) => AccessorKind::Accessor {
                get: a.get.is_some(),
                set: a.set.is_some(),
            },
            Member::Constant(_) => AccessorKind::Constant,
        };
        let role = resolve_member(class, name, kind, marks, options)?;
        debug!(class = %class.name(), member = %name, kind = member.kind_name(), role = ?role, "classified member");
        out.push(Classified {
            name: name.clone(),
            role,
            kind,
        });
    }

    Ok(out)
}

/// Every mark must name an existing member; at most one constructor alias,
/// and only on a method.
fn validate_marks(class: &ClassDef, fields: &[String]) -> Result<()> {
    let marks = class.annotations();
    for name in marks.marked_names() {
        if !fields.iter().any(|f| f == name) && class.member(name).is_none() {
            return Err(Error::UnknownMember {
                class: class.name().to_string(),
                member: name.to_string(),
            });
        }
    }

    let candidates = marks.constructor_candidates();
    if candidates.len() > 1 {
        return Err(Error::InvalidMark {
            member: candidates.join(", "),
            reason: "only one constructor alias is allowed".to_string(),
        });
    }
    if let Some(name) = candidates.first() {
        if !matches!(class.member(name), Some(Member::Method(_))) {
            return Err(Error::InvalidMark {
                member: name.clone(),
                reason: "constructor alias must be a method".to_string(),
            });
        }
    }
    Ok(())
}

/// Apply the conflict policy to the store-affecting marks on a member
fn check_conflict(class: &ClassDef, name: &str, roles: &[Role], options: &ModuleOptions) -> Result<()> {
    if roles.len() < 2 {
        return Ok(());
    }
    let listed = roles.iter().map(Role::name).collect::<Vec<_>>().join(", ");
    match options.conflicts {
        ConflictPolicy::Reject => Err(Error::RoleConflict {
            class: class.name().to_string(),
            member: name.to_string(),
            roles: listed,
        }),
        ConflictPolicy::Precedence => {
            debug!(
                class = %class.name(),
                member = %name,
                roles = %listed,
                winner = %roles[0].name(),
                "role conflict resolved by precedence"
            );
            Ok(())
        }
    }
}

fn resolve_field(
    class: &ClassDef,
    name: &str,
    marks: &AnnotationRecord,
    options: &ModuleOptions,
) -> Result<MemberRole> {
    // Fields always get a mutation, so a Mutation mark adds nothing.
    let roles: Vec<Role> = marks
        .roles_of(name)
        .into_iter()
        .filter(|r| *r != Role::Mutation)
        .collect();
    check_conflict(class, name, &roles, options)?;

    if marks.has(name, Role::Exclude) {
        return Ok(MemberRole::Passthrough);
    }
    if marks.has(name, Role::Action) {
        warn!(class = %class.name(), member = %name, "action mark on a field is ignored");
    }
    Ok(MemberRole::State {
        getter: marks.has(name, Role::Getter),
    })
}

fn resolve_member(
    class: &ClassDef,
    name: &str,
    kind: AccessorKind,
    marks: &AnnotationRecord,
    options: &ModuleOptions,
) -> Result<MemberRole> {
    let roles = marks.roles_of(name);
    check_conflict(class, name, &roles, options)?;

    if marks.has(name, Role::Exclude) {
        return Ok(MemberRole::Passthrough);
    }
    if marks.has(name, Role::Constructor) {
        return Ok(MemberRole::Constructor);
    }

    match kind {
        AccessorKind::Field => Ok(MemberRole::State {
            getter: marks.has(name, Role::Getter),
        }),
        AccessorKind::Accessor { .. } => {
            if !roles.is_empty() {
                warn!(
                    class = %class.name(),
                    member = %name,
                    "role marks on an accessor are ignored; get/set decide its role"
                );
            }
            Ok(MemberRole::Accessor)
        }
        AccessorKind::Constant => {
            if !roles.is_empty() {
                warn!(class = %class.name(), member = %name, "role marks on a constant are ignored");
            }
            Ok(MemberRole::Passthrough)
        }
        AccessorKind::Method { is_async } => {
            let role = if marks.has(name, Role::Getter) {
                MemberRole::DerivedComputation
            } else if marks.has(name, Role::Mutation) {
                MemberRole::StateMutator
            } else if marks.has(name, Role::Action) {
                MemberRole::AsyncOperation
            } else {
                match options.unmarked_methods {
                    UnmarkedMethodPolicy::Action => MemberRole::AsyncOperation,
                    UnmarkedMethodPolicy::Passthrough => MemberRole::Passthrough,
                }
            };
            if is_async && matches!(role, MemberRole::DerivedComputation | MemberRole::StateMutator) {
                return Err(Error::InvalidMark {
                    member: name.to_string(),
                    reason: "getters and mutations must be synchronous".to_string(),
                });
            }
            Ok(role)
        }
    }
}
