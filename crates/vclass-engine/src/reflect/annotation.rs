//! Annotation Records
//!
//! Role marks attached to class members. A record maps each role to the set
//! of member names carrying it; the constructor alias is a single designated
//! member.
//!
//! Marks are owned by the class definition that declares them and are read
//! once at projection time.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Member name that is never classified
pub const CONSTRUCTOR_SENTINEL: &str = "constructor";

/// Role mark that can be placed on a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Copy onto the facade as-is, never store-routed
    Exclude,
    /// Post-construction initializer receiving the construction arguments
    Constructor,
    /// Expose through the store's getter namespace
    Getter,
    /// Register as a store mutation
    Mutation,
    /// Register as a store action
    Action,
    /// Documentation-only marker for state fields
    State,
}

impl Role {
    /// Store-affecting roles from strongest to weakest. `State` is not listed
    /// because it never changes classification.
    pub const PRECEDENCE: [Role; 5] = [
        Role::Exclude,
        Role::Constructor,
        Role::Getter,
        Role::Mutation,
        Role::Action,
    ];

    /// Lowercase role name
    pub fn name(&self) -> &'static str {
        match self {
            Role::Exclude => "exclude",
            Role::Constructor => "constructor",
            Role::Getter => "getter",
            Role::Mutation => "mutation",
            Role::Action => "action",
            Role::State => "state",
        }
    }
}

/// Check whether a member name is reserved for bookkeeping.
///
/// Reserved names are the constructor sentinel and anything shaped like
/// `$_name_$`.
pub fn is_reserved_name(name: &str) -> bool {
    name == CONSTRUCTOR_SENTINEL || (name.len() >= 4 && name.starts_with("$_") && name.ends_with("_$"))
}

/// Role marks for one class
#[derive(Debug, Clone, Default)]
pub struct AnnotationRecord {
    /// Role -> marked member names
    marks: FxHashMap<Role, FxHashSet<String>>,
    /// Members designated as constructor alias, in mark order
    constructors: Vec<String>,
}

impl AnnotationRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a member with a role
    pub fn mark(&mut self, name: impl Into<String>, role: Role) {
        let name = name.into();
        if role == Role::Constructor {
            if !self.constructors.contains(&name) {
                self.constructors.push(name);
            }
            return;
        }
        self.marks.entry(role).or_default().insert(name);
    }

    /// Check if a member carries a role
    pub fn has(&self, name: &str, role: Role) -> bool {
        if role == Role::Constructor {
            return self.constructors.iter().any(|c| c == name);
        }
        self.marks.get(&role).is_some_and(|set| set.contains(name))
    }

    /// Store-affecting roles on a member, in precedence order
    pub fn roles_of(&self, name: &str) -> Vec<Role> {
        Role::PRECEDENCE
            .iter()
            .copied()
            .filter(|role| self.has(name, *role))
            .collect()
    }

    /// The designated constructor alias, if exactly one was marked
    pub fn constructor(&self) -> Option<&str> {
        match self.constructors.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// All members marked as constructor alias
    pub fn constructor_candidates(&self) -> &[String] {
        &self.constructors
    }

    /// Every member name mentioned by any mark, sorted
    pub fn marked_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .marks
            .values()
            .flat_map(|set| set.iter().map(String::as_str))
            .chain(self.constructors.iter().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
