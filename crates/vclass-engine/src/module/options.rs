//! Module options.

use serde::{Deserialize, Serialize};

/// How methods without a role mark are classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmarkedMethodPolicy {
    /// Register unmarked methods as actions
    #[default]
    Action,
    /// Leave unmarked methods on the facade, never store-routed
    Passthrough,
}

/// What to do when a member carries more than one role mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Exclude > Constructor > Getter > Mutation > Action
    #[default]
    Precedence,
    /// Fail projection with `Error::RoleConflict`
    Reject,
}

/// Options for projecting a class into a store module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleOptions {
    /// Module name; present means namespaced
    pub name: Option<String>,
    /// Classification of unmarked methods
    pub unmarked_methods: UnmarkedMethodPolicy,
    /// Handling of multiply-marked members
    pub conflicts: ConflictPolicy,
}

impl ModuleOptions {
    /// Options for a namespaced module
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the unmarked-method policy
    pub fn with_unmarked_methods(mut self, policy: UnmarkedMethodPolicy) -> Self {
        self.unmarked_methods = policy;
        self
    }

    /// Set the conflict policy
    pub fn with_conflicts(mut self, policy: ConflictPolicy) -> Self {
        self.conflicts = policy;
        self
    }

    /// Whether the module is namespaced. An empty name counts as absent.
    pub fn is_namespaced(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }
}
