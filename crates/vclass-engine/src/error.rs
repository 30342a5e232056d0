//! Error types shared by classification, projection, and store engines.
//!
//! Method bodies written against a facade return the same [`Result`], so an
//! error raised inside a module method reaches the caller unchanged whether the
//! call went through the store or ran locally.

/// Boxed error carried by [`Error::Custom`] and [`Error::Setup`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type used across the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The zero-argument initializer of a class failed or produced a non-object
    #[error("Setup error in class `{class}`: {source}")]
    Setup {
        /// Class being registered
        class: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// A member carries several role marks and conflicts are rejected
    #[error("Member `{member}` of `{class}` has conflicting roles: {roles}")]
    RoleConflict {
        /// Class being registered
        class: String,
        /// Member name
        member: String,
        /// The marks found on the member, in precedence order
        roles: String,
    },

    /// A mark or lookup names a member the class does not have
    #[error("Unknown member `{member}` on `{class}`")]
    UnknownMember {
        /// Class or module name
        class: String,
        /// Member name
        member: String,
    },

    /// A mark cannot apply to the member it was placed on
    #[error("Invalid mark on `{member}`: {reason}")]
    InvalidMark {
        /// Member name
        member: String,
        /// Why the mark is rejected
        reason: String,
    },

    /// The member exists but does not support the requested operation
    #[error("Member `{member}` is not {expected}")]
    WrongKind {
        /// Member name
        member: String,
        /// What the operation needed (e.g. "callable")
        expected: &'static str,
    },

    /// Assignment to a getter-only member
    #[error("Member `{0}` is read-only")]
    ReadOnly(String),

    /// Read of a setter-only member
    #[error("Member `{0}` is write-only")]
    WriteOnly(String),

    /// A descriptor already holds a different store handle
    #[error("Module `{0}` is already wired to another store")]
    AlreadyWired(String),

    /// A store handler outlived the facade it routes to
    #[error("Module `{0}` was dropped")]
    ModuleDropped(String),

    /// Modules cannot be assembled into store options as laid out
    #[error("Module layout error: {0}")]
    ModuleLayout(String),

    /// Commit of an unregistered mutation
    #[error("Unknown mutation type: {0}")]
    UnknownMutation(String),

    /// Dispatch of an unregistered action
    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    /// Lookup of an unregistered getter
    #[error("Unknown getter: {0}")]
    UnknownGetter(String),

    /// Two handlers registered under the same qualified name
    #[error("Duplicate {kind} handler: {name}")]
    DuplicateHandler {
        /// "getter", "mutation" or "action"
        kind: &'static str,
        /// Qualified name
        name: String,
    },

    /// State written outside a mutation handler in strict mode
    #[error("Do not mutate store state outside mutation handlers (key `{0}`)")]
    OutsideMutation(String),

    /// Error raised by user code
    #[error("{0}")]
    Custom(BoxError),
}

impl Error {
    /// Wrap any error raised by user code
    pub fn custom<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Custom(err.into())
    }

    /// Build a user error from a message
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Custom(message.into().into())
    }

    pub(crate) fn setup(class: &str, source: impl Into<BoxError>) -> Self {
        Error::Setup {
            class: class.to_string(),
            source: source.into(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::msg(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::msg(s)
    }
}
