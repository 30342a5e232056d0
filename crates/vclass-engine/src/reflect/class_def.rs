//! Class Definitions
//!
//! A [`ClassDef`] is the declarative form of a store module class: instance
//! fields produced by a zero-argument initializer, prototype members
//! (methods, accessors, constants), and the annotation record marking their
//! roles.
//!
//! ```rust,ignore
//! let counter = ClassDef::builder("Counter")
//!     .field("count", json!(0))
//!     .mutation("increment", ["step"], |this, args, _ctx| {
//!         let count = this.get("count")?.as_i64().unwrap_or(0);
//!         let step = args[0].as_i64().unwrap_or(0);
//!         this.set("count", json!(count + step))?;
//!         Ok(Value::Null)
//!     })
//!     .build();
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::annotation::{AnnotationRecord, Role};
use crate::error::{Error, Result};
use crate::module::{Context, GetterArgs, ModuleFacade, MutationArgs};
use crate::value::{ActionFuture, Args, StateMap, Value};

/// Zero-argument instance initializer; must produce an object of fields
pub type InitFn = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// Synchronous method body
pub type SyncMethodFn = Arc<dyn Fn(&ModuleFacade, Args, Context) -> Result<Value> + Send + Sync>;

/// Asynchronous method body
pub type AsyncMethodFn = Arc<dyn Fn(&ModuleFacade, Args, Context) -> ActionFuture + Send + Sync>;

/// Accessor read body
pub type GetFn = Arc<dyn Fn(&ModuleFacade, &GetterArgs) -> Result<Value> + Send + Sync>;

/// Accessor write body
pub type SetFn = Arc<dyn Fn(&ModuleFacade, Value, &MutationArgs) -> Result<()> + Send + Sync>;

/// Empty parameter list
pub const NO_PARAMS: [&str; 0] = [];

/// Declared method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Value used when the caller omits the argument
    pub default: Option<Value>,
}

impl Param {
    /// Parameter without a default
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Parameter with a default value
    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }

    /// Whether the caller may omit this parameter
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

impl From<&str> for Param {
    fn from(name: &str) -> Self {
        Param::required(name)
    }
}

impl From<&&str> for Param {
    fn from(name: &&str) -> Self {
        Param::required(*name)
    }
}

impl From<String> for Param {
    fn from(name: String) -> Self {
        Param::required(name)
    }
}

/// Method body, synchronous or asynchronous
#[derive(Clone)]
pub enum MethodBody {
    /// Returns immediately
    Sync(SyncMethodFn),
    /// Returns a future
    Async(AsyncMethodFn),
}

impl MethodBody {
    /// Whether the body returns a future
    pub fn is_async(&self) -> bool {
        matches!(self, MethodBody::Async(_))
    }

    /// Run the body as an action; synchronous bodies resolve immediately
    pub fn invoke_async(&self, this: &ModuleFacade, args: Args, ctx: Context) -> ActionFuture {
        match self {
            MethodBody::Async(f) => f(this, args, ctx),
            MethodBody::Sync(f) => Box::pin(futures::future::ready(f(this, args, ctx))),
        }
    }

    /// Run a synchronous body; `member` names the method in the error
    /// returned for asynchronous bodies
    pub fn invoke_sync(&self, member: &str, this: &ModuleFacade, args: Args, ctx: Context) -> Result<Value> {
        match self {
            MethodBody::Sync(f) => f(this, args, ctx),
            MethodBody::Async(_) => Err(Error::WrongKind {
                member: member.to_string(),
                expected: "synchronous",
            }),
        }
    }
}

/// Prototype method
#[derive(Clone)]
pub struct MethodDef {
    /// Declared parameters
    pub params: Vec<Param>,
    /// Body
    pub body: MethodBody,
}

/// Prototype accessor (native get/set pair)
#[derive(Clone, Default)]
pub struct AccessorDef {
    /// Read body
    pub get: Option<GetFn>,
    /// Write body
    pub set: Option<SetFn>,
}

/// Prototype member
#[derive(Clone)]
pub enum Member {
    /// Method
    Method(MethodDef),
    /// Accessor property
    Accessor(AccessorDef),
    /// Plain value on the prototype
    Constant(Value),
}

impl Member {
    /// Short kind name used in logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Member::Method(m) if m.body.is_async() => "async method",
            Member::Method(_) => "method",
            Member::Accessor(_) => "accessor",
            Member::Constant(_) => "constant",
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Method(m) => f
                .debug_struct("Method")
                .field("params", &m.params)
                .field("async", &m.body.is_async())
                .finish(),
            Member::Accessor(a) => f
                .debug_struct("Accessor")
                .field("get", &a.get.is_some())
                .field("set", &a.set.is_some())
                .finish(),
            Member::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
        }
    }
}

/// Declarative store module class
#[derive(Clone)]
pub struct ClassDef {
    name: String,
    fields: StateMap,
    init: Option<InitFn>,
    members: Vec<(String, Member)>,
    annotations: AnnotationRecord,
}

impl ClassDef {
    /// Start building a class
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            class: ClassDef {
                name: name.into(),
                fields: StateMap::new(),
                init: None,
                members: Vec::new(),
                annotations: AnnotationRecord::new(),
            },
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create one instance with no arguments and return its own fields.
    ///
    /// Declared field defaults come first; the initializer's fields are laid
    /// over them.
    pub fn instantiate(&self) -> Result<StateMap> {
        let mut fields = self.fields.clone();
        if let Some(init) = &self.init {
            let produced = init().map_err(|e| Error::setup(&self.name, e))?;
            match produced {
                Value::Object(map) => fields.extend(map),
                Value::Null => {}
                other => {
                    return Err(Error::setup(
                        &self.name,
                        format!("initializer produced {} instead of an object", type_name(&other)),
                    ))
                }
            }
        }
        Ok(fields)
    }

    /// Prototype members in declaration order
    pub fn members(&self) -> &[(String, Member)] {
        &self.members
    }

    /// Look up a prototype member
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Names of declared fields (without running the initializer)
    pub fn declared_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Role marks
    pub fn annotations(&self) -> &AnnotationRecord {
        &self.annotations
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("init", &self.init.is_some())
            .field("members", &self.members)
            .field("annotations", &self.annotations)
            .finish()
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Builder for [`ClassDef`]
pub struct ClassBuilder {
    class: ClassDef,
}

impl ClassBuilder {
    // ========================================================================
    // Instance fields
    // ========================================================================

    /// Declare an instance field with its initial value
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.class.fields.insert(name.into(), value);
        self
    }

    /// Declare a field and mark it with the documentation-only `State` role
    pub fn state(self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.field(name.clone(), value).mark(name, Role::State)
    }

    /// Set the zero-argument initializer producing the instance fields
    pub fn init<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        self.class.init = Some(Arc::new(f));
        self
    }

    // ========================================================================
    // Prototype members
    // ========================================================================

    /// Define a synchronous method
    pub fn method<I, P, F>(mut self, name: impl Into<String>, params: I, f: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
        F: Fn(&ModuleFacade, Args, Context) -> Result<Value> + Send + Sync + 'static,
    {
        let def = MethodDef {
            params: params.into_iter().map(Into::into).collect(),
            body: MethodBody::Sync(Arc::new(f)),
        };
        self.put(name.into(), Member::Method(def));
        self
    }

    /// Define an asynchronous method
    pub fn async_method<I, P, F, Fut>(mut self, name: impl Into<String>, params: I, f: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
        F: Fn(&ModuleFacade, Args, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let body: AsyncMethodFn = Arc::new(move |this, args, ctx| Box::pin(f(this, args, ctx)));
        let def = MethodDef {
            params: params.into_iter().map(Into::into).collect(),
            body: MethodBody::Async(body),
        };
        self.put(name.into(), Member::Method(def));
        self
    }

    /// Define the read half of an accessor
    pub fn computed<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ModuleFacade, &GetterArgs) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_accessor(name.into(), |acc| acc.get = Some(Arc::new(f)));
        self
    }

    /// Define the write half of an accessor
    pub fn setter<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ModuleFacade, Value, &MutationArgs) -> Result<()> + Send + Sync + 'static,
    {
        self.with_accessor(name.into(), |acc| acc.set = Some(Arc::new(f)));
        self
    }

    /// Define a plain prototype value
    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.put(name.into(), Member::Constant(value));
        self
    }

    // ========================================================================
    // Marks
    // ========================================================================

    /// Mark a member with a role
    pub fn mark(mut self, name: impl Into<String>, role: Role) -> Self {
        self.class.annotations.mark(name, role);
        self
    }

    /// Mark a member as excluded from the store
    pub fn exclude(self, name: impl Into<String>) -> Self {
        self.mark(name, Role::Exclude)
    }

    /// Designate a method as the post-construction initializer
    pub fn constructor_alias(self, name: impl Into<String>) -> Self {
        self.mark(name, Role::Constructor)
    }

    // ========================================================================
    // Define-and-mark shorthands
    // ========================================================================

    /// Define a method and mark it as a getter (derived computation)
    pub fn getter_fn<I, P, F>(self, name: impl Into<String>, params: I, f: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
        F: Fn(&ModuleFacade, Args, Context) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        self.method(name.clone(), params, f).mark(name, Role::Getter)
    }

    /// Define a method and mark it as a mutation
    pub fn mutation<I, P, F>(self, name: impl Into<String>, params: I, f: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
        F: Fn(&ModuleFacade, Args, Context) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        self.method(name.clone(), params, f).mark(name, Role::Mutation)
    }

    /// Define an asynchronous method and mark it as an action
    pub fn action<I, P, F, Fut>(self, name: impl Into<String>, params: I, f: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
        F: Fn(&ModuleFacade, Args, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let name = name.into();
        self.async_method(name.clone(), params, f).mark(name, Role::Action)
    }

    /// Define a method and designate it as the post-construction initializer
    pub fn initializer<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ModuleFacade, Args) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        self.method(name.clone(), NO_PARAMS, move |this, args, _ctx| {
            f(this, args)?;
            Ok(Value::Null)
        })
        .constructor_alias(name)
    }

    /// Finish the class
    pub fn build(self) -> ClassDef {
        self.class
    }

    fn put(&mut self, name: String, member: Member) {
        match self.class.members.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = member,
            None => self.class.members.push((name, member)),
        }
    }

    fn with_accessor(&mut self, name: String, f: impl FnOnce(&mut AccessorDef)) {
        match self.class.members.iter_mut().find(|(n, _)| *n == name) {
            Some((_, Member::Accessor(acc))) => f(acc),
            Some((_, slot)) => {
                let mut acc = AccessorDef::default();
                f(&mut acc);
                *slot = Member::Accessor(acc);
            }
            None => {
                let mut acc = AccessorDef::default();
                f(&mut acc);
                self.class.members.push((name, Member::Accessor(acc)));
            }
        }
    }
}
