//! Value Model
//!
//! State, payloads, and method arguments are plain JSON values. Getters can
//! also produce functions (derived computations), which JSON cannot hold, so
//! the getter namespace uses [`GetterValue`].

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{Error, Result};

pub use serde_json::{Map, Value};

/// Positional arguments of a method call
pub type Args = Vec<Value>;

/// Object map holding a module's state fields
pub type StateMap = Map<String, Value>;

/// Awaitable result of an action dispatch
pub type ActionFuture = BoxFuture<'static, Result<Value>>;

/// Function stored in the getter namespace by a derived computation
pub type GetterFn = Arc<dyn Fn(Args) -> Result<Value> + Send + Sync>;

/// Value read from the getter namespace
#[derive(Clone)]
pub enum GetterValue {
    /// Plain derived value
    Value(Value),
    /// Derived computation, invoked with arguments
    Function(GetterFn),
}

impl GetterValue {
    /// Unwrap a plain value; calling code that expects a value but finds a
    /// function gets `WrongKind`
    pub fn into_value(self, name: &str) -> Result<Value> {
        match self {
            GetterValue::Value(v) => Ok(v),
            GetterValue::Function(_) => Err(Error::WrongKind {
                member: name.to_string(),
                expected: "a plain getter value",
            }),
        }
    }

    /// Invoke a derived computation
    pub fn call(self, name: &str, args: Args) -> Result<Value> {
        match self {
            GetterValue::Function(f) => f(args),
            GetterValue::Value(_) => Err(Error::WrongKind {
                member: name.to_string(),
                expected: "a getter function",
            }),
        }
    }

    /// Check if this is a derived computation
    pub fn is_function(&self) -> bool {
        matches!(self, GetterValue::Function(_))
    }
}

impl fmt::Debug for GetterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetterValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            GetterValue::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<Value> for GetterValue {
    fn from(v: Value) -> Self {
        GetterValue::Value(v)
    }
}

/// Convert a method payload back into positional arguments.
///
/// Method commits and dispatches carry their arguments as an array; any other
/// payload is treated as a single argument.
pub fn payload_args(payload: Value) -> Args {
    match payload {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Qualify a member name with a module namespace (`"mod/name"`)
pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}
