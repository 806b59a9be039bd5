use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::context::Call;
use crate::error::Result;

/// A native callable: receives a handle positioned at its own call frame and
/// pulls whatever arguments it needs from it.
pub type NativeFn<E> = Arc<dyn Fn(&mut Call<'_, E>) -> Result<Value<E>> + Send + Sync>;

/// The result of evaluating a node.
///
/// Everything JSON can express, plus first-class functions so natives can
/// return closures. `E` is the host environment type of the context the
/// function will later be called with.
pub enum Value<E = ()> {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value<E>>),
    Object(Vec<(String, Value<E>)>),
    Function(NativeFn<E>),
}

impl<E> Value<E> {
    /// Wrap a closure as a function value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut Call<'_, E>) -> Result<Value<E>> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(f))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Function(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<E>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&NativeFn<E>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Look up a key of an object value.
    pub fn get(&self, key: &str) -> Option<&Value<E>> {
        match self {
            Value::Object(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Convert a decoded JSON literal into a value.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to JSON. Returns `None` if a function is reachable.
    ///
    /// Non-finite numbers become `null`; integral numbers are emitted
    /// without a fractional part.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Option<Vec<_>>>()?,
            ),
            Value::Object(pairs) => {
                let mut map = serde_json::Map::with_capacity(pairs.len());
                for (k, v) in pairs {
                    map.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Function(_) => return None,
        })
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl<E> Clone for Value<E> {
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Number(n) => Value::Number(*n),
            Value::Str(s) => Value::Str(s.clone()),
            Value::List(items) => Value::List(items.clone()),
            Value::Object(pairs) => Value::Object(pairs.clone()),
            Value::Function(f) => Value::Function(Arc::clone(f)),
        }
    }
}

impl<E> PartialEq for Value<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<E> fmt::Debug for Value<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(pairs) => f.debug_tuple("Object").field(pairs).finish(),
            Value::Function(_) => write!(f, "Function(..)"),
        }
    }
}

impl<E> fmt::Display for Value<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_json(*n)),
            Value::Str(s) => write!(f, "{}", serde_json::Value::String(s.clone())),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", serde_json::Value::String(key.clone()), value)?;
                }
                write!(f, "}}")
            }
            Value::Function(_) => write!(f, "<function>"),
        }
    }
}

impl<E> Default for Value<E> {
    fn default() -> Self {
        Value::Null
    }
}

impl<E> From<bool> for Value<E> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<E> From<f64> for Value<E> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<E> From<i64> for Value<E> {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl<E> From<i32> for Value<E> {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl<E> From<usize> for Value<E> {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl<E> From<String> for Value<E> {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<E> From<&str> for Value<E> {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl<E> From<()> for Value<E> {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<E> From<serde_json::Value> for Value<E> {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

impl<E, T: Into<Value<E>>> From<Option<T>> for Value<E> {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<E, T: Into<Value<E>>> From<Vec<T>> for Value<E> {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// A value had the wrong type for the requested conversion.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected}, got {got}")]
pub struct TypeError {
    pub expected: &'static str,
    pub got: &'static str,
}

impl TypeError {
    pub fn new<E>(expected: &'static str, got: &Value<E>) -> Self {
        Self {
            expected,
            got: got.type_name(),
        }
    }
}

/// Conversion out of an evaluated [`Value`], used by typed argument access.
pub trait FromValue<E>: Sized {
    /// The type name reported in argument errors.
    const EXPECTED: &'static str;

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError>;
}

impl<E> FromValue<E> for Value<E> {
    const EXPECTED: &'static str = "any";

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        Ok(value)
    }
}

impl<E> FromValue<E> for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        value
            .as_f64()
            .ok_or_else(|| TypeError::new(<Self as FromValue<E>>::EXPECTED, &value))
    }
}

impl<E> FromValue<E> for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        match value {
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => Ok(n as i64),
            other => Err(TypeError::new(<Self as FromValue<E>>::EXPECTED, &other)),
        }
    }
}

impl<E> FromValue<E> for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        value
            .as_bool()
            .ok_or_else(|| TypeError::new(<Self as FromValue<E>>::EXPECTED, &value))
    }
}

impl<E> FromValue<E> for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(TypeError::new(<Self as FromValue<E>>::EXPECTED, &other)),
        }
    }
}

impl<E, T: FromValue<E>> FromValue<E> for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<E, T: FromValue<E>> FromValue<E> for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(TypeError::new(<Self as FromValue<E>>::EXPECTED, &other)),
        }
    }
}

impl<E> FromValue<E> for serde_json::Value {
    const EXPECTED: &'static str = "json";

    fn from_value(value: Value<E>) -> std::result::Result<Self, TypeError> {
        value.to_json().ok_or(TypeError {
            expected: <Self as FromValue<E>>::EXPECTED,
            got: "function",
        })
    }
}
