use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Call;
use crate::error::Result;
use crate::native::{Native, NativeInfo};
use crate::value::{NativeFn, Value};

/// What a name in the sandbox resolves to.
pub enum Binding<E = ()> {
    /// A plain value, returned as-is without touching the call's arguments.
    Value(Value<E>),
    /// A native function invoked with a handle to its arguments.
    Callable(NativeFn<E>),
}

impl<E> Binding<E> {
    pub fn is_callable(&self) -> bool {
        matches!(self, Binding::Callable(_))
    }
}

impl<E> Clone for Binding<E> {
    fn clone(&self) -> Self {
        match self {
            Binding::Value(v) => Binding::Value(v.clone()),
            Binding::Callable(f) => Binding::Callable(Arc::clone(f)),
        }
    }
}

impl<E> From<Value<E>> for Binding<E> {
    fn from(value: Value<E>) -> Self {
        match value {
            Value::Function(f) => Binding::Callable(f),
            other => Binding::Value(other),
        }
    }
}

/// The capability set a script runs against: a mapping from names to
/// values and native functions.
///
/// A sandbox is immutable while a run uses it and cheap to clone, so one
/// instance can back any number of contexts, including contexts on other
/// threads. Several partial sandboxes ("boxes") built by independent
/// libraries are merged with [`Sandbox::compose`].
///
/// # Example
///
/// ```
/// use gisp::{Context, Sandbox, Value};
/// use serde_json::json;
///
/// let sandbox: Sandbox = Sandbox::new()
///     .with_fn("+", |call| Ok(Value::Number(call.arg_num(1)? + call.arg_num(2)?)))
///     .with_value("answer", 42.0);
///
/// let mut ctx = Context::new(sandbox);
/// assert_eq!(ctx.run(&json!(["+", ["answer"], 1])).unwrap(), Value::Number(43.0));
/// ```
pub struct Sandbox<E = ()> {
    bindings: Arc<HashMap<String, Binding<E>>>,
    infos: Vec<NativeInfo>,
}

impl<E> Sandbox<E> {
    /// Create an empty sandbox.
    pub fn new() -> Self {
        Self {
            bindings: Arc::new(HashMap::new()),
            infos: Vec::new(),
        }
    }

    /// Resolve a name.
    pub fn get(&self, name: &str) -> Option<&Binding<E>> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// All bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Bind a name, returning the binding it replaces.
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding<E>) -> Option<Binding<E>> {
        let name = name.into();
        self.infos.retain(|info| info.name != name);
        Arc::make_mut(&mut self.bindings).insert(name, binding)
    }

    /// Bind a name to a plain value.
    ///
    /// Function values are stored as callables.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value<E>>) {
        self.insert(name, value.into().into());
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value<E>>) -> Self {
        self.set_value(name, value);
        self
    }

    /// Merge `other` into this sandbox. Names bound in both resolve to
    /// `other`'s binding.
    pub fn merge(mut self, other: Sandbox<E>) -> Self {
        if self.bindings.is_empty() {
            return other;
        }
        let bindings = Arc::make_mut(&mut self.bindings);
        for (name, binding) in other.bindings.iter() {
            bindings.insert(name.clone(), binding.clone());
        }
        self.infos
            .retain(|info| !other.bindings.contains_key(&info.name));
        self.infos.extend(other.infos);
        self
    }

    /// Compose boxes left to right; later boxes override earlier ones.
    ///
    /// # Example
    ///
    /// ```
    /// use gisp::{Binding, Sandbox, Value};
    ///
    /// let base: Sandbox = Sandbox::new().with_value("n", 1.0).with_value("a", "kept");
    /// let patch: Sandbox = Sandbox::new().with_value("n", 2.0);
    ///
    /// let sandbox = Sandbox::compose([base, patch]);
    /// assert!(matches!(sandbox.get("n"), Some(Binding::Value(Value::Number(n))) if *n == 2.0));
    /// assert!(sandbox.contains("a"));
    /// ```
    pub fn compose<I>(boxes: I) -> Self
    where
        I: IntoIterator<Item = Sandbox<E>>,
    {
        boxes
            .into_iter()
            .fold(Sandbox::new(), |acc, next| acc.merge(next))
    }

    /// Metadata of natives registered through [`Sandbox::register_native`]
    /// or [`Sandbox::register`].
    pub fn infos(&self) -> &[NativeInfo] {
        &self.infos
    }

    /// One signature line per documented native, in registration order.
    pub fn describe(&self) -> String {
        crate::native::describe(&self.infos)
    }
}

impl<E: 'static> Sandbox<E> {
    /// Register a native function.
    ///
    /// The function receives a [`Call`] handle and pulls the arguments it
    /// needs; arguments it never asks for are never evaluated.
    ///
    /// # Example
    ///
    /// ```
    /// use gisp::{Context, Sandbox, Value};
    /// use serde_json::json;
    ///
    /// let mut sandbox: Sandbox = Sandbox::new();
    /// sandbox.register_fn("first", |call| call.arg(1));
    ///
    /// // The second argument names nothing, but is never evaluated.
    /// let mut ctx = Context::new(sandbox);
    /// let out = ctx.run(&json!(["first", "a", ["missing"]])).unwrap();
    /// assert_eq!(out, Value::from("a"));
    /// ```
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut Call<'_, E>) -> Result<Value<E>> + Send + Sync + 'static,
    {
        self.insert(name, Binding::Callable(Arc::new(f)));
    }

    pub fn with_fn<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Call<'_, E>) -> Result<Value<E>> + Send + Sync + 'static,
    {
        self.register_fn(name, f);
        self
    }

    /// Register a native function along with its metadata.
    pub fn register_native<F>(&mut self, info: NativeInfo, f: F)
    where
        F: Fn(&mut Call<'_, E>) -> Result<Value<E>> + Send + Sync + 'static,
    {
        self.insert(info.name.clone(), Binding::Callable(Arc::new(f)));
        self.infos.push(info);
    }

    /// Register a native defined with the `#[native]` attribute.
    ///
    /// ```ignore
    /// #[native]
    /// fn add(a: f64, b: f64) -> f64 { a + b }
    ///
    /// sandbox.register(add::Native);
    /// ```
    pub fn register<T: Native + 'static>(&mut self, _: T) {
        self.register_native(T::info().clone(), |call| T::call(call));
    }
}

impl<E> Clone for Sandbox<E> {
    fn clone(&self) -> Self {
        Self {
            bindings: Arc::clone(&self.bindings),
            infos: self.infos.clone(),
        }
    }
}

impl<E> Default for Sandbox<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Sandbox<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("names", &self.names())
            .finish()
    }
}
