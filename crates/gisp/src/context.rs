//! Run-scoped state and the argument handle given to native callables.

use std::sync::Arc;

use serde_json::Value as Json;

use crate::error::{Error, ErrorKind, Result};
use crate::sandbox::Sandbox;
use crate::stack::{Frame, Stack};
use crate::value::{FromValue, Value};

/// Instrumentation hook run around every node.
pub type Hook<E> = Arc<dyn Fn(&mut Visit<'_, E>, &Json) + Send + Sync>;

/// What a hook sees of the run: the host environment and the active calls.
///
/// The sandbox and the call stack stay out of reach, so a hook cannot
/// start another run or rebind names in the middle of the current one.
pub struct Visit<'a, E> {
    env: &'a mut E,
    frames: &'a [Frame],
}

impl<E> Visit<'_, E> {
    pub fn env(&self) -> &E {
        &*self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut *self.env
    }

    /// Nesting depth of the node being visited (0 at the root).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Snapshot of the active calls, innermost first.
    pub fn stack(&self) -> Stack {
        Stack::capture(self.frames)
    }
}

/// State for evaluating scripts against a sandbox.
///
/// A context owns the host environment `E`, which natives and hooks can
/// read and modify, and the call stack of the run in progress. It can be
/// reused for any number of sequential runs but must not be shared between
/// concurrent ones; give each thread its own context over a cloned
/// [`Sandbox`].
///
/// # Example
///
/// ```
/// use gisp::{Context, Sandbox, Value};
/// use serde_json::json;
///
/// // Count evaluated nodes in the environment.
/// let sandbox: Sandbox<usize> = Sandbox::new()
///     .with_fn("inc", |call| Ok(Value::Number(call.arg_num(1)? + 1.0)));
/// let mut ctx = Context::with_env(sandbox, 0usize)
///     .with_pre_run(|visit, _node| *visit.env_mut() += 1);
///
/// assert_eq!(ctx.run(&json!(["inc", ["inc", 1]])).unwrap(), Value::Number(3.0));
/// assert_eq!(*ctx.env(), 3);
/// ```
pub struct Context<E = ()> {
    sandbox: Sandbox<E>,
    env: E,
    pre_run: Option<Hook<E>>,
    post_run: Option<Hook<E>>,
    lift_panic: bool,
    /// Active frames, outermost first.
    pub(crate) frames: Vec<Frame>,
}

impl<E: Default> Context<E> {
    pub fn new(sandbox: Sandbox<E>) -> Self {
        Self::with_env(sandbox, E::default())
    }
}

impl<E> Context<E> {
    /// Create a context carrying a host environment.
    pub fn with_env(sandbox: Sandbox<E>, env: E) -> Self {
        Self {
            sandbox,
            env,
            pre_run: None,
            post_run: None,
            lift_panic: false,
            frames: Vec::new(),
        }
    }

    /// Catch panics raised by natives and return them as
    /// [`ErrorKind::Panic`] instead of unwinding into the host.
    pub fn with_lift_panic(mut self, lift: bool) -> Self {
        self.lift_panic = lift;
        self
    }

    /// Run `hook` before every node is evaluated.
    pub fn with_pre_run<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Visit<'_, E>, &Json) + Send + Sync + 'static,
    {
        self.pre_run = Some(Arc::new(hook));
        self
    }

    /// Run `hook` after every node evaluated successfully.
    pub fn with_post_run<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Visit<'_, E>, &Json) + Send + Sync + 'static,
    {
        self.post_run = Some(Arc::new(hook));
        self
    }

    pub fn set_lift_panic(&mut self, lift: bool) {
        self.lift_panic = lift;
    }

    pub fn lift_panic(&self) -> bool {
        self.lift_panic
    }

    pub fn sandbox(&self) -> &Sandbox<E> {
        &self.sandbox
    }

    /// Swap the sandbox for subsequent runs.
    pub fn set_sandbox(&mut self, sandbox: Sandbox<E>) {
        self.sandbox = sandbox;
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn into_env(self) -> E {
        self.env
    }

    /// Current nesting depth (0 outside any call).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Snapshot of the active calls, innermost first.
    pub fn stack(&self) -> Stack {
        Stack::capture(&self.frames)
    }

    pub(crate) fn fail(&self, kind: ErrorKind) -> Error {
        Error::new(kind).with_stack(self.stack())
    }

    pub(crate) fn pre_run(&mut self, node: &Json) {
        if let Some(hook) = &self.pre_run {
            hook(&mut Visit { env: &mut self.env, frames: &self.frames }, node);
        }
    }

    pub(crate) fn post_run(&mut self, node: &Json) {
        if let Some(hook) = &self.post_run {
            hook(&mut Visit { env: &mut self.env, frames: &self.frames }, node);
        }
    }
}

/// Handle given to a native callable for the duration of one call.
///
/// Arguments are the elements after the head of the call array, numbered
/// from 1. Nothing is evaluated until the native asks for it, and every
/// request evaluates the sub-expression again: an argument read twice runs
/// its side effects twice.
pub struct Call<'a, E = ()> {
    ctx: &'a mut Context<E>,
    node: &'a [Json],
}

impl<'a, E> Call<'a, E> {
    pub(crate) fn new(ctx: &'a mut Context<E>, node: &'a [Json]) -> Self {
        Self { ctx, node }
    }

    /// Number of argument expressions, evaluated or not.
    pub fn arg_count(&self) -> usize {
        self.node.len().saturating_sub(1)
    }

    /// The unevaluated `i`-th argument expression.
    pub fn raw_arg(&self, i: usize) -> Option<&'a Json> {
        if i == 0 {
            return None;
        }
        self.node.get(i)
    }

    /// Evaluate the `i`-th argument.
    pub fn arg(&mut self, i: usize) -> Result<Value<E>> {
        let node = self.raw_arg(i).ok_or_else(|| self.missing(i))?;
        self.ctx.eval_node(node, i)
    }

    /// Evaluate the `i`-th argument, or `None` when the call has fewer
    /// arguments.
    pub fn arg_opt(&mut self, i: usize) -> Result<Option<Value<E>>> {
        match self.raw_arg(i) {
            Some(node) => self.ctx.eval_node(node, i).map(Some),
            None => Ok(None),
        }
    }

    /// Evaluate the `i`-th argument and convert it.
    pub fn arg_as<T: FromValue<E>>(&mut self, i: usize) -> Result<T> {
        let value = self.arg(i)?;
        self.convert(i, value)
    }

    /// Like [`Call::arg_as`] but an absent argument converts to `None`.
    pub fn arg_opt_as<T: FromValue<E>>(&mut self, i: usize) -> Result<Option<T>> {
        match self.arg_opt(i)? {
            Some(value) => self.convert(i, value).map(Some),
            None => Ok(None),
        }
    }

    pub fn arg_num(&mut self, i: usize) -> Result<f64> {
        self.arg_as(i)
    }

    pub fn arg_str(&mut self, i: usize) -> Result<String> {
        self.arg_as(i)
    }

    pub fn arg_bool(&mut self, i: usize) -> Result<bool> {
        self.arg_as(i)
    }

    /// Evaluate every argument, left to right.
    pub fn args(&mut self) -> Result<Vec<Value<E>>> {
        (1..=self.arg_count()).map(|i| self.arg(i)).collect()
    }

    /// Label of the call being served.
    pub fn name(&self) -> &str {
        self.ctx.frames.last().map_or("", |frame| frame.label.as_str())
    }

    pub fn env(&self) -> &E {
        self.ctx.env()
    }

    pub fn env_mut(&mut self) -> &mut E {
        self.ctx.env_mut()
    }

    pub fn context(&self) -> &Context<E> {
        &*self.ctx
    }

    /// Build a failure carrying the current stack.
    pub fn error(&self, message: impl std::fmt::Display) -> Error {
        self.ctx.fail(ErrorKind::Native(message.to_string()))
    }

    fn convert<T: FromValue<E>>(&self, i: usize, value: Value<E>) -> Result<T> {
        T::from_value(value).map_err(|error| {
            self.ctx.fail(ErrorKind::ArgumentType {
                call: self.name().to_string(),
                index: i,
                error,
            })
        })
    }

    fn missing(&self, i: usize) -> Error {
        self.ctx.fail(ErrorKind::MissingArgument {
            call: self.name().to_string(),
            index: i,
        })
    }
}
