//! The tree-walking evaluator.
//!
//! The decoded JSON value is the syntax tree: an array is a call whose first
//! element names (or computes) the function, anything else is a literal.
//! Natives pull their arguments through [`Call`], so argument evaluation is
//! lazy and driven entirely by the callee.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value as Json;
use tracing::{debug, trace};

use crate::context::{Call, Context};
use crate::error::{Error, ErrorKind, Result};
use crate::sandbox::Binding;
use crate::stack::Frame;
use crate::value::{NativeFn, Value};

impl<E> Context<E> {
    /// Evaluate `ast` against this context's sandbox.
    ///
    /// Failures are returned with the stack captured where they happened.
    /// A panic inside a native unwinds into the caller unless
    /// [`Context::with_lift_panic`] is set, in which case it is returned as
    /// [`ErrorKind::Panic`].
    pub fn run(&mut self, ast: &Json) -> Result<Value<E>> {
        self.frames.clear();

        let result = if self.lift_panic() {
            match panic::catch_unwind(AssertUnwindSafe(|| self.eval_node(ast, 0))) {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    debug!(%message, stack = %self.stack(), "lifted panic");
                    Err(self.fail(ErrorKind::Panic(message)))
                }
            }
        } else {
            self.eval_node(ast, 0)
        };

        self.frames.clear();
        if let Err(err) = &result {
            debug!(error = %err, stack = %err.stack, "run failed");
        }
        result
    }

    /// Decode `text` as JSON and run it.
    pub fn run_json(&mut self, text: &str) -> Result<Value<E>> {
        let ast: Json = serde_json::from_str(text)?;
        self.run(&ast)
    }

    /// Evaluate one node. `index` is the node's position in its parent call.
    pub(crate) fn eval_node(&mut self, node: &Json, index: usize) -> Result<Value<E>> {
        self.pre_run(node);
        let value = match node {
            Json::Array(items) => self.eval_call(items, index)?,
            literal => Value::from_json(literal),
        };
        self.post_run(node);
        Ok(value)
    }

    fn eval_call(&mut self, items: &[Json], index: usize) -> Result<Value<E>> {
        let Some(head) = items.first() else {
            return Ok(Value::Null);
        };
        let depth = self.depth() + 1;

        match head {
            Json::String(name) => {
                self.frames.push(Frame::new(name.as_str(), index, depth));
                let result = match self.sandbox().get(name).cloned() {
                    Some(Binding::Callable(f)) => self.invoke(&f, items),
                    // A plain binding ignores the rest of the array.
                    Some(Binding::Value(value)) => Ok(value),
                    None => Err(self.fail(ErrorKind::UndefinedName(name.clone()))),
                };
                self.frames.pop();
                result
            }
            computed => {
                let callee = self.eval_node(computed, 0)?;
                let label = computed.to_string();
                self.frames.push(Frame::new(label.as_str(), index, depth));
                let result = match callee {
                    Value::Function(f) => self.invoke(&f, items),
                    _ => Err(self.fail(ErrorKind::UndefinedComputedHead(label))),
                };
                self.frames.pop();
                result
            }
        }
    }

    fn invoke(&mut self, f: &NativeFn<E>, items: &[Json]) -> Result<Value<E>> {
        if let Some(frame) = self.frames.last() {
            trace!(call = %frame.label, depth = frame.depth, args = items.len() - 1, "dispatch");
        }

        let result = f(&mut Call::new(self, items));
        result.map_err(|err| self.stamp(err))
    }

    /// Attach the current stack to an error raised by native code.
    fn stamp(&self, err: Error) -> Error {
        if err.stack.is_empty() {
            err.with_stack(self.stack())
        } else {
            err
        }
    }
}

/// Evaluate `ast` with `ctx`.
pub fn run<E>(ctx: &mut Context<E>, ast: &Json) -> Result<Value<E>> {
    ctx.run(ast)
}

/// Decode `text` and evaluate it with `ctx`.
///
/// # Example
///
/// ```
/// use gisp::{Context, Sandbox, Value};
///
/// let sandbox: Sandbox = Sandbox::new().with_fn("*", |call| {
///     Ok(Value::Number(call.arg_num(1)? * call.arg_num(2)?))
/// });
/// let mut ctx = Context::new(sandbox);
///
/// let out = gisp::run_json(r#"["*", ["*", 2, 5], ["*", 9, 3]]"#, &mut ctx).unwrap();
/// assert_eq!(out, Value::Number(270.0));
/// ```
pub fn run_json<E>(text: &str, ctx: &mut Context<E>) -> Result<Value<E>> {
    ctx.run_json(text)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
