//! Gisp - a tiny sandboxed Lisp whose syntax tree is plain JSON
//!
//! Gisp evaluates small, data-driven expressions supplied as JSON. An array
//! is a function call, everything else is a literal. Scripts can only reach
//! what the host binds into a [`Sandbox`]: there is no file system, network,
//! or OS access unless a host function provides it.
//!
//! # Features
//!
//! - **JSON is the syntax**: any decoded `serde_json::Value` is a program
//! - **Capability sandbox**: names resolve to host values or native functions
//! - **Lazy arguments**: natives pull arguments on demand, so short-circuit
//!   forms like `if` are ordinary natives
//! - **Composable libraries**: independent boxes merge into one sandbox
//! - **Traceable failures**: errors carry the call stack where they happened,
//!   and panics in natives can be lifted into ordinary errors
//!
//! # Quick Start
//!
//! ```
//! use gisp::{Context, Sandbox, Value};
//!
//! let sandbox: Sandbox = Sandbox::new()
//!     .with_fn("+", |call| Ok(Value::Number(call.arg_num(1)? + call.arg_num(2)?)))
//!     .with_value("limit", 10.0);
//!
//! let mut ctx = Context::new(sandbox).with_lift_panic(true);
//! let out = ctx.run_json(r#"["+", ["limit"], 1.5]"#).unwrap();
//! assert_eq!(out, Value::Number(11.5));
//!
//! let err = ctx.run_json(r#"["nope"]"#).unwrap_err();
//! assert_eq!(err.to_string(), r#""nope" is undefined"#);
//! ```
//!
//! # Evaluation Rules
//!
//! - `null`, booleans, numbers, strings and objects evaluate to themselves
//! - `[]` evaluates to `null`
//! - `["name", a, b]` resolves `name` in the sandbox; a native is called with
//!   `a` and `b` unevaluated, a plain value is returned and the rest of the
//!   array ignored
//! - `[[...], a, b]` evaluates the head first; it must produce a function
//!
//! # Not Supported
//!
//! - Variables, lambdas or any syntax beyond calls and literals
//! - CPU or memory limits
//! - Sharing one [`Context`] between threads

pub mod builtins;
mod context;
mod error;
mod eval;
mod native;
mod sandbox;
mod stack;
mod value;

pub use context::{Call, Context, Hook, Visit};
pub use error::{Error, ErrorKind, Result};
pub use eval::{run, run_json};
pub use native::{ArgInfo, Native, NativeInfo};
pub use sandbox::{Binding, Sandbox};
pub use stack::{Frame, Stack};
pub use value::{FromValue, NativeFn, TypeError, Value};

// Re-export the macro when the macros feature is enabled
#[cfg(feature = "macros")]
pub use gisp_macros::native;
