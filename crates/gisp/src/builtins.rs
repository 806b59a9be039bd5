//! Reference boxes built on the public native contract.
//!
//! None of these are installed by default; compose the ones a host wants:
//!
//! ```
//! use gisp::{builtins, Context, Sandbox, Value};
//! use serde_json::json;
//!
//! let sandbox: Sandbox = Sandbox::compose([builtins::arithmetic(), builtins::logic()]);
//! let mut ctx = Context::new(sandbox);
//!
//! let out = ctx.run(&json!(["if", ["+", 1, -1], "yes", "no"])).unwrap();
//! assert_eq!(out, Value::from("no"));
//! ```

use crate::context::Call;
use crate::error::Result;
use crate::native::NativeInfo;
use crate::sandbox::Sandbox;
use crate::value::Value;

/// `+ - * /` over any number of operands.
pub fn arithmetic<E: 'static>() -> Sandbox<E> {
    let mut sandbox = Sandbox::new();
    sandbox.register_native(
        NativeInfo::new("+", "Sum of the operands.").returns("number"),
        |call| fold_numbers(call, 0.0, |a, b| Ok(a + b)),
    );
    sandbox.register_native(
        NativeInfo::new("*", "Product of the operands.").returns("number"),
        |call| fold_numbers(call, 1.0, |a, b| Ok(a * b)),
    );
    sandbox.register_native(
        NativeInfo::new("-", "Negate one operand or subtract the rest from the first.")
            .arg("x", "number", "")
            .returns("number"),
        |call| {
            let first = call.arg_num(1)?;
            if call.arg_count() == 1 {
                return Ok(Value::Number(-first));
            }
            fold_from(call, first, |a, b| Ok(a - b))
        },
    );
    sandbox.register_native(
        NativeInfo::new("/", "Divide the first operand by the rest.")
            .arg("x", "number", "")
            .returns("number"),
        |call| {
            let first = call.arg_num(1)?;
            fold_from(call, first, |a, b| {
                if b == 0.0 {
                    Err("division by zero")
                } else {
                    Ok(a / b)
                }
            })
        },
    );
    sandbox
}

fn fold_numbers<E>(
    call: &mut Call<'_, E>,
    init: f64,
    op: impl Fn(f64, f64) -> std::result::Result<f64, &'static str>,
) -> Result<Value<E>> {
    let mut acc = init;
    for i in 1..=call.arg_count() {
        let n = call.arg_num(i)?;
        acc = op(acc, n).map_err(|msg| call.error(msg))?;
    }
    Ok(Value::Number(acc))
}

fn fold_from<E>(
    call: &mut Call<'_, E>,
    first: f64,
    op: impl Fn(f64, f64) -> std::result::Result<f64, &'static str>,
) -> Result<Value<E>> {
    let mut acc = first;
    for i in 2..=call.arg_count() {
        let n = call.arg_num(i)?;
        acc = op(acc, n).map_err(|msg| call.error(msg))?;
    }
    Ok(Value::Number(acc))
}

/// `== !=` on any values, `< <= > >=` on numbers.
pub fn comparison<E: 'static>() -> Sandbox<E> {
    let mut sandbox = Sandbox::new();
    sandbox.register_fn("==", |call| Ok(Value::Bool(call.arg(1)? == call.arg(2)?)));
    sandbox.register_fn("!=", |call| Ok(Value::Bool(call.arg(1)? != call.arg(2)?)));
    sandbox.register_fn("<", |call| compare(call, |a, b| a < b));
    sandbox.register_fn("<=", |call| compare(call, |a, b| a <= b));
    sandbox.register_fn(">", |call| compare(call, |a, b| a > b));
    sandbox.register_fn(">=", |call| compare(call, |a, b| a >= b));
    sandbox
}

fn compare<E>(call: &mut Call<'_, E>, op: impl Fn(f64, f64) -> bool) -> Result<Value<E>> {
    let a = call.arg_num(1)?;
    let b = call.arg_num(2)?;
    Ok(Value::Bool(op(a, b)))
}

/// Short-circuiting control forms: `if`, `and`, `or`, `not`, `do`.
///
/// Branches that are not taken are never evaluated.
pub fn logic<E: 'static>() -> Sandbox<E> {
    let mut sandbox = Sandbox::new();
    sandbox.register_native(
        NativeInfo::new("if", "Evaluate `then` when `cond` is truthy, else `else`.")
            .arg("cond", "any", "")
            .arg("then", "any", "")
            .arg_opt("else", "any", "")
            .returns("any"),
        |call| {
            if call.arg(1)?.is_truthy() {
                call.arg(2)
            } else {
                Ok(call.arg_opt(3)?.unwrap_or_default())
            }
        },
    );
    sandbox.register_fn("and", |call| {
        let mut last = Value::Bool(true);
        for i in 1..=call.arg_count() {
            last = call.arg(i)?;
            if !last.is_truthy() {
                break;
            }
        }
        Ok(last)
    });
    sandbox.register_fn("or", |call| {
        let mut last = Value::Bool(false);
        for i in 1..=call.arg_count() {
            last = call.arg(i)?;
            if last.is_truthy() {
                break;
            }
        }
        Ok(last)
    });
    sandbox.register_fn("not", |call| Ok(Value::Bool(!call.arg(1)?.is_truthy())));
    sandbox.register_fn("do", |call| {
        Ok(call.args()?.pop().unwrap_or_default())
    });
    sandbox
}

/// `concat` and `len`.
pub fn strings<E: 'static>() -> Sandbox<E> {
    let mut sandbox = Sandbox::new();
    sandbox.register_native(
        NativeInfo::new("concat", "Join the operands as text.").returns("string"),
        |call| {
            let mut out = String::new();
            for value in call.args()? {
                match value {
                    Value::Str(s) => out.push_str(&s),
                    other => out.push_str(&other.to_string()),
                }
            }
            Ok(Value::Str(out))
        },
    );
    sandbox.register_native(
        NativeInfo::new("len", "Length of a string, list or object.")
            .arg("x", "any", "")
            .returns("number"),
        |call| match call.arg(1)? {
            Value::Str(s) => Ok(Value::from(s.chars().count())),
            Value::List(items) => Ok(Value::from(items.len())),
            Value::Object(pairs) => Ok(Value::from(pairs.len())),
            other => Err(call.error(format!("len of {}", other.type_name()))),
        },
    );
    sandbox
}

/// Every reference box.
pub fn std_box<E: 'static>() -> Sandbox<E> {
    Sandbox::compose([arithmetic(), comparison(), logic(), strings()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use pretty_assertions::assert_eq;
    use serde_json::{Value as Json, json};

    fn eval(ast: Json) -> Result<Value> {
        Context::new(std_box()).run(&ast)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval(json!(["+", 1, ["*", 2, 2]])).unwrap(), Value::Number(5.0));
        assert_eq!(eval(json!(["+"])).unwrap(), Value::Number(0.0));
        assert_eq!(eval(json!(["-", 3])).unwrap(), Value::Number(-3.0));
        assert_eq!(eval(json!(["-", 10, 3, 2])).unwrap(), Value::Number(5.0));
        assert_eq!(eval(json!(["/", 9, 3])).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_division_by_zero_is_a_native_error() {
        let err = eval(json!(["/", 1, ["-", 2, 2]])).unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
        assert_eq!(err.stack.to_string(), "/ 0");
    }

    #[test]
    fn test_if_skips_untaken_branch() {
        assert_eq!(
            eval(json!(["if", ["<", 1, 2], "small", ["undefined"]])).unwrap(),
            Value::from("small")
        );
        assert_eq!(eval(json!(["if", false, ["undefined"]])).unwrap(), Value::Null);
    }

    #[test]
    fn test_and_or_short_circuit() {
        assert_eq!(eval(json!(["and", 1, 0, ["undefined"]])).unwrap(), Value::Number(0.0));
        assert_eq!(eval(json!(["or", null, "x", ["undefined"]])).unwrap(), Value::from("x"));
        assert_eq!(eval(json!(["not", ["==", "a", "a"]])).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            eval(json!(["concat", "n=", ["+", 1, 1], true])).unwrap(),
            Value::from("n=2true")
        );
        assert_eq!(eval(json!(["len", "héllo"])).unwrap(), Value::Number(5.0));
        assert_eq!(eval(json!(["len", 3])).unwrap_err().to_string(), "len of number");
    }

    #[test]
    fn test_documented_natives() {
        let sandbox: Sandbox = std_box();
        let doc = sandbox.describe();
        assert!(doc.contains("if(cond: any, then: any, else?: any) -> any"));
        assert!(doc.contains("+() -> number"));
    }
}
