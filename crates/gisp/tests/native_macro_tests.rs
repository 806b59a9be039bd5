//! Tests for the #[native] proc macro.

use gisp::{Context, ErrorKind, Native as _, Sandbox, Value};
use gisp_macros::native;
use pretty_assertions::assert_eq;

/// Add two numbers together.
///
/// Args:
///     a: First number
///     b: Second number
#[native]
fn add(a: f64, b: f64) -> f64 {
    a + b
}

/// Greet a person.
///
/// Args:
///     name: The person's name
///     prefix: Optional greeting,
///         defaults to Hello
#[native]
fn greet(name: String, prefix: Option<String>) -> String {
    let p = prefix.unwrap_or_else(|| "Hello".to_string());
    format!("{}, {}!", p, name)
}

#[native(name = "int/div", description = "Integer division.")]
fn div(a: i64, b: i64) -> Result<i64, String> {
    if b == 0 {
        return Err("division by zero".to_string());
    }
    Ok(a / b)
}

#[native]
fn lengths(items: Vec<String>) -> Vec<i64> {
    items.iter().map(|s| s.len() as i64).collect()
}

fn sandbox() -> Sandbox {
    let mut sandbox = Sandbox::new();
    sandbox.register(add::Native);
    sandbox.register(greet::Native);
    sandbox.register(div::Native);
    sandbox.register(lengths::Native);
    sandbox
}

#[test]
fn test_native_info_generated() {
    assert_eq!(add::INFO.name, "add");
    assert_eq!(add::INFO.description, "Add two numbers together.");
    assert_eq!(add::INFO.args.len(), 2);
    assert_eq!(add::INFO.args[0].name, "a");
    assert_eq!(add::INFO.args[0].ty, "number");
    assert_eq!(add::INFO.args[0].description, "First number");
    assert!(add::INFO.args[0].required);
    assert_eq!(add::INFO.returns, "number");
    assert_eq!(add::Native::info().signature(), "add(a: number, b: number) -> number");
}

#[test]
fn test_optional_arg_info() {
    assert_eq!(greet::INFO.args[1].name, "prefix");
    assert!(!greet::INFO.args[1].required);
    assert_eq!(greet::INFO.args[1].ty, "string");
    assert_eq!(greet::INFO.args[1].description, "Optional greeting, defaults to Hello");
}

#[test]
fn test_attribute_overrides() {
    assert_eq!(div::INFO.name, "int/div");
    assert_eq!(div::INFO.description, "Integer division.");
    assert_eq!(div::INFO.returns, "any");
}

#[test]
fn test_registered_natives_run() {
    let mut ctx = Context::new(sandbox());

    assert_eq!(ctx.run_json(r#"["add", 1, ["add", 2, 3]]"#).unwrap(), Value::Number(6.0));
    assert_eq!(
        ctx.run_json(r#"["greet", "Alice"]"#).unwrap(),
        Value::from("Hello, Alice!")
    );
    assert_eq!(
        ctx.run_json(r#"["greet", "Bob", "Hi"]"#).unwrap(),
        Value::from("Hi, Bob!")
    );
    assert_eq!(
        ctx.run_json(r#"["greet", "Bob", null]"#).unwrap(),
        Value::from("Hello, Bob!")
    );
    assert_eq!(ctx.run_json(r#"["int/div", 7, 2]"#).unwrap(), Value::Number(3.0));
}

#[test]
fn test_list_parameters_come_from_natives() {
    let mut sandbox = sandbox();
    sandbox.register_fn("words", |_| Ok(Value::from(vec!["a", "bcd"])));
    let mut ctx = Context::new(sandbox);

    assert_eq!(
        ctx.run_json(r#"["lengths", ["words"]]"#).unwrap(),
        Value::List(vec![Value::Number(1.0), Value::Number(3.0)])
    );
}

#[test]
fn test_type_errors_name_the_argument() {
    let mut ctx = Context::new(sandbox());

    let err = ctx.run_json(r#"["add", 1, "x"]"#).unwrap_err();
    assert_eq!(err.to_string(), "add: argument 2: expected number, got string");

    let err = ctx.run_json(r#"["int/div", 1.5, 1]"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ArgumentType { index: 1, .. }));
}

#[test]
fn test_result_errors_become_native_failures() {
    let mut ctx = Context::new(sandbox());

    let err = ctx.run_json(r#"["add", 1, ["int/div", 1, 0]]"#).unwrap_err();
    assert_eq!(err.to_string(), "division by zero");
    assert_eq!(err.stack().to_string(), "int/div 2 add 0");
}

#[test]
fn test_describe_lists_registered_natives() {
    let docs = sandbox().describe();
    assert!(docs.contains("add(a: number, b: number) -> number"));
    assert!(docs.contains("greet(name: string, prefix?: string) -> string"));
    assert!(docs.contains("    prefix: Optional greeting, defaults to Hello"));
}
