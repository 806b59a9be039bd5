//! Metadata for native functions and the trait implemented by `#[native]`.

use std::fmt;

use crate::context::Call;
use crate::error::Result;
use crate::value::Value;

/// A native function with static metadata.
///
/// Implemented by the unit struct the `#[native]` macro generates, so a
/// host can write `sandbox.register(add::Native)`.
pub trait Native {
    fn info() -> &'static NativeInfo;

    fn call<E>(call: &mut Call<'_, E>) -> Result<Value<E>>;
}

/// Information about one argument of a native.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgInfo {
    pub name: String,
    /// Type name as reported in argument errors (`number`, `string`, ...).
    pub ty: String,
    pub description: String,
    /// Whether the argument must be present in the call.
    pub required: bool,
}

impl ArgInfo {
    pub fn required(
        name: impl Into<String>,
        ty: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        ty: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty, description)
        }
    }
}

/// Describes a native function for hosts that document their capability
/// set.
///
/// # Example
///
/// ```
/// use gisp::NativeInfo;
///
/// let info = NativeInfo::new("clamp", "Clamp a number into a range.")
///     .arg("x", "number", "The value")
///     .arg("lo", "number", "Lower bound")
///     .arg_opt("hi", "number", "Upper bound")
///     .returns("number");
///
/// assert_eq!(info.signature(), "clamp(x: number, lo: number, hi?: number) -> number");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NativeInfo {
    pub name: String,
    pub description: String,
    pub args: Vec<ArgInfo>,
    pub returns: String,
}

impl NativeInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args: Vec::new(),
            returns: "null".to_string(),
        }
    }

    /// Add a required argument.
    pub fn arg(
        mut self,
        name: impl Into<String>,
        ty: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.args.push(ArgInfo::required(name, ty, description));
        self
    }

    /// Add an optional argument.
    pub fn arg_opt(
        mut self,
        name: impl Into<String>,
        ty: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.args.push(ArgInfo::optional(name, ty, description));
        self
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.returns = ty.into();
        self
    }

    pub fn signature(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.required {
                    format!("{}: {}", arg.name, arg.ty)
                } else {
                    format!("{}?: {}", arg.name, arg.ty)
                }
            })
            .collect();

        format!("{}({}) -> {}", self.name, args.join(", "), self.returns)
    }

    /// Signature followed by the description and one line per argument.
    pub fn doc(&self) -> String {
        let mut doc = self.signature();
        if !self.description.is_empty() {
            doc.push_str(&format!("\n    {}", self.description));
        }
        for arg in self.args.iter().filter(|a| !a.description.is_empty()) {
            doc.push_str(&format!("\n    {}: {}", arg.name, arg.description));
        }
        doc
    }
}

impl fmt::Display for NativeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.doc())
    }
}

pub(crate) fn describe(infos: &[NativeInfo]) -> String {
    infos
        .iter()
        .map(NativeInfo::doc)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_no_args() {
        let info = NativeInfo::new("now", "Current time").returns("string");
        assert_eq!(info.signature(), "now() -> string");
    }

    #[test]
    fn test_doc_lists_described_args() {
        let info = NativeInfo::new("pow", "Raise to a power.")
            .arg("base", "number", "The base")
            .arg("exp", "number", "")
            .returns("number");

        assert_eq!(
            info.doc(),
            "pow(base: number, exp: number) -> number\n    Raise to a power.\n    base: The base"
        );
    }

    #[test]
    fn test_describe_joins_entries() {
        let infos = vec![
            NativeInfo::new("a", "").returns("null"),
            NativeInfo::new("b", "").returns("bool"),
        ];
        assert_eq!(describe(&infos), "a() -> null\n\nb() -> bool");
    }
}
