//! Procedural macros for gisp.
//!
//! This crate provides the `#[native]` attribute macro for defining native
//! functions with typed parameters and generated metadata.
//!
//! # Example
//!
//! ```ignore
//! use gisp::{native, Sandbox};
//!
//! /// Clamp a number into a range.
//! ///
//! /// Args:
//! ///     x: The value to clamp
//! ///     lo: Lower bound
//! ///     hi: Upper bound
//! #[native]
//! fn clamp(x: f64, lo: f64, hi: Option<f64>) -> f64 {
//!     x.max(lo).min(hi.unwrap_or(f64::INFINITY))
//! }
//!
//! let mut sandbox: Sandbox = Sandbox::new();
//! sandbox.register(clamp::Native);
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use std::collections::HashMap;
use syn::{
    Attribute, Expr, FnArg, ItemFn, Lit, LitStr, Meta, Pat, PatType, ReturnType, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Parsed arguments for the #[native(...)] attribute
struct NativeArgs {
    name: Option<String>,
    description: Option<String>,
}

impl Parse for NativeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name = None;
        let mut description = None;

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let lit: LitStr = input.parse()?;

            if ident == "name" {
                name = Some(lit.value());
            } else if ident == "description" {
                description = Some(lit.value());
            } else {
                return Err(syn::Error::new(ident.span(), "expected `name` or `description`"));
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(NativeArgs { name, description })
    }
}

/// Parsed documentation from doc comments
struct ParsedDocs {
    description: String,
    args: HashMap<String, String>,
}

/// Split doc comments into a description and an `Args:` section.
///
/// ```text
/// /// Main description here.
/// ///
/// /// Args:
/// ///     param1: Description of param1
/// ```
fn parse_doc_comments(attrs: &[Attribute]) -> ParsedDocs {
    let mut lines: Vec<String> = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("doc")
            && let Meta::NameValue(meta) = &attr.meta
            && let Expr::Lit(expr_lit) = &meta.value
            && let Lit::Str(lit_str) = &expr_lit.lit
        {
            lines.push(lit_str.value());
        }
    }

    let mut description_lines: Vec<String> = Vec::new();
    let mut args: HashMap<String, String> = HashMap::new();
    let mut in_args_section = false;
    let mut current_arg: Option<(String, String)> = None;

    for line in lines {
        let trimmed = line.trim();

        if trimmed == "Args:" || trimmed == "Arguments:" {
            in_args_section = true;
            continue;
        }

        if !in_args_section {
            if !trimmed.is_empty() {
                description_lines.push(trimmed.to_string());
            }
            continue;
        }

        if let Some((name, desc)) = trimmed.split_once(':') {
            let name = name.trim();
            if !name.is_empty() && !name.contains(' ') {
                if let Some((prev, prev_desc)) = current_arg.take() {
                    args.insert(prev, prev_desc);
                }
                current_arg = Some((name.to_string(), desc.trim().to_string()));
                continue;
            }
        }

        // Continuation of the previous argument
        if let Some((_, ref mut desc)) = current_arg
            && !trimmed.is_empty()
        {
            desc.push(' ');
            desc.push_str(trimmed);
        }
    }

    if let Some((name, desc)) = current_arg {
        args.insert(name, desc);
    }

    ParsedDocs {
        description: description_lines.join(" "),
        args,
    }
}

fn type_string(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

/// Map a Rust type to the type name gisp reports.
fn gisp_type_name(ty: &Type) -> String {
    let ty_str = type_string(ty);
    let base = ty_str
        .strip_prefix("Option<")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(&ty_str);

    match base {
        "f64" => "number".to_string(),
        "i64" => "integer".to_string(),
        "bool" => "bool".to_string(),
        "String" => "string".to_string(),
        "()" => "null".to_string(),
        _ if base.starts_with("Vec<") => "list".to_string(),
        _ => "any".to_string(),
    }
}

fn is_option_type(ty: &Type) -> bool {
    type_string(ty).starts_with("Option<")
}

/// Whether the function returns `Result<..>` (any path ending in `Result`).
fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .is_some_and(|seg| seg.ident == "Result"),
            _ => false,
        },
    }
}

/// The `#[native]` attribute macro for defining gisp natives.
///
/// Each parameter is pulled from the call in declaration order and converted
/// with `gisp::FromValue`. `Option<T>` parameters may be left out of the
/// call. The return value is converted with `Into<gisp::Value>`; a function
/// returning `Result<T, Err>` reports `Err` as a native failure.
///
/// # Generated Code
///
/// A module named after the function containing:
/// - `INFO`: static `NativeInfo` with metadata
/// - `call`: `fn<E>(&mut gisp::Call<'_, E>) -> gisp::Result<gisp::Value<E>>`
/// - `Native`: unit struct implementing `gisp::Native`
///
/// # Attribute Arguments
///
/// - `name = "..."`: the name scripts call (defaults to the function name)
/// - `description = "..."`: overrides the doc comment description
#[proc_macro_attribute]
pub fn native(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as NativeArgs);
    let input_fn = parse_macro_input!(item as ItemFn);

    let parsed_docs = parse_doc_comments(&input_fn.attrs);
    let description = args
        .description
        .unwrap_or_else(|| parsed_docs.description.clone());

    let fn_name = &input_fn.sig.ident;
    let script_name = args.name.unwrap_or_else(|| fn_name.to_string());
    let mod_name = format_ident!("{}", fn_name);

    let mut arg_infos = Vec::new();
    let mut arg_names = Vec::new();
    let mut arg_pulls = Vec::new();

    for (i, arg) in input_fn.sig.inputs.iter().enumerate() {
        if let FnArg::Typed(PatType { pat, ty, .. }) = arg
            && let Pat::Ident(pat_ident) = pat.as_ref()
        {
            let arg_name = &pat_ident.ident;
            let arg_name_str = arg_name.to_string();
            let type_name = gisp_type_name(ty);
            let doc = parsed_docs
                .args
                .get(&arg_name_str)
                .cloned()
                .unwrap_or_default();
            let index = i + 1;

            arg_names.push(arg_name.clone());

            if is_option_type(ty) {
                arg_infos.push(quote! { .arg_opt(#arg_name_str, #type_name, #doc) });
                arg_pulls.push(quote! {
                    let #arg_name: #ty = call.arg_opt_as::<#ty>(#index)?.flatten();
                });
            } else {
                arg_infos.push(quote! { .arg(#arg_name_str, #type_name, #doc) });
                arg_pulls.push(quote! {
                    let #arg_name: #ty = call.arg_as::<#ty>(#index)?;
                });
            }
        }
    }

    let return_type_name = match &input_fn.sig.output {
        ReturnType::Default => "null".to_string(),
        ReturnType::Type(_, ty) => gisp_type_name(ty),
    };

    let invoke = if returns_result(&input_fn.sig.output) {
        quote! {
            implementation(#(#arg_names),*).map_err(|e| call.error(e))?
        }
    } else {
        quote! { implementation(#(#arg_names),*) }
    };

    let fn_vis = &input_fn.vis;
    let fn_block = &input_fn.block;
    let fn_output = &input_fn.sig.output;
    let fn_inputs = &input_fn.sig.inputs;

    let expanded = quote! {
        #fn_vis mod #mod_name {
            use super::*;

            /// Native metadata for registration
            pub static INFO: std::sync::LazyLock<gisp::NativeInfo> = std::sync::LazyLock::new(|| {
                gisp::NativeInfo::new(#script_name, #description)
                    #(#arg_infos)*
                    .returns(#return_type_name)
            });

            pub(super) fn implementation(#fn_inputs) #fn_output #fn_block

            /// Pull the arguments from the call and run the function.
            pub fn call<E>(call: &mut gisp::Call<'_, E>) -> gisp::Result<gisp::Value<E>> {
                #(#arg_pulls)*

                let result = #invoke;
                Ok(result.into())
            }

            /// Unit struct for `sandbox.register(name::Native)`.
            pub struct Native;

            impl gisp::Native for Native {
                fn info() -> &'static gisp::NativeInfo {
                    &*INFO
                }

                fn call<E>(call: &mut gisp::Call<'_, E>) -> gisp::Result<gisp::Value<E>> {
                    self::call(call)
                }
            }
        }
    };

    TokenStream::from(expanded)
}
