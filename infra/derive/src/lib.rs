#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the Spire workspace.
//!
//! Currently this is a single attribute, [`macro@spire_error`], which every crate uses to
//! declare its error enum. Keeping the wiring in one place means all errors
//! format context the same way and convert from upstream errors the same way.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! spire-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns an enum into a context-aware error type backed by `thiserror`.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<Name>Ext` trait with `.context(...)`, implemented for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant that wraps a source error.
/// * `From<Source>` for every variant with a `source` field (or `#[source]`/`#[from]`).
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * `Name::context_note()` returning the attached context, if any.
/// * A module-private `format_context` helper for use inside `#[error(...)]` strings.
///   Only one `spire_error` enum may live in a given module because of this helper.
///
/// # Requirements
///
/// 1. Variants use named fields; tuple and unit variants are rejected.
/// 2. A variant with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use spire_derive::spire_error;
/// use std::borrow::Cow;
///
/// #[spire_error]
/// pub enum CacheError {
///     #[error("Serialization failed{}: {source}", format_context(.context))]
///     Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn encode(value: &serde_json::Value) -> Result<String, CacheError> {
///     serde_json::to_string(value).context("Encoding cached entry")
/// }
/// ```
#[proc_macro_attribute]
pub fn spire_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
