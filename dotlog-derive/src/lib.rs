#![forbid(
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
//! Derive macro for [`dotlog`].
//!
//! **This crate is an implementation detail.** Users should depend on the
//! [`dotlog`] crate, which re-exports the macro as `dotlog::Record`.
//!
//! [`dotlog`]: https://docs.rs/dotlog

/// Code generation for `#[derive(Record)]`.
mod record;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Implements `dotlog::Record` for a struct with named fields.
///
/// See the documentation of `dotlog::Record` for the supported attributes.
///
/// ```ignore
/// use dotlog::Record;
///
/// #[derive(Record)]
/// struct Line {
///     #[record(nested)]
///     start: Point,
///     #[record(format = "{:?}")]
///     label: &'static str,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match record::expand(&ast) {
        Ok(codegen) => codegen.into(),
        Err(e) => e.write_errors().into(),
    }
}
