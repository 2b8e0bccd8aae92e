//! Procedural macros for Routerific.
//!
//! This crate provides:
//!
//! - `#[route]` - Turns a function into a view with its routes
//! - `#[derive(Schema)]` - Makes a `Deserialize` type usable as a JSON body parameter
//!
//! Both expand to paths under `::routerific`, so use them through the `routerific`
//! crate rather than depending on this one directly.
//!
//! # Route Attribute
//!
//! ```rust,ignore
//! use routerific::prelude::*;
//!
//! #[route("GET", "/blog/<int:id>")]
//! #[route("GET", "/b/<int:id>")]
//! fn detail(#[constraint(Expr::gt(0))] id: i64) -> String {
//!     format!("post {id}")
//! }
//!
//! let mut builder = Router::builder();
//! builder.mount(detail)?;
//! ```

mod route;
mod schema;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Declares a view and its routes.
///
/// The function is replaced by a unit struct of the same name implementing
/// `IntoView`, ready for `RouterBuilder::mount` or `RouterBuilder::include`.
///
/// # Attributes
///
/// - `#[route("METHOD", "/template")]` - Adds a route; stack several for more
/// - `#[route("/template")]` - Same, with `GET`
/// - `#[constraint(expr)]` on a parameter - Adds an `Expr` constraint
/// - `#[rename("X-Token")]` on a parameter - Looks the value up under another name
///
/// # Example
///
/// ```rust,ignore
/// #[route("GET", "/me")]
/// fn me(#[rename("X-Token")] token: Header<String>) -> String {
///     token.into_inner()
/// }
/// ```
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemFn);

    match route::expand(args.into(), item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `Schema` and `Parameter` for a JSON body type.
///
/// The type must also derive `serde::Deserialize`. Parameters of the type are read
/// from the request body unless their name is a path placeholder.
///
/// # Attributes
///
/// - `#[schema(validate = path)]` - `fn(&Self) -> Result<(), String>` run after decoding
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Deserialize, Schema)]
/// #[schema(validate = check_title)]
/// struct NewPost {
///     title: String,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(schema))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match schema::derive_schema(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
