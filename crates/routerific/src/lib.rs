//! # Routerific
//!
//! A first-match request router whose handlers take typed arguments.
//!
//! ## Overview
//!
//! A view is a named handler. Each of its parameters is read from the request by a
//! guard chosen at registration time: a path placeholder, a query parameter, a header,
//! the JSON body, or a resolver the application registers for its own types. Guards
//! parse and check values; a route whose guards all succeed handles the request, and
//! the first such route wins.
//!
//! ```text
//! request ──▶ route 1: method? path? guards? ──no──▶ route 2 ... ──▶ not found
//!                          │ yes
//!                          ▼
//!                  handler(typed args)
//! ```
//!
//! - **Core**: path templates, the parser registry and constraint expressions
//! - **Framework**: views, guards, resolvers, the router and its `tower` service
//! - **Runtime**: configuration, logging and router bootstrap
//! - **Macros**: `#[route]` and `#[derive(Schema)]`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use routerific::prelude::*;
//!
//! #[route("GET", "/blog/<int:id>")]
//! fn detail(#[constraint(Expr::gt(0))] id: i64) -> String {
//!     format!("post {id}")
//! }
//!
//! #[route("GET", "/search")]
//! fn search(q: String, page: Option<i64>) -> String {
//!     format!("{q} page {}", page.unwrap_or(1))
//! }
//!
//! fn main() -> RuntimeResult<()> {
//!     let runtime = Runtime::new()?;
//!     let router = runtime.build_router([detail.into_view(), search.into_view()])?;
//!
//!     assert_eq!(router.dispatch(&Request::get("/blog/7")).unwrap(), "post 7");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: Read `routerific.toml` (default)
//! - `yaml-config`: Read `routerific.yaml`
//! - `json-log`: JSON log lines

pub use routerific_core as core;
pub use routerific_framework as framework;
pub use routerific_runtime as runtime;

pub use routerific_macros::{Schema, route};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use routerific::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use routerific_runtime::{Runtime, RuntimeError, RuntimeResult};

    // Registration and dispatch
    pub use routerific_framework::{
        DispatchError, IntoView, Responder, Router, RouterBuilder, RouterOptions,
        RouterService, View, ViewId,
    };

    // Handler parameters
    pub use routerific_framework::{Body, Header, Parameter, Path, Query, Schema};

    // Extension points
    pub use routerific_framework::{DeclaredType, GuardKind, Resolution, RouteContext};

    // Requests, constraints and errors
    pub use routerific_core::{Expr, HttpRequest, Request, RouteConfigError};

    // Macros
    pub use routerific_macros::{Schema, route};
}
