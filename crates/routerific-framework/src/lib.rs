//! # Routerific Framework
//!
//! Handler registration and request routing on top of `routerific-core`.
//!
//! This layer provides:
//! - Views: named handlers whose parameters are resolved from the request
//! - Guards that read each parameter from the path, query, headers or body
//! - An open resolver table for application-defined parameter types and guard kinds
//! - The first-match router and a `tower::Service` adapter for it

pub mod builder;
pub mod error;
pub mod guard;
pub mod handler;
pub mod options;
pub mod param;
pub mod resolver;
pub mod router;
pub mod service;
pub mod view;

pub use builder::{RouterBuilder, ViewId};
pub use error::{ArgumentError, DispatchError, DispatchResult};
pub use guard::{Guard, GuardKind, MethodGuard, ParamGuard, RouteContext, ViewGuard};
pub use handler::{Arguments, BoxedHandler, Handler, Responder, into_handler};
pub use options::RouterOptions;
pub use param::{Body, DecodeFn, DeclaredType, Header, Parameter, Path, Query, Schema, Shape};
pub use resolver::{MethodResolver, Resolution, Resolver, Resolvers};
pub use router::{RouteInfo, Router, RouterMatch};
pub use service::RouterService;
pub use view::{IntoView, View};
