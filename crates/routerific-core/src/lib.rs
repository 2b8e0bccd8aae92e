//! Core building blocks for Routerific.
//!
//! This crate holds the pieces of the router that know nothing about handlers:
//!
//! - [`template`]: compiling `/blog/<int:id>` style templates into full-match matchers
//! - [`parser`]: turning raw strings into typed values, refined by [`expr`] constraints
//! - [`request`]: the [`HttpRequest`] view the router reads requests through
//! - [`error`]: configuration errors versus soft match failures
//!
//! Handler registration, guards and the router itself live in `routerific-framework`.

pub mod error;
pub mod expr;
pub mod parser;
pub mod request;
pub mod template;
pub mod value;

pub use error::{
    DecodeError, MatchFailure, MatchResult, ParseError, RouteConfigError, RouteConfigResult,
};
pub use expr::{CmpOp, Expr, Literal, Predicate};
pub use parser::{ParseFn, Parser, ParserRegistry};
pub use request::{HttpRequest, Request};
pub use template::{PathParams, PathTemplate, PlaceholderType, Segment};
pub use value::{TypeKey, Value};
