//! Error types shared by the routing core.
//!
//! Two families of errors exist and they never mix:
//!
//! - [`RouteConfigError`] is fatal. It is returned while templates are compiled and
//!   routes are registered, and startup is expected to abort on it.
//! - [`MatchFailure`] is soft. Guards return it while a request is matched against one
//!   candidate route; the router swallows it and moves on to the next candidate.

use thiserror::Error;

/// Errors raised while compiling templates or registering routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteConfigError {
    /// A placeholder used a type tag that has no pattern.
    #[error("unknown placeholder type '{tag}' in path template '{template}'")]
    UnknownPlaceholderType {
        /// Template source.
        template: String,
        /// The offending tag.
        tag: String,
    },

    /// The same placeholder name occurs twice in one template.
    #[error("duplicate placeholder '{name}' in path template '{template}'")]
    DuplicatePlaceholder {
        /// Template source.
        template: String,
        /// The repeated name.
        name: String,
    },

    /// A placeholder could not be read.
    #[error("malformed placeholder in path template '{template}': {reason}")]
    MalformedPlaceholder {
        /// Template source.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The template produced a pattern the regex engine rejects.
    #[error("invalid path template '{template}': {reason}")]
    InvalidPattern {
        /// Template source.
        template: String,
        /// Regex engine message.
        reason: String,
    },

    /// A `matches` constraint was given a pattern the regex engine rejects.
    #[error("invalid constraint pattern '{pattern}': {reason}")]
    InvalidConstraintPattern {
        /// Pattern source.
        pattern: String,
        /// Regex engine message.
        reason: String,
    },

    /// No parser is registered for a declared parameter type.
    #[error("unsupported type '{type_name}'")]
    UnsupportedType {
        /// Readable name of the declared type.
        type_name: &'static str,
    },

    /// A template placeholder has no path-sourced parameter in the view.
    #[error("path parameter named '{name}' not found in view '{view}'")]
    UnmatchedPlaceholder {
        /// View name.
        view: String,
        /// Placeholder name.
        name: String,
    },

    /// A parameter explicitly marked as path-sourced names no placeholder.
    #[error("parameter '{name}' of view '{view}' is marked as a path parameter but the template '{template}' has no such placeholder")]
    UnknownPathParameter {
        /// View name.
        view: String,
        /// Parameter name.
        name: String,
        /// Template source.
        template: String,
    },

    /// No resolver exists for a guard kind and declared type.
    #[error("no resolver for {kind} guard on parameter '{name}' ({type_name})")]
    UnresolvableGuard {
        /// Parameter name.
        name: String,
        /// Guard kind label.
        kind: String,
        /// Readable name of the declared type.
        type_name: &'static str,
    },

    /// The handler arity differs from the number of declared parameter names.
    #[error("view '{view}' names {declared} parameters but its handler takes {expected}")]
    ParameterCountMismatch {
        /// View name.
        view: String,
        /// Number of names supplied.
        declared: usize,
        /// Handler arity.
        expected: usize,
    },

    /// A parameter name occurs twice in one view.
    #[error("duplicate parameter '{name}' in view '{view}'")]
    DuplicateParameter {
        /// View name.
        view: String,
        /// Parameter name.
        name: String,
    },

    /// A constraint targets a parameter that cannot carry it.
    #[error("invalid constraint on parameter '{name}' of view '{view}': {reason}")]
    InvalidConstraint {
        /// View name.
        view: String,
        /// Parameter name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two views share a name.
    #[error("a view named '{0}' is already registered")]
    DuplicateView(String),

    /// A view handle from another builder was used.
    #[error("unknown view handle #{0}")]
    UnknownView(usize),

    /// The method string is not a valid HTTP method token.
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
}

impl RouteConfigError {
    /// Creates a malformed placeholder error.
    pub fn malformed(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPlaceholder {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid constraint error.
    pub fn invalid_constraint(
        view: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConstraint {
            view: view.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for template compilation and route registration.
pub type RouteConfigResult<T> = Result<T, RouteConfigError>;

/// A guard did not accept the request for the candidate route.
///
/// Always recoverable: the router logs it and tries the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchFailure {
    /// Request method differs from the route method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// A captured path segment did not parse.
    #[error("failed to parse path parameter '{name}'")]
    InvalidPathParameter {
        /// Parameter name.
        name: String,
    },

    /// The query string lacks the parameter.
    #[error("query parameter '{name}' not found")]
    MissingQueryParameter {
        /// Parameter name.
        name: String,
    },

    /// The query value did not parse.
    #[error("failed to parse query parameter '{name}': {reason}")]
    InvalidQueryParameter {
        /// Parameter name.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// The request lacks the header.
    #[error("header '{name}' not found")]
    MissingHeader {
        /// Header name as looked up.
        name: String,
    },

    /// The header value did not parse.
    #[error("failed to parse header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as looked up.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// The body did not decode or validate.
    #[error("invalid body: {reason}")]
    InvalidBody {
        /// Decoder message.
        reason: String,
    },

    /// Failure reported by an extension resolver.
    #[error("{0}")]
    Custom(String),
}

impl MatchFailure {
    /// Creates a custom soft failure.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates an invalid body failure.
    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::InvalidBody {
            reason: reason.into(),
        }
    }
}

/// Result type for guard resolution.
pub type MatchResult<T> = Result<T, MatchFailure>;

/// A raw string could not be turned into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(String);

impl ParseError {
    /// Creates a parse error with the given message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// The value parsed but a constraint rejected it.
    pub fn constraint(type_name: &str) -> Self {
        Self(format!("{type_name} value does not satisfy its constraints"))
    }
}

/// A request body could not be decoded into its schema type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bytes are not a well-formed document of the expected shape.
    #[error("malformed body: {0}")]
    Malformed(String),

    /// The document decoded but failed schema validation.
    #[error("validation failed: {0}")]
    Invalid(String),
}
