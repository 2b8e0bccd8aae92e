//! Error types for the Routerific framework.

use thiserror::Error;

/// A resolved argument could not be handed to the handler.
///
/// Only an extension resolver producing a value of the wrong type can cause this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// Fewer arguments were resolved than the handler takes.
    #[error("missing argument of type '{expected}'")]
    Missing {
        /// Expected parameter type.
        expected: &'static str,
    },

    /// A resolved value has a different type than the handler parameter.
    #[error("argument '{name}' is not a '{expected}'")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Expected parameter type.
        expected: &'static str,
    },
}

/// Returned by [`Router::dispatch`](crate::Router::dispatch) when the matched handler
/// could not be called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to call view '{view}': {source}")]
pub struct DispatchError {
    /// Name of the matched view.
    pub view: String,
    /// What went wrong.
    #[source]
    pub source: ArgumentError,
}

/// Result type for dispatching a request.
pub type DispatchResult<T> = Result<T, DispatchError>;
