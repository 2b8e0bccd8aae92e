//! Handler system.
//!
//! Any `Fn` whose arguments all implement [`Parameter`] is a [`Handler`], similar to
//! Axum's handler functions. The router resolves one value per parameter, collects them
//! in [`Arguments`] and the handler consumes them positionally.
//!
//! ```rust,ignore
//! fn detail(id: i64) -> String {
//!     format!("post {id}")
//! }
//!
//! fn search(q: String, page: Option<i64>) -> String {
//!     format!("{q} (page {})", page.unwrap_or(1))
//! }
//!
//! let view = View::new("search", search).params(["q", "page"]);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use routerific_core::Value;

use crate::error::ArgumentError;
use crate::param::{DeclaredType, Parameter};

// ============================================================================
// Responder - the not-found value
// ============================================================================

/// A handler return type with a fixed "no route matched" value.
pub trait Responder {
    /// Value returned when no route matches a request.
    fn not_found() -> Self;
}

impl Responder for () {
    fn not_found() -> Self {}
}

impl Responder for String {
    fn not_found() -> Self {
        String::from("404 Not Found")
    }
}

/// `None` when nothing matched.
impl<T> Responder for Option<T> {
    fn not_found() -> Self {
        None
    }
}

impl<T: Responder, E> Responder for Result<T, E> {
    fn not_found() -> Self {
        Ok(T::not_found())
    }
}

/// An empty `404 Not Found` response.
impl<B: Default> Responder for http::Response<B> {
    fn not_found() -> Self {
        let mut response = http::Response::new(B::default());
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Resolved handler arguments, in parameter order.
#[derive(Default)]
pub struct Arguments {
    entries: Vec<(String, Option<Value>)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends the value of parameter `name`. `None` marks an absent optional value.
    pub fn push(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.entries.push((name.into(), value));
    }

    /// Borrows the value of `name` as a `T`.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_ref())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns `true` if `name` was resolved to a value.
    pub fn is_present(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(key, value)| key == name && value.is_some())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Arguments {
    type Item = (String, Option<Value>);
    type IntoIter = std::vec::IntoIter<(String, Option<Value>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(key, value)| (key, if value.is_some() { "<value>" } else { "None" })),
            )
            .finish()
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// A function callable with resolved [`Arguments`].
///
/// Implemented for every `Fn(T1, ..., Tn) -> R` with `n <= 16` and `Ti: Parameter`.
pub trait Handler<T, R>: Send + Sync + 'static {
    /// Declared types of the parameters, in order.
    fn parameters() -> Vec<DeclaredType>;

    /// Calls the handler, consuming `args` positionally.
    fn call(&self, args: Arguments) -> Result<R, ArgumentError>;
}

/// A type-erased handler stored in a view.
pub type BoxedHandler<R> = Arc<dyn Fn(Arguments) -> Result<R, ArgumentError> + Send + Sync>;

/// Converts a handler into a boxed handler.
pub fn into_handler<H, T, R>(handler: H) -> BoxedHandler<R>
where
    H: Handler<T, R>,
    T: 'static,
    R: 'static,
{
    Arc::new(move |args: Arguments| handler.call(args))
}

fn take_argument<T: Parameter>(
    entries: &mut impl Iterator<Item = (String, Option<Value>)>,
) -> Result<T, ArgumentError> {
    let Some((name, value)) = entries.next() else {
        return Err(ArgumentError::Missing {
            expected: type_name::<T>(),
        });
    };
    T::from_value(value).ok_or(ArgumentError::TypeMismatch {
        name,
        expected: type_name::<T>(),
    })
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

/// Generates Handler implementations for functions with different arities.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, R, $($ty,)*> Handler<($($ty,)*), R> for F
        where
            F: Fn($($ty,)*) -> R + Send + Sync + 'static,
            $( $ty: Parameter, )*
        {
            fn parameters() -> Vec<DeclaredType> {
                vec![$($ty::declared(),)*]
            }

            fn call(&self, args: Arguments) -> Result<R, ArgumentError> {
                let mut entries = args.into_iter();
                $(
                    let $ty = take_argument::<$ty>(&mut entries)?;
                )*
                Ok((self)($($ty,)*))
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15
);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16
);

#[cfg(test)]
mod tests {
    use super::*;

    fn value<T: Any + Send>(v: T) -> Option<Value> {
        Some(Box::new(v))
    }

    fn args(values: Vec<(&str, Option<Value>)>) -> Arguments {
        let mut args = Arguments::new();
        for (name, value) in values {
            args.push(name, value);
        }
        args
    }

    fn declared<T, R, H: Handler<T, R>>(_handler: &H) -> Vec<DeclaredType> {
        H::parameters()
    }

    #[test]
    fn test_zero_arity_handler() {
        let handler = into_handler(|| "list".to_string());
        assert_eq!(handler(Arguments::new()).unwrap(), "list");
    }

    #[test]
    fn test_positional_arguments() {
        let detail = |id: i64, q: Option<String>| format!("{id}:{}", q.unwrap_or_default());
        assert_eq!(declared(&detail).len(), 2);

        let handler = into_handler(detail);
        let result = handler(args(vec![("id", value(7_i64)), ("q", value("x".to_string()))]));
        assert_eq!(result.unwrap(), "7:x");

        let result = handler(args(vec![("id", value(7_i64)), ("q", None)]));
        assert_eq!(result.unwrap(), "7:");
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let handler = into_handler(|id: i64| id);
        let err = handler(args(vec![("id", value("7".to_string()))])).unwrap_err();
        assert!(matches!(err, ArgumentError::TypeMismatch { ref name, .. } if name == "id"));

        let err = handler(Arguments::new()).unwrap_err();
        assert!(matches!(err, ArgumentError::Missing { .. }));
    }

    #[test]
    fn test_arguments_lookup() {
        let args = args(vec![("id", value(7_i64)), ("q", None)]);
        assert_eq!(args.get::<i64>("id"), Some(&7));
        assert_eq!(args.get::<String>("id"), None);
        assert!(args.is_present("id"));
        assert!(!args.is_present("q"));
        assert_eq!(args.names().collect::<Vec<_>>(), ["id", "q"]);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_not_found_values() {
        let response = <http::Response<String> as Responder>::not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body().is_empty());

        assert_eq!(<Option<i64> as Responder>::not_found(), None);
        assert_eq!(<String as Responder>::not_found(), "404 Not Found");
    }
}
