//! Handler parameter types.
//!
//! Every handler argument type implements [`Parameter`], which tells the registry how
//! the value is obtained ([`DeclaredType`]) and how to take it back out of the
//! type-erased [`Value`] a guard produced.
//!
//! | Declared as                   | Guard when not marked                         |
//! |-------------------------------|-----------------------------------------------|
//! | `i64`, `String`, `Uuid`       | path if the name is a placeholder, else query |
//! | `#[derive(Schema)]`           | path if a placeholder, else body              |
//! | type with its own resolver    | path if a placeholder, else that resolver     |
//! | `Path<T>` ... `Body<T>`       | always the marked guard                       |
//! | `Option<T>`                   | as `T`, but a missing value yields `None`     |

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use routerific_core::{DecodeError, TypeKey, Value};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::guard::GuardKind;

/// A type-erased body decoder.
pub type DecodeFn = Arc<dyn Fn(&[u8]) -> Result<Value, DecodeError> + Send + Sync>;

/// How a declared type is produced from a request.
#[derive(Clone)]
pub enum Shape {
    /// Parsed from a string by the parser registry.
    Scalar,
    /// Decoded from the whole request body.
    Schema(DecodeFn),
    /// Produced only by an externally registered resolver.
    Extension,
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("Scalar"),
            Self::Schema(_) => f.write_str("Schema"),
            Self::Extension => f.write_str("Extension"),
        }
    }
}

/// The declared type of one handler parameter.
#[derive(Clone, Debug)]
pub struct DeclaredType {
    key: TypeKey,
    shape: Shape,
    explicit: Option<GuardKind>,
    optional: bool,
}

impl DeclaredType {
    /// A type parsed from text.
    pub fn scalar<T: Any + Send>() -> Self {
        Self::with_shape::<T>(Shape::Scalar)
    }

    /// A JSON body validated by [`Schema::validate`].
    pub fn schema<T: Schema>() -> Self {
        Self::decoded::<T, _>(|bytes| {
            let value: T = serde_json::from_slice(bytes)
                .map_err(|e| DecodeError::Malformed(e.to_string()))?;
            value.validate().map_err(DecodeError::Invalid)?;
            Ok(value)
        })
    }

    /// A body type with a custom decoder.
    pub fn decoded<T, F>(decode: F) -> Self
    where
        T: Any + Send,
        F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        let decode: DecodeFn =
            Arc::new(move |bytes: &[u8]| decode(bytes).map(|value| Box::new(value) as Value));
        Self::with_shape::<T>(Shape::Schema(decode))
    }

    /// A type only an extension resolver can produce.
    pub fn extension<T: Any + Send>() -> Self {
        Self::with_shape::<T>(Shape::Extension)
    }

    fn with_shape<T: Any + Send>(shape: Shape) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            shape,
            explicit: None,
            optional: false,
        }
    }

    /// Pins the parameter to a guard kind, bypassing inference.
    pub fn at(mut self, kind: GuardKind) -> Self {
        self.explicit = Some(kind);
        self
    }

    /// A missing value resolves to `None` instead of failing the match.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Guard kind forced by a marker, if any.
    pub fn explicit(&self) -> Option<GuardKind> {
        self.explicit
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_schema(&self) -> bool {
        matches!(self.shape, Shape::Schema(_))
    }
}

// ============================================================================
// Parameter
// ============================================================================

/// A type usable as a handler argument.
pub trait Parameter: Sized + Send + 'static {
    /// How the value is obtained.
    fn declared() -> DeclaredType;

    /// Recovers the typed value from a guard's output.
    ///
    /// Returns `None` if the value is missing or of another type.
    fn from_value(value: Option<Value>) -> Option<Self> {
        value?.downcast::<Self>().ok().map(|boxed| *boxed)
    }
}

impl Parameter for i64 {
    fn declared() -> DeclaredType {
        DeclaredType::scalar::<Self>()
    }
}

impl Parameter for String {
    fn declared() -> DeclaredType {
        DeclaredType::scalar::<Self>()
    }
}

impl Parameter for Uuid {
    fn declared() -> DeclaredType {
        DeclaredType::scalar::<Self>()
    }
}

impl<T: Parameter> Parameter for Option<T> {
    fn declared() -> DeclaredType {
        T::declared().optional()
    }

    fn from_value(value: Option<Value>) -> Option<Self> {
        match value {
            None => Some(None),
            Some(value) => T::from_value(Some(value)).map(Some),
        }
    }
}

/// A body type decoded from JSON.
///
/// Usually derived:
///
/// ```rust,ignore
/// #[derive(Deserialize, Schema)]
/// #[schema(validate = check_post)]
/// struct NewPost {
///     title: String,
/// }
///
/// fn check_post(post: &NewPost) -> Result<(), String> {
///     if post.title.is_empty() {
///         return Err("title must not be empty".into());
///     }
///     Ok(())
/// }
/// ```
pub trait Schema: DeserializeOwned + Send + 'static {
    /// Checks the decoded value. The default accepts everything.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

// ============================================================================
// Explicit markers
// ============================================================================

macro_rules! define_marker {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name<T>(pub T);

        impl<T> $name<T> {
            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<T> Deref for $name<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }

        impl<T> DerefMut for $name<T> {
            fn deref_mut(&mut self) -> &mut T {
                &mut self.0
            }
        }

        impl<T: Parameter> Parameter for $name<T> {
            fn declared() -> DeclaredType {
                T::declared().at($kind)
            }

            fn from_value(value: Option<Value>) -> Option<Self> {
                T::from_value(value).map($name)
            }
        }
    };
}

define_marker!(
    /// Takes the value from the path placeholder of the same name.
    Path => GuardKind::Path
);
define_marker!(
    /// Takes the value from the query parameter of the same name.
    Query => GuardKind::Query
);
define_marker!(
    /// Takes the value from the header of the same name.
    Header => GuardKind::Header
);
define_marker!(
    /// Decodes the whole request body.
    Body => GuardKind::Body
);
