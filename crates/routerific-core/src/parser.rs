//! Typed value parsers.
//!
//! The [`ParserRegistry`] maps a Rust type to a function turning a raw string (a path
//! segment, a query value, a header value) into a value of that type. Out of the box it
//! knows `i64`, `String` and [`Uuid`]; other types are added with
//! [`ParserRegistry::register`] or [`ParserRegistry::register_from_str`].
//!
//! [`ParserRegistry::build`] pairs the parse function with the constraints declared for
//! one parameter, producing a [`Parser`]. A value that parses but fails its constraints
//! is reported as an ordinary [`ParseError`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ParseError, RouteConfigError, RouteConfigResult};
use crate::expr::{Expr, Predicate};
use crate::value::{TypeKey, Value};

/// A type-erased parse function.
pub type ParseFn = Arc<dyn Fn(&str) -> Result<Value, ParseError> + Send + Sync>;

/// A parse function bound to the constraints of one parameter.
#[derive(Clone)]
pub struct Parser {
    key: TypeKey,
    parse: ParseFn,
    predicate: Option<Predicate>,
}

impl Parser {
    /// Parses `raw` and checks the result against the constraints.
    pub fn parse(&self, raw: &str) -> Result<Value, ParseError> {
        let value = (self.parse)(raw)?;
        if let Some(predicate) = &self.predicate {
            let inner: &dyn Any = &*value;
            if !predicate(inner) {
                return Err(ParseError::constraint(self.key.name()));
            }
        }
        Ok(value)
    }

    /// Type this parser produces.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn is_constrained(&self) -> bool {
        self.predicate.is_some()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("type", &self.key)
            .field("constrained", &self.predicate.is_some())
            .finish()
    }
}

/// Registry of parse functions keyed by type.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<TypeId, (TypeKey, ParseFn)>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Creates a registry holding the built-in parsers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<i64, _, _>(|raw| raw.parse::<i64>());
        registry.register::<String, _, _>(|raw| Ok::<_, ParseError>(raw.to_owned()));
        registry.register::<Uuid, _, _>(Uuid::parse_str);
        registry
    }

    /// Creates a registry without any parser.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the parser for `T`.
    ///
    /// ```rust,ignore
    /// registry.register::<bool, _, _>(|raw| match raw {
    ///     "1" | "true" => Ok(true),
    ///     "0" | "false" => Ok(false),
    ///     _ => Err("expected a boolean"),
    /// });
    /// ```
    pub fn register<T, F, E>(&mut self, parse: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        let parse: ParseFn = Arc::new(move |raw: &str| {
            parse(raw)
                .map(|value| Box::new(value) as Value)
                .map_err(|e| ParseError::new(e.to_string()))
        });
        let key = TypeKey::of::<T>();
        self.parsers.insert(key.id(), (key, parse));
        self
    }

    /// Registers `T`'s [`FromStr`] implementation as its parser.
    pub fn register_from_str<T>(&mut self) -> &mut Self
    where
        T: FromStr + Any + Send,
        T::Err: fmt::Display,
    {
        self.register::<T, _, _>(|raw| raw.parse::<T>())
    }

    /// Returns `true` if a parser for the type is registered.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.parsers.contains_key(&key.id())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Builds the parser for one parameter of type `key`.
    ///
    /// All `constraints` are joined with `and` and checked after parsing.
    ///
    /// # Errors
    ///
    /// Returns [`RouteConfigError::UnsupportedType`] if no parser is registered for `key`.
    pub fn build(&self, key: TypeKey, constraints: &[Expr]) -> RouteConfigResult<Parser> {
        let (key, parse) = self
            .parsers
            .get(&key.id())
            .cloned()
            .ok_or(RouteConfigError::UnsupportedType {
                type_name: key.name(),
            })?;
        let predicate = Expr::all(constraints.iter().cloned()).map(|expr| expr.compile());
        Ok(Parser {
            key,
            parse,
            predicate,
        })
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.parsers.values().map(|(key, _)| key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downcast<T: Any + Clone>(value: Value) -> T {
        value.downcast_ref::<T>().cloned().unwrap()
    }

    #[test]
    fn test_default_parsers() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.len(), 3);

        let int = registry.build(TypeKey::of::<i64>(), &[]).unwrap();
        assert_eq!(downcast::<i64>(int.parse("42").unwrap()), 42);
        assert_eq!(downcast::<i64>(int.parse("-5").unwrap()), -5);
        assert!(int.parse("abc").is_err());

        let text = registry.build(TypeKey::of::<String>(), &[]).unwrap();
        assert_eq!(downcast::<String>(text.parse("hello").unwrap()), "hello");

        let uuid = registry.build(TypeKey::of::<Uuid>(), &[]).unwrap();
        let value = uuid
            .parse("67e55044-10b1-426f-9247-bb680e5fe0c8")
            .unwrap();
        assert_eq!(
            downcast::<Uuid>(value).to_string(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
        assert!(uuid.parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_unsupported_type() {
        let registry = ParserRegistry::new();
        let err = registry.build(TypeKey::of::<f64>(), &[]).unwrap_err();
        assert!(matches!(err, RouteConfigError::UnsupportedType { .. }));
        assert!(err.to_string().starts_with("unsupported type"));
    }

    #[test]
    fn test_constraints_are_checked_after_parsing() {
        let registry = ParserRegistry::new();
        let positive = registry
            .build(TypeKey::of::<i64>(), &[Expr::gt(0)])
            .unwrap();
        assert!(positive.is_constrained());
        assert!(positive.parse("-5").is_err());
        assert!(positive.parse("0").is_err());
        assert_eq!(downcast::<i64>(positive.parse("5").unwrap()), 5);
    }

    #[test]
    fn test_multiple_constraints_are_and_combined() {
        let registry = ParserRegistry::new();
        let parser = registry
            .build(
                TypeKey::of::<String>(),
                &[Expr::min_len(2), Expr::max_len(4)],
            )
            .unwrap();
        assert!(parser.parse("a").is_err());
        assert!(parser.parse("abc").is_ok());
        assert!(parser.parse("abcde").is_err());
    }

    #[test]
    fn test_external_parsers() {
        let mut registry = ParserRegistry::new();
        registry.register_from_str::<u16>();
        registry.register::<bool, _, _>(|raw| match raw {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => Err("expected yes or no"),
        });
        assert!(registry.contains(TypeKey::of::<u16>()));

        let port = registry.build(TypeKey::of::<u16>(), &[]).unwrap();
        assert_eq!(downcast::<u16>(port.parse("8080").unwrap()), 8080);
        assert!(port.parse("70000").is_err());

        let flag = registry.build(TypeKey::of::<bool>(), &[]).unwrap();
        assert!(downcast::<bool>(flag.parse("yes").unwrap()));
        assert_eq!(
            flag.parse("maybe").unwrap_err().to_string(),
            "expected yes or no"
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = ParserRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.build(TypeKey::of::<i64>(), &[]).is_err());
    }
}
