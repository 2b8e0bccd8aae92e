//! Guard resolution dispatch.
//!
//! [`Resolvers`] decides, once per parameter at registration time, which function
//! extracts that parameter's value. It is an open table with three parts:
//!
//! 1. one resolver per [`GuardKind`] (path, query, header and body are built in,
//!    [`GuardKind::Custom`] kinds can be added),
//! 2. resolvers keyed by the parameter's declared type, added by applications,
//! 3. the method resolver.
//!
//! Selection order for a parameter: a kind pinned by a marker uses that kind's resolver;
//! otherwise a resolver registered for the declared type wins; otherwise the inferred
//! kind's resolver is used. When none applies registration fails.
//!
//! ```rust,ignore
//! // Every handler parameter of type `CurrentUser` is read from the session header.
//! resolvers.register_type::<CurrentUser, _>(|_guard, request, _ctx| {
//!     let token = request.header("X-SESSION").ok_or_else(|| MatchFailure::custom("no session"))?;
//!     Ok(Some(CurrentUser::from_token(token)))
//! });
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use routerific_core::{
    HttpRequest, MatchFailure, MatchResult, RouteConfigError, RouteConfigResult, TypeKey, Value,
};

use crate::guard::{GuardKind, MethodGuard, ParamGuard, RouteContext};
use crate::options::RouterOptions;
use crate::param::{DeclaredType, Shape};

/// Output of a parameter resolver. `Ok(None)` means "no value".
pub type Resolution = MatchResult<Option<Value>>;

/// Extracts one parameter from a request.
pub type Resolver =
    Arc<dyn Fn(&ParamGuard, &dyn HttpRequest, &RouteContext<'_>) -> Resolution + Send + Sync>;

/// Checks the request method.
pub type MethodResolver = Arc<dyn Fn(&MethodGuard, &dyn HttpRequest) -> MatchResult<()> + Send + Sync>;

/// The resolver table.
#[derive(Clone)]
pub struct Resolvers {
    method: MethodResolver,
    kinds: HashMap<GuardKind, Resolver>,
    types: HashMap<TypeId, (TypeKey, Resolver)>,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self::new(&RouterOptions::default())
    }
}

impl Resolvers {
    /// Creates the table with the built-in resolvers configured by `options`.
    pub fn new(options: &RouterOptions) -> Self {
        let mut resolvers = Self::empty();
        resolvers.kinds.insert(GuardKind::Path, Arc::new(resolve_path));
        resolvers.kinds.insert(GuardKind::Query, Arc::new(resolve_query));
        resolvers
            .kinds
            .insert(GuardKind::Header, header_resolver(options.header_underscore_fallback));
        resolvers
            .kinds
            .insert(GuardKind::Body, body_resolver(options.max_body_bytes));
        resolvers
    }

    /// Creates a table with only the method resolver.
    pub fn empty() -> Self {
        Self {
            method: Arc::new(resolve_method),
            kinds: HashMap::new(),
            types: HashMap::new(),
        }
    }

    /// Registers (or replaces) the resolver for a guard kind.
    pub fn register_kind<F>(&mut self, kind: GuardKind, resolver: F) -> &mut Self
    where
        F: Fn(&ParamGuard, &dyn HttpRequest, &RouteContext<'_>) -> Resolution
            + Send
            + Sync
            + 'static,
    {
        self.kinds.insert(kind, Arc::new(resolver));
        self
    }

    /// Registers (or replaces) the resolver for parameters declared as `T`.
    pub fn register_type<T, F>(&mut self, resolver: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn(&ParamGuard, &dyn HttpRequest, &RouteContext<'_>) -> MatchResult<Option<T>>
            + Send
            + Sync
            + 'static,
    {
        let erased: Resolver = Arc::new(
            move |guard: &ParamGuard, request: &dyn HttpRequest, ctx: &RouteContext<'_>| {
                resolver(guard, request, ctx).map(|value| value.map(|v| Box::new(v) as Value))
            },
        );
        let key = TypeKey::of::<T>();
        self.types.insert(key.id(), (key, erased));
        self
    }

    /// Replaces the method resolver.
    pub fn register_method<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Fn(&MethodGuard, &dyn HttpRequest) -> MatchResult<()> + Send + Sync + 'static,
    {
        self.method = Arc::new(resolver);
        self
    }

    /// Returns `true` if parameters declared as `key` have their own resolver.
    pub fn handles_type(&self, key: TypeKey) -> bool {
        self.types.contains_key(&key.id())
    }

    pub fn handles_kind(&self, kind: GuardKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    pub(crate) fn method_resolver(&self) -> MethodResolver {
        Arc::clone(&self.method)
    }

    /// Picks the resolver for parameter `name` guarded as `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteConfigError::UnresolvableGuard`] when no resolver applies.
    pub fn select(
        &self,
        name: &str,
        kind: GuardKind,
        declared: &DeclaredType,
    ) -> RouteConfigResult<Resolver> {
        if declared.explicit().is_none()
            && let Some((_, resolver)) = self.types.get(&declared.key().id())
        {
            return Ok(Arc::clone(resolver));
        }
        self.kinds
            .get(&kind)
            .cloned()
            .ok_or_else(|| RouteConfigError::UnresolvableGuard {
                name: name.to_owned(),
                kind: kind.to_string(),
                type_name: declared.key().name(),
            })
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .field(
                "types",
                &self.types.values().map(|(key, _)| key).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
// Built-in resolvers
// ============================================================================

fn resolve_method(guard: &MethodGuard, request: &dyn HttpRequest) -> MatchResult<()> {
    if guard.accepts(request.method()) {
        Ok(())
    } else {
        Err(MatchFailure::MethodNotAllowed)
    }
}

fn resolve_path(guard: &ParamGuard, _request: &dyn HttpRequest, ctx: &RouteContext<'_>) -> Resolution {
    let invalid = || MatchFailure::InvalidPathParameter {
        name: guard.name().to_owned(),
    };
    let raw = ctx.path_param(guard.name()).ok_or_else(invalid)?;
    guard.parse(raw).map(Some).map_err(|_| invalid())
}

fn resolve_query(guard: &ParamGuard, request: &dyn HttpRequest, _ctx: &RouteContext<'_>) -> Resolution {
    let Some(raw) = request.query(guard.name()) else {
        if guard.is_optional() {
            return Ok(None);
        }
        return Err(MatchFailure::MissingQueryParameter {
            name: guard.name().to_owned(),
        });
    };
    guard
        .parse(&raw)
        .map(Some)
        .map_err(|e| MatchFailure::InvalidQueryParameter {
            name: guard.name().to_owned(),
            reason: e.to_string(),
        })
}

fn header_resolver(underscore_fallback: bool) -> Resolver {
    Arc::new(
        move |guard: &ParamGuard, request: &dyn HttpRequest, _ctx: &RouteContext<'_>| {
            let name = guard.name().to_ascii_uppercase();
            let raw = request.header(&name).or_else(|| {
                underscore_fallback
                    .then(|| name.replace('_', "-"))
                    .filter(|alt| *alt != name)
                    .and_then(|alt| request.header(&alt))
            });
            let Some(raw) = raw else {
                if guard.is_optional() {
                    return Ok(None);
                }
                return Err(MatchFailure::MissingHeader { name });
            };
            guard
                .parse(raw)
                .map(Some)
                .map_err(|e| MatchFailure::InvalidHeader {
                    name,
                    reason: e.to_string(),
                })
        },
    )
}

fn body_resolver(max_body_bytes: Option<usize>) -> Resolver {
    Arc::new(
        move |guard: &ParamGuard, request: &dyn HttpRequest, _ctx: &RouteContext<'_>| {
            let body = request.body();
            if let Some(limit) = max_body_bytes
                && body.len() > limit
            {
                return Err(MatchFailure::invalid_body(format!(
                    "{} bytes exceeds the limit of {limit}",
                    body.len()
                )));
            }
            if body.is_empty() && guard.is_optional() {
                return Ok(None);
            }

            match guard.declared().shape() {
                Shape::Schema(decode) => decode(body)
                    .map(Some)
                    .map_err(|e| MatchFailure::invalid_body(e.to_string())),
                Shape::Scalar | Shape::Extension => {
                    let text = std::str::from_utf8(body)
                        .map_err(|e| MatchFailure::invalid_body(e.to_string()))?;
                    guard
                        .parse(text)
                        .map(Some)
                        .map_err(|e| MatchFailure::invalid_body(e.to_string()))
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Parameter, Query};
    use routerific_core::{ParserRegistry, PathTemplate, Request};

    fn bind(resolvers: &Resolvers, name: &str, kind: GuardKind, declared: DeclaredType) -> ParamGuard {
        let parser = ParserRegistry::new().build(declared.key(), &[]).ok();
        let resolver = resolvers.select(name, kind, &declared).unwrap();
        ParamGuard::new(name.to_owned(), kind, declared, parser, resolver)
    }

    fn resolve(guard: &ParamGuard, request: &Request) -> Resolution {
        let template = PathTemplate::compile("/t").unwrap();
        let params = template.matches("/t").unwrap();
        guard.resolve(request, &RouteContext::new(&params, &template))
    }

    fn int(resolution: Resolution) -> i64 {
        *resolution.unwrap().unwrap().downcast::<i64>().unwrap()
    }

    #[test]
    fn test_type_resolver_beats_inferred_kind() {
        let mut resolvers = Resolvers::default();
        resolvers.register_type::<i64, _>(|_, _, _| Ok(Some(9)));

        let guard = bind(&resolvers, "n", GuardKind::Query, i64::declared());
        assert_eq!(int(resolve(&guard, &Request::get("/t?n=4"))), 9);
    }

    #[test]
    fn test_marker_beats_type_resolver() {
        let mut resolvers = Resolvers::default();
        resolvers.register_type::<i64, _>(|_, _, _| Ok(Some(9)));

        let guard = bind(&resolvers, "n", GuardKind::Query, Query::<i64>::declared());
        assert_eq!(int(resolve(&guard, &Request::get("/t?n=4"))), 4);
    }

    #[test]
    fn test_unknown_kind_is_unresolvable() {
        let resolvers = Resolvers::default();
        let err = resolvers
            .select("sid", GuardKind::Custom("cookie"), &String::declared())
            .err()
            .unwrap();
        assert!(matches!(err, RouteConfigError::UnresolvableGuard { .. }));
        assert!(!resolvers.handles_kind(GuardKind::Custom("cookie")));
        assert!(resolvers.handles_kind(GuardKind::Header));
    }

    #[test]
    fn test_optional_query() {
        let resolvers = Resolvers::default();
        let guard = bind(&resolvers, "page", GuardKind::Query, Option::<i64>::declared());

        assert!(resolve(&guard, &Request::get("/t")).unwrap().is_none());
        assert_eq!(int(resolve(&guard, &Request::get("/t?page=2"))), 2);
        assert!(matches!(
            resolve(&guard, &Request::get("/t?page=two")),
            Err(MatchFailure::InvalidQueryParameter { .. })
        ));
    }

    #[test]
    fn test_header_underscore_fallback() {
        let request = Request::get("/t").with_header("x-token", "abc");

        let resolvers = Resolvers::default();
        let guard = bind(&resolvers, "x_token", GuardKind::Header, String::declared());
        let value = resolve(&guard, &request).unwrap().unwrap();
        assert_eq!(*value.downcast::<String>().unwrap(), "abc");

        let resolvers = Resolvers::new(&RouterOptions::new().header_underscore_fallback(false));
        let guard = bind(&resolvers, "x_token", GuardKind::Header, String::declared());
        assert!(matches!(
            resolve(&guard, &request),
            Err(MatchFailure::MissingHeader { .. })
        ));
    }

    #[test]
    fn test_body_limit() {
        let resolvers = Resolvers::new(&RouterOptions::new().max_body_bytes(4));
        let guard = bind(&resolvers, "n", GuardKind::Body, i64::declared());

        assert_eq!(int(resolve(&guard, &Request::post("/t").with_body("42"))), 42);
        assert!(resolve(&guard, &Request::post("/t").with_body("123456")).is_err());
    }

    #[test]
    fn test_method_resolver() {
        let resolvers = Resolvers::default();
        let guard = MethodGuard::new("post", resolvers.method_resolver()).unwrap();

        assert_eq!(guard.method(), "POST");
        assert!(guard.resolve(&Request::post("/t")).is_ok());
        assert!(matches!(
            guard.resolve(&Request::get("/t")),
            Err(MatchFailure::MethodNotAllowed)
        ));
    }
}
