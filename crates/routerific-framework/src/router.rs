//! The request router.
//!
//! A [`Router`] holds views in registration order, each with its compiled route
//! variants. Matching walks the views in order and, within a view, its variants in
//! order; the first variant whose template matches and whose guards all succeed wins.
//!
//! Guard failures are soft: they are logged and the next candidate is tried. When no
//! candidate accepts the request, [`Router::dispatch`] returns the handler type's
//! [`Responder::not_found`] value.
//!
//! ```rust,ignore
//! let mut builder = Router::builder();
//! builder.route("GET", "/blog/<int:id>", View::new("detail", detail).params(["id"]))?;
//! let router = builder.build();
//!
//! let response = router.dispatch(&Request::get("/blog/123"))?;
//! ```

use tracing::{Level, debug, span, trace};

use routerific_core::{HttpRequest, MatchFailure};

use crate::builder::RouterBuilder;
use crate::error::{DispatchError, DispatchResult};
use crate::guard::ViewGuard;
use crate::handler::{Arguments, Responder};
use crate::options::RouterOptions;
use crate::service::RouterService;
use crate::view::View;

/// A registered view together with its compiled route variants.
pub(crate) struct Entry<R> {
    pub(crate) view: View<R>,
    pub(crate) guards: Vec<ViewGuard>,
}

/// One row of the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfo<'a> {
    pub view: &'a str,
    pub method: &'a str,
    pub template: &'a str,
}

/// A request accepted by a route, with the handler arguments resolved.
pub struct RouterMatch<'r, R> {
    view: &'r View<R>,
    guard: &'r ViewGuard,
    args: Arguments,
}

impl<'r, R> RouterMatch<'r, R> {
    pub fn view_name(&self) -> &'r str {
        self.view.name()
    }

    /// Template of the accepting route variant.
    pub fn template(&self) -> &'r str {
        self.guard.template().as_str()
    }

    pub fn method(&self) -> &'r str {
        self.guard.method()
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }

    pub fn into_args(self) -> Arguments {
        self.args
    }

    /// Calls the view's handler with the resolved arguments.
    pub fn call(self) -> DispatchResult<R> {
        self.view.call(self.args).map_err(|source| DispatchError {
            view: self.view.name().to_owned(),
            source,
        })
    }
}

impl<R> std::fmt::Debug for RouterMatch<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterMatch")
            .field("view", &self.view.name())
            .field("template", &self.template())
            .field("args", &self.args)
            .finish()
    }
}

/// The routing table.
///
/// Immutable once built; share it behind an `Arc` or turn it into a
/// [`RouterService`] to serve requests from several tasks.
pub struct Router<R> {
    entries: Vec<Entry<R>>,
    options: RouterOptions,
}

impl<R: 'static> Router<R> {
    /// Starts a builder with default options.
    pub fn builder() -> RouterBuilder<R> {
        RouterBuilder::new()
    }
}

impl<R> Router<R> {
    pub(crate) fn from_entries(entries: Vec<Entry<R>>, options: RouterOptions) -> Self {
        Self { entries, options }
    }

    /// Finds the first route accepting `request` and resolves its arguments.
    pub fn match_request<Q: HttpRequest>(&self, request: &Q) -> Option<RouterMatch<'_, R>> {
        self.find(request)
    }

    fn find(&self, request: &dyn HttpRequest) -> Option<RouterMatch<'_, R>> {
        for entry in &self.entries {
            for guard in &entry.guards {
                match guard.resolve(request) {
                    Ok(Some(args)) => {
                        debug!(
                            view = entry.view.name(),
                            template = guard.template().as_str(),
                            "Route matched"
                        );
                        return Some(RouterMatch {
                            view: &entry.view,
                            guard,
                            args,
                        });
                    }
                    Ok(None) => {}
                    Err(failure) => self.reject(entry.view.name(), guard, &failure),
                }
            }
        }
        None
    }

    fn reject(&self, view: &str, guard: &ViewGuard, failure: &MatchFailure) {
        let template = guard.template().as_str();
        if self.options.log_rejections {
            debug!(view, template, reason = %failure, "Route rejected request");
        } else {
            trace!(view, template, reason = %failure, "Route rejected request");
        }
    }

    /// Routes `request` and calls the matched handler.
    ///
    /// Returns `R::not_found()` when no route accepts the request.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when a resolver produced a value of the wrong type for
    /// the handler.
    pub fn dispatch<Q: HttpRequest>(&self, request: &Q) -> DispatchResult<R>
    where
        R: Responder,
    {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            method = request.method(),
            path = %request.path()
        );
        let _enter = span.enter();

        match self.find(request) {
            Some(matched) => matched.call(),
            None => {
                debug!("No route matched, returning not-found");
                Ok(R::not_found())
            }
        }
    }

    /// All routes, in matching order.
    pub fn routes(&self) -> impl Iterator<Item = RouteInfo<'_>> {
        self.entries.iter().flat_map(|entry| {
            entry.guards.iter().map(move |guard| RouteInfo {
                view: entry.view.name(),
                method: guard.method(),
                template: guard.template().as_str(),
            })
        })
    }

    /// Looks up a view by name.
    pub fn view(&self, name: &str) -> Option<&View<R>> {
        self.entries
            .iter()
            .map(|entry| &entry.view)
            .find(|view| view.name() == name)
    }

    /// Compiled route variants of the view named `name`.
    pub fn view_guards(&self, name: &str) -> Option<&[ViewGuard]> {
        self.entries
            .iter()
            .find(|entry| entry.view.name() == name)
            .map(|entry| entry.guards.as_slice())
    }

    pub fn view_count(&self) -> usize {
        self.entries.len()
    }

    pub fn route_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.guards.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.route_count() == 0
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Wraps the router in a `tower::Service`.
    pub fn into_service(self) -> RouterService<R> {
        RouterService::from(self)
    }
}

impl<R> std::fmt::Debug for Router<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("view_count", &self.view_count())
            .field("route_count", &self.route_count())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Header, Parameter, Schema};
    use routerific_core::{Expr, Request};
    use serde::Deserialize;

    fn blog_router() -> Router<String> {
        let mut builder = RouterBuilder::new();
        builder
            .route(
                "GET",
                "/blog/<int:id>",
                View::new("detail", |id: i64| format!("detail {id}")).params(["id"]),
            )
            .unwrap();
        builder
            .route(
                "GET",
                "/blog/<slug:slug>",
                View::new("by_slug", |slug: String| format!("slug {slug}")).params(["slug"]),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_typed_placeholder_dispatch() {
        let router = blog_router();
        assert_eq!(router.dispatch(&Request::get("/blog/123")).unwrap(), "detail 123");

        let matched = router.match_request(&Request::get("/blog/123")).unwrap();
        assert_eq!(matched.view_name(), "detail");
        assert_eq!(matched.args().get::<i64>("id"), Some(&123));

        let matched = router.match_request(&Request::get("/blog/abc")).unwrap();
        assert_eq!(matched.view_name(), "by_slug");
    }

    #[test]
    fn test_no_route_is_not_found() {
        let router = blog_router();
        assert!(router.match_request(&Request::get("/other/123")).is_none());
        assert_eq!(router.dispatch(&Request::get("/other/123")).unwrap(), "404 Not Found");
        assert!(router.match_request(&Request::get("/blog/123/")).is_none());
    }

    #[test]
    fn test_list_and_detail_without_fallback() {
        let mut builder = RouterBuilder::new();
        builder
            .route("GET", "/blog/", View::new("list", || "list".to_string()))
            .unwrap();
        builder
            .route(
                "GET",
                "/blog/<int:id>",
                View::new("detail", |id: i64| format!("detail {id}")).params(["id"]),
            )
            .unwrap();
        let router = builder.build();

        assert_eq!(router.dispatch(&Request::get("/blog/")).unwrap(), "list");
        assert_eq!(router.dispatch(&Request::get("/blog/123")).unwrap(), "detail 123");
        assert!(router.match_request(&Request::get("/blog/abc")).is_none());
        assert_eq!(
            router.dispatch(&Request::get("/blog/abc")).unwrap(),
            "404 Not Found"
        );
    }

    #[test]
    fn test_constraint_rejection_is_not_found() {
        let mut builder = RouterBuilder::new();
        builder
            .route(
                "GET",
                "/items/<id>",
                View::new("positive", |id: i64| format!("item {id}"))
                    .params(["id"])
                    .constrain("id", Expr::gt(0)),
            )
            .unwrap();
        let router = builder.build();

        assert_eq!(router.dispatch(&Request::get("/items/5")).unwrap(), "item 5");
        assert!(router.match_request(&Request::get("/items/-5")).is_none());
        assert_eq!(
            router.dispatch(&Request::get("/items/-5")).unwrap(),
            "404 Not Found"
        );
    }

    #[test]
    fn test_method_mismatch_falls_through() {
        let mut builder = RouterBuilder::new();
        builder
            .route("POST", "/blog", View::new("create", || "create".to_string()))
            .unwrap();
        builder
            .route("GET", "/blog", View::new("list", || "list".to_string()))
            .unwrap();
        let router = builder.build();

        assert_eq!(router.dispatch(&Request::get("/blog")).unwrap(), "list");
        assert_eq!(router.dispatch(&Request::post("/blog")).unwrap(), "create");
        assert_eq!(
            router.dispatch(&Request::delete("/blog")).unwrap(),
            "404 Not Found"
        );
    }

    #[test]
    fn test_missing_query_rejects() {
        let mut builder = RouterBuilder::new();
        builder
            .route(
                "GET",
                "/search",
                View::new("search", |q: String| format!("search {q}")).params(["q"]),
            )
            .unwrap();
        let router = builder.build();

        assert!(router.match_request(&Request::get("/search")).is_none());
        assert_eq!(
            router.dispatch(&Request::get("/search?q=rust")).unwrap(),
            "search rust"
        );
        assert_eq!(
            router.dispatch(&Request::get("/search?q=a&q=b")).unwrap(),
            "search b"
        );
    }

    #[test]
    fn test_optional_query() {
        let mut builder = RouterBuilder::new();
        builder
            .route(
                "GET",
                "/list",
                View::new("list", |page: Option<i64>| format!("page {}", page.unwrap_or(1)))
                    .params(["page"]),
            )
            .unwrap();
        let router = builder.build();

        assert_eq!(router.dispatch(&Request::get("/list")).unwrap(), "page 1");
        assert_eq!(router.dispatch(&Request::get("/list?page=3")).unwrap(), "page 3");
        assert_eq!(
            router.dispatch(&Request::get("/list?page=x")).unwrap(),
            "404 Not Found"
        );
    }

    #[test]
    fn test_constraint_rejects_then_next_route() {
        let mut builder = RouterBuilder::new();
        builder
            .route(
                "GET",
                "/items/<id>",
                View::new("positive", |id: i64| format!("item {id}"))
                    .params(["id"])
                    .constrain("id", Expr::gt(0)),
            )
            .unwrap();
        builder
            .route(
                "GET",
                "/items/<id>",
                View::new("fallback", |id: String| format!("raw {id}")).params(["id"]),
            )
            .unwrap();
        let router = builder.build();

        assert_eq!(router.dispatch(&Request::get("/items/5")).unwrap(), "item 5");
        assert_eq!(router.dispatch(&Request::get("/items/-5")).unwrap(), "raw -5");
    }

    #[test]
    fn test_header_guard() {
        let mut builder = RouterBuilder::new();
        builder
            .route(
                "GET",
                "/me",
                View::new("me", |x_token: Header<String>| x_token.into_inner())
                    .params(["x_token"]),
            )
            .unwrap();
        let router = builder.build();

        let request = Request::get("/me").with_header("X-Token", "abc");
        assert_eq!(router.dispatch(&request).unwrap(), "abc");
        assert!(router.match_request(&Request::get("/me")).is_none());
    }

    #[test]
    fn test_header_without_underscore_fallback() {
        let options = RouterOptions::new().header_underscore_fallback(false);
        let mut builder = RouterBuilder::with_options(options);
        builder
            .route(
                "GET",
                "/me",
                View::new("me", |x_token: Header<String>| x_token.into_inner())
                    .params(["x_token"]),
            )
            .unwrap();
        let router = builder.build();

        let request = Request::get("/me").with_header("X-Token", "abc");
        assert!(router.match_request(&request).is_none());
        let request = Request::get("/me").with_header("X_TOKEN", "abc");
        assert_eq!(router.dispatch(&request).unwrap(), "abc");
    }

    #[derive(Debug, Deserialize)]
    struct NewPost {
        title: String,
    }

    impl Schema for NewPost {
        fn validate(&self) -> Result<(), String> {
            if self.title.trim().is_empty() {
                return Err("title must not be empty".into());
            }
            Ok(())
        }
    }

    impl Parameter for NewPost {
        fn declared() -> crate::param::DeclaredType {
            crate::param::DeclaredType::schema::<Self>()
        }
    }

    #[test]
    fn test_body_schema() {
        let options = RouterOptions::new().max_body_bytes(64);
        let mut builder = RouterBuilder::with_options(options);
        builder
            .route(
                "POST",
                "/blog",
                View::new("create", |post: NewPost| format!("created {}", post.title))
                    .params(["post"]),
            )
            .unwrap();
        let router = builder.build();

        let request = Request::post("/blog").with_body(r#"{"title": "Hello"}"#);
        assert_eq!(router.dispatch(&request).unwrap(), "created Hello");

        let request = Request::post("/blog").with_body(r#"{"title": " "}"#);
        assert!(router.match_request(&request).is_none());

        let request = Request::post("/blog").with_body("{");
        assert!(router.match_request(&request).is_none());

        let long = format!(r#"{{"title": "{}"}}"#, "x".repeat(80));
        let request = Request::post("/blog").with_body(long);
        assert!(router.match_request(&request).is_none());
    }

    #[test]
    fn test_wrong_resolver_type_is_dispatch_error() {
        struct Session(String);

        impl Parameter for Session {
            fn declared() -> crate::param::DeclaredType {
                crate::param::DeclaredType::extension::<Self>()
            }
        }

        let mut builder = RouterBuilder::new();
        builder.resolver_kind(crate::guard::GuardKind::Bare, |_, _, _| {
            Ok(Some(Box::new(42_i64) as routerific_core::Value))
        });
        builder.resolver_for::<Session, _>(|_, _, _| Ok(Some(Session("s".into()))));
        builder
            .route(
                "GET",
                "/s",
                View::new("session", |s: Session| s.0).params(["s"]),
            )
            .unwrap();
        let router = builder.build();
        assert_eq!(router.dispatch(&Request::get("/s")).unwrap(), "s");

        let mut builder = RouterBuilder::new();
        builder.resolver_kind(
            crate::guard::GuardKind::Custom("session"),
            |_, _, _| Ok(Some(Box::new(42_i64) as routerific_core::Value)),
        );
        struct Pinned(String);
        impl Parameter for Pinned {
            fn declared() -> crate::param::DeclaredType {
                crate::param::DeclaredType::extension::<Self>()
                    .at(crate::guard::GuardKind::Custom("session"))
            }
        }
        builder
            .route(
                "GET",
                "/s",
                View::new("pinned", |s: Pinned| s.0).params(["s"]),
            )
            .unwrap();
        let router = builder.build();

        let err = router.dispatch(&Request::get("/s")).unwrap_err();
        assert_eq!(err.view, "pinned");
        assert!(matches!(
            err.source,
            crate::error::ArgumentError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_routes_listing() {
        let router = blog_router();
        let routes: Vec<_> = router.routes().collect();
        assert_eq!(routes.len(), 2);
        assert_eq!(
            routes[0],
            RouteInfo {
                view: "detail",
                method: "GET",
                template: "/blog/<int:id>",
            }
        );
        assert!(router.view("by_slug").is_some());
        assert_eq!(router.view_count(), 2);
        assert!(!router.is_empty());
    }
}
