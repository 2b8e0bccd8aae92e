//! Route registration.
//!
//! [`RouterBuilder`] turns views into compiled route variants. For every
//! `(view, method, template)` it:
//!
//! 1. compiles the template and the method guard,
//! 2. picks a guard kind per parameter: the marker's kind if there is one, else path
//!    when the name is a placeholder, else body for schema types, else the type's own
//!    resolver when one is registered, else query,
//! 3. builds the parameter's parser (with its constraints) and selects its resolver,
//! 4. checks that every placeholder is consumed by a path parameter.
//!
//! Every error here is a configuration error: nothing is registered and the caller is
//! expected to abort startup.

use tracing::{debug, info, trace};

use routerific_core::{
    Expr, HttpRequest, MatchResult, Parser, ParserRegistry, PathTemplate,
    RouteConfigError, RouteConfigResult,
};

use crate::guard::{GuardKind, MethodGuard, ParamGuard, RouteContext, ViewGuard};
use crate::options::RouterOptions;
use crate::param::{DeclaredType, Shape};
use crate::resolver::{Resolution, Resolvers};
use crate::router::{Entry, Router};
use crate::view::{IntoView, View};

/// Handle to a view registered in a [`RouterBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(usize);

/// Collects views and routes, then builds a [`Router`].
pub struct RouterBuilder<R> {
    options: RouterOptions,
    parsers: ParserRegistry,
    resolvers: Resolvers,
    entries: Vec<Entry<R>>,
}

impl<R: 'static> Default for RouterBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static> RouterBuilder<R> {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    /// Creates a builder whose built-in resolvers follow `options`.
    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            resolvers: Resolvers::new(&options),
            parsers: ParserRegistry::new(),
            options,
            entries: Vec::new(),
        }
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn parsers_mut(&mut self) -> &mut ParserRegistry {
        &mut self.parsers
    }

    pub fn resolvers(&self) -> &Resolvers {
        &self.resolvers
    }

    pub fn resolvers_mut(&mut self) -> &mut Resolvers {
        &mut self.resolvers
    }

    /// Registers a string parser for `T`. Affects routes registered afterwards.
    pub fn parser<T, F, E>(&mut self, parse: F) -> &mut Self
    where
        T: std::any::Any + Send,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: std::fmt::Display,
    {
        self.parsers.register::<T, F, E>(parse);
        self
    }

    /// Registers a resolver for every parameter declared as `T`.
    pub fn resolver_for<T, F>(&mut self, resolver: F) -> &mut Self
    where
        T: std::any::Any + Send,
        F: Fn(&ParamGuard, &dyn HttpRequest, &RouteContext<'_>) -> MatchResult<Option<T>>
            + Send
            + Sync
            + 'static,
    {
        self.resolvers.register_type::<T, F>(resolver);
        self
    }

    /// Registers the resolver for a guard kind, typically a [`GuardKind::Custom`] one.
    pub fn resolver_kind<F>(&mut self, kind: GuardKind, resolver: F) -> &mut Self
    where
        F: Fn(&ParamGuard, &dyn HttpRequest, &RouteContext<'_>) -> Resolution
            + Send
            + Sync
            + 'static,
    {
        self.resolvers.register_kind(kind, resolver);
        self
    }

    /// Adds a view and registers the routes queued on it.
    ///
    /// # Errors
    ///
    /// Fails if a view with the same name exists or any queued route is invalid.
    pub fn view(&mut self, view: impl IntoView<R>) -> RouteConfigResult<ViewId> {
        let mut view = view.into_view();
        if self.find(view.name()).is_some() {
            return Err(RouteConfigError::DuplicateView(view.name().to_owned()));
        }
        view.parameters()?;

        let routes = view.take_routes();
        let id = ViewId(self.entries.len());
        self.entries.push(Entry {
            view,
            guards: Vec::new(),
        });

        for (method, template) in routes {
            let added = self.add_route(id, &method, &template);
            if added.is_err() {
                self.entries.pop();
            }
            added?;
        }
        Ok(id)
    }

    /// Adds a view, discarding its handle.
    pub fn mount(&mut self, view: impl IntoView<R>) -> RouteConfigResult<&mut Self> {
        self.view(view)?;
        Ok(self)
    }

    /// Adds several views in order.
    pub fn include<I, V>(&mut self, views: I) -> RouteConfigResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: IntoView<R>,
    {
        for view in views {
            self.view(view)?;
        }
        Ok(self)
    }

    /// Adds a view and registers one more route for it.
    pub fn route(
        &mut self,
        method: &str,
        template: &str,
        view: impl IntoView<R>,
    ) -> RouteConfigResult<ViewId> {
        let id = self.view(view)?;
        let added = self.add_route(id, method, template);
        if added.is_err() {
            self.entries.truncate(id.0);
        }
        added.map(|()| id)
    }

    /// Registers `(method, template)` for a view already added.
    ///
    /// Registering the same pair twice for one view is a no-op.
    pub fn register(
        &mut self,
        id: ViewId,
        method: &str,
        template: &str,
    ) -> RouteConfigResult<&mut Self> {
        self.add_route(id, method, template)?;
        Ok(self)
    }

    fn add_route(&mut self, id: ViewId, method: &str, template: &str) -> RouteConfigResult<()> {
        let entry = self
            .entries
            .get(id.0)
            .ok_or(RouteConfigError::UnknownView(id.0))?;
        if entry.guards.iter().any(|guard| guard.is_route(method, template)) {
            trace!(view = entry.view.name(), method, template, "Route already registered");
            return Ok(());
        }

        let guard = self.compile(&entry.view, method, template)?;
        debug!(
            view = entry.view.name(),
            method = guard.method(),
            template,
            "Route registered"
        );
        self.entries[id.0].guards.push(guard);
        Ok(())
    }

    /// Handle of the view named `name`.
    pub fn find(&self, name: &str) -> Option<ViewId> {
        self.entries
            .iter()
            .position(|entry| entry.view.name() == name)
            .map(ViewId)
    }

    pub fn build(self) -> Router<R> {
        let router = Router::from_entries(self.entries, self.options);
        for route in router.routes() {
            debug!(view = route.view, method = route.method, template = route.template, "Route");
        }
        info!(
            views = router.view_count(),
            routes = router.route_count(),
            "Routing table loaded"
        );
        router
    }

    fn compile(&self, view: &View<R>, method: &str, template: &str) -> RouteConfigResult<ViewGuard> {
        let template = PathTemplate::compile(template)?;
        let method = MethodGuard::new(method, self.resolvers.method_resolver())?;

        let mut params = Vec::new();
        for (name, declared) in view.parameters()? {
            let kind = self.infer_kind(name, declared, &template);
            if kind == GuardKind::Path && !template.has_placeholder(name) {
                return Err(RouteConfigError::UnknownPathParameter {
                    view: view.name().to_owned(),
                    name: name.to_owned(),
                    template: template.as_str().to_owned(),
                });
            }

            let constraints = view.constraints_for(name);
            let parser = self.build_parser(view.name(), name, kind, declared, &constraints)?;
            let resolver = self.resolvers.select(name, kind, declared)?;
            trace!(view = view.name(), param = name, %kind, "Parameter guard bound");
            params.push(ParamGuard::new(
                name.to_owned(),
                kind,
                declared.clone(),
                parser,
                resolver,
            ));
        }

        for placeholder in template.placeholder_names() {
            let consumed = params
                .iter()
                .any(|param| param.kind() == GuardKind::Path && param.name() == placeholder);
            if !consumed {
                return Err(RouteConfigError::UnmatchedPlaceholder {
                    view: view.name().to_owned(),
                    name: placeholder.to_owned(),
                });
            }
        }

        Ok(ViewGuard::new(template, method, params))
    }

    fn infer_kind(&self, name: &str, declared: &DeclaredType, template: &PathTemplate) -> GuardKind {
        if let Some(kind) = declared.explicit() {
            return kind;
        }
        if template.has_placeholder(name) {
            GuardKind::Path
        } else if declared.is_schema() {
            GuardKind::Body
        } else if self.resolvers.handles_type(declared.key()) {
            GuardKind::Bare
        } else {
            GuardKind::Query
        }
    }

    fn build_parser(
        &self,
        view: &str,
        name: &str,
        kind: GuardKind,
        declared: &DeclaredType,
        constraints: &[Expr],
    ) -> RouteConfigResult<Option<Parser>> {
        let scalar = matches!(declared.shape(), Shape::Scalar);
        let required = kind.needs_parser() || (kind == GuardKind::Body && !declared.is_schema());
        if required || (scalar && self.parsers.contains(declared.key())) {
            return self.parsers.build(declared.key(), constraints).map(Some);
        }
        if !constraints.is_empty() {
            return Err(RouteConfigError::invalid_constraint(
                view,
                name,
                "only parameters parsed from text can be constrained",
            ));
        }
        Ok(None)
    }
}

impl<R> std::fmt::Debug for RouterBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("options", &self.options)
            .field("parsers", &self.parsers)
            .field("resolvers", &self.resolvers)
            .field("views", &self.entries.len())
            .finish()
    }
}
