//! Views: a named handler plus the metadata needed to register it.

use std::collections::HashSet;
use std::fmt;

use routerific_core::{Expr, RouteConfigError, RouteConfigResult};

use crate::error::ArgumentError;
use crate::handler::{Arguments, BoxedHandler, Handler, into_handler};
use crate::param::DeclaredType;

/// A handler with its name, parameter names, constraints and queued routes.
///
/// Parameter names are supplied explicitly since Rust closures carry none; the
/// `#[route]` attribute fills them in from the function signature.
///
/// ```rust,ignore
/// let view = View::new("detail", |id: i64| format!("post {id}"))
///     .params(["id"])
///     .constrain("id", Expr::gt(0))
///     .route("GET", "/blog/<int:id>");
/// ```
pub struct View<R> {
    name: String,
    handler: BoxedHandler<R>,
    declared: Vec<DeclaredType>,
    names: Vec<String>,
    constraints: Vec<(String, Expr)>,
    routes: Vec<(String, String)>,
}

impl<R: 'static> View<R> {
    /// Wraps `handler` under `name`, the view's identity within a router.
    pub fn new<H, T>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, R>,
        T: 'static,
    {
        Self {
            name: name.into(),
            declared: H::parameters(),
            handler: into_handler(handler),
            names: Vec::new(),
            constraints: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl<R> View<R> {
    /// Names the handler parameters, in order.
    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a constraint on parameter `name`. Several constraints are and-combined.
    pub fn constrain(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.constraints.push((name.into(), expr));
        self
    }

    /// Queues a route registered together with the view.
    pub fn route(mut self, method: impl Into<String>, template: impl Into<String>) -> Self {
        self.routes.push((method.into(), template.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    /// Queued `(method, template)` pairs.
    pub fn routes(&self) -> &[(String, String)] {
        &self.routes
    }

    /// Calls the handler.
    pub fn call(&self, args: Arguments) -> Result<R, ArgumentError> {
        (self.handler)(args)
    }

    pub(crate) fn take_routes(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.routes)
    }

    /// Constraints declared for `name`, in declaration order.
    pub(crate) fn constraints_for(&self, name: &str) -> Vec<Expr> {
        self.constraints
            .iter()
            .filter(|(target, _)| target == name)
            .map(|(_, expr)| expr.clone())
            .collect()
    }

    /// Pairs parameter names with declared types after checking them.
    pub(crate) fn parameters(&self) -> RouteConfigResult<Vec<(&str, &DeclaredType)>> {
        if self.names.len() != self.declared.len() {
            return Err(RouteConfigError::ParameterCountMismatch {
                view: self.name.clone(),
                declared: self.names.len(),
                expected: self.declared.len(),
            });
        }

        let mut seen = HashSet::new();
        for name in &self.names {
            if !seen.insert(name.as_str()) {
                return Err(RouteConfigError::DuplicateParameter {
                    view: self.name.clone(),
                    name: name.clone(),
                });
            }
        }
        if let Some((target, _)) = self
            .constraints
            .iter()
            .find(|(target, _)| !seen.contains(target.as_str()))
        {
            return Err(RouteConfigError::invalid_constraint(
                &self.name,
                target,
                "no such parameter",
            ));
        }

        Ok(self
            .names
            .iter()
            .map(String::as_str)
            .zip(self.declared.iter())
            .collect())
    }
}

impl<R> Clone for View<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: self.handler.clone(),
            declared: self.declared.clone(),
            names: self.names.clone(),
            constraints: self.constraints.clone(),
            routes: self.routes.clone(),
        }
    }
}

impl<R> fmt::Debug for View<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("params", &self.names)
            .field("constraints", &self.constraints)
            .field("routes", &self.routes)
            .finish()
    }
}

/// Anything that can become a [`View`].
///
/// Implemented by `View` itself and by the types `#[route]` generates.
pub trait IntoView<R> {
    fn into_view(self) -> View<R>;
}

impl<R> IntoView<R> for View<R> {
    fn into_view(self) -> View<R> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_pair_names_and_types() {
        let view = View::new("detail", |_id: i64, _q: String| ()).params(["id", "q"]);
        let params = view.parameters().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0, "id");
        assert_eq!(params[1].0, "q");
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let view = View::new("detail", |_id: i64| ()).params(["id", "extra"]);
        assert!(matches!(
            view.parameters().unwrap_err(),
            RouteConfigError::ParameterCountMismatch {
                declared: 2,
                expected: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_parameter() {
        let view = View::new("detail", |_a: i64, _b: i64| ()).params(["id", "id"]);
        assert!(matches!(
            view.parameters().unwrap_err(),
            RouteConfigError::DuplicateParameter { .. }
        ));
    }

    #[test]
    fn test_constraint_on_unknown_parameter() {
        let view = View::new("detail", |_id: i64| ())
            .params(["id"])
            .constrain("nope", Expr::gt(0));
        assert!(matches!(
            view.parameters().unwrap_err(),
            RouteConfigError::InvalidConstraint { .. }
        ));
    }

    #[test]
    fn test_constraints_for_and_routes() {
        let mut view = View::new("detail", |id: i64| id)
            .params(["id"])
            .constrain("id", Expr::gt(0))
            .constrain("id", Expr::lt(100))
            .route("GET", "/blog/<int:id>");
        assert_eq!(view.constraints_for("id").len(), 2);
        assert_eq!(view.routes().len(), 1);
        assert_eq!(view.take_routes().len(), 1);
        assert!(view.routes().is_empty());
    }
}
