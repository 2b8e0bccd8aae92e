//! Guards: compiled checks run against a request for one candidate route.
//!
//! A route variant is a [`ViewGuard`]: a path template plus an ordered list of
//! [`Guard`]s, the method guard first and then one [`ParamGuard`] per handler
//! parameter. Each parameter guard carries the resolver chosen for it at registration
//! and either yields the parameter's value or fails softly with a [`MatchFailure`].

use std::fmt;

use routerific_core::{
    HttpRequest, MatchFailure, MatchResult, ParseError, Parser, PathParams, PathTemplate,
    RouteConfigError, RouteConfigResult, Value,
};

use crate::handler::Arguments;
use crate::param::DeclaredType;
use crate::resolver::{MethodResolver, Resolution, Resolver};

/// Where a parameter guard reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardKind {
    /// A captured path placeholder.
    Path,
    /// A query-string parameter.
    Query,
    /// A request header.
    Header,
    /// The whole request body.
    Body,
    /// A declared type resolved by its own registered resolver.
    Bare,
    /// A kind defined outside this crate, resolved by a registered kind resolver.
    Custom(&'static str),
}

impl GuardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
            Self::Bare => "bare",
            Self::Custom(name) => name,
        }
    }

    /// Kinds that always turn a raw string into a value.
    pub(crate) fn needs_parser(self) -> bool {
        matches!(self, Self::Path | Self::Query | Self::Header)
    }
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-candidate state handed to parameter resolvers.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    params: &'a PathParams,
    template: &'a PathTemplate,
}

impl<'a> RouteContext<'a> {
    pub fn new(params: &'a PathParams, template: &'a PathTemplate) -> Self {
        Self { params, template }
    }

    /// Raw value captured for a placeholder.
    pub fn path_param(&self, name: &str) -> Option<&'a str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &'a PathParams {
        self.params
    }

    /// Template of the candidate being tried.
    pub fn template(&self) -> &'a PathTemplate {
        self.template
    }
}

// ============================================================================
// MethodGuard
// ============================================================================

/// Accepts requests with one method, compared case-insensitively.
#[derive(Clone)]
pub struct MethodGuard {
    method: String,
    resolver: MethodResolver,
}

impl MethodGuard {
    pub(crate) fn new(method: &str, resolver: MethodResolver) -> RouteConfigResult<Self> {
        let parsed = http::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| RouteConfigError::InvalidMethod(method.to_owned()))?;
        Ok(Self {
            method: parsed.as_str().to_owned(),
            resolver,
        })
    }

    /// Expected method, upper case.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn accepts(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }

    pub fn resolve(&self, request: &dyn HttpRequest) -> MatchResult<()> {
        (self.resolver)(self, request)
    }
}

impl fmt::Debug for MethodGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MethodGuard").field(&self.method).finish()
    }
}

// ============================================================================
// ParamGuard
// ============================================================================

/// Produces the value of one handler parameter.
#[derive(Clone)]
pub struct ParamGuard {
    name: String,
    kind: GuardKind,
    declared: DeclaredType,
    parser: Option<Parser>,
    resolver: Resolver,
}

impl ParamGuard {
    pub(crate) fn new(
        name: String,
        kind: GuardKind,
        declared: DeclaredType,
        parser: Option<Parser>,
        resolver: Resolver,
    ) -> Self {
        Self {
            name,
            kind,
            declared,
            parser,
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    pub fn declared(&self) -> &DeclaredType {
        &self.declared
    }

    /// Parser built for this parameter, constraints included.
    pub fn parser(&self) -> Option<&Parser> {
        self.parser.as_ref()
    }

    /// `true` if the kind came from a marker rather than inference.
    pub fn is_explicit(&self) -> bool {
        self.declared.explicit().is_some()
    }

    pub fn is_optional(&self) -> bool {
        self.declared.is_optional()
    }

    /// Parses a raw string with this parameter's parser.
    pub fn parse(&self, raw: &str) -> Result<Value, ParseError> {
        match &self.parser {
            Some(parser) => parser.parse(raw),
            None => Err(ParseError::new(format!(
                "no parser for '{}'",
                self.declared.key()
            ))),
        }
    }

    /// Runs the bound resolver.
    ///
    /// A resolver answering "no value" for a required parameter fails the match.
    pub fn resolve(&self, request: &dyn HttpRequest, ctx: &RouteContext<'_>) -> Resolution {
        let value = (self.resolver)(self, request, ctx)?;
        if value.is_none() && !self.is_optional() {
            return Err(MatchFailure::custom(format!(
                "no value for parameter '{}'",
                self.name
            )));
        }
        Ok(value)
    }
}

impl fmt::Debug for ParamGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamGuard")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type", &self.declared.key())
            .field("explicit", &self.is_explicit())
            .field("optional", &self.is_optional())
            .finish()
    }
}

// ============================================================================
// ViewGuard
// ============================================================================

/// Any guard in a route's sequence.
#[derive(Debug, Clone)]
pub enum Guard {
    Method(MethodGuard),
    Param(ParamGuard),
}

/// One compiled route variant of a view.
#[derive(Debug, Clone)]
pub struct ViewGuard {
    template: PathTemplate,
    guards: Vec<Guard>,
}

impl ViewGuard {
    pub(crate) fn new(template: PathTemplate, method: MethodGuard, params: Vec<ParamGuard>) -> Self {
        let guards = std::iter::once(Guard::Method(method))
            .chain(params.into_iter().map(Guard::Param))
            .collect();
        Self { template, guards }
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Expected method of this variant.
    pub fn method(&self) -> &str {
        self.guards
            .iter()
            .find_map(|guard| match guard {
                Guard::Method(method) => Some(method.method()),
                Guard::Param(_) => None,
            })
            .unwrap_or_default()
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    /// Parameter guards, in handler declaration order.
    pub fn params(&self) -> impl Iterator<Item = &ParamGuard> {
        self.guards.iter().filter_map(|guard| match guard {
            Guard::Param(param) => Some(param),
            Guard::Method(_) => None,
        })
    }

    /// Returns `true` for the same method and template.
    pub fn is_route(&self, method: &str, template: &str) -> bool {
        self.method().eq_ignore_ascii_case(method) && self.template.as_str() == template
    }

    /// Matches the template, then runs every guard in order.
    ///
    /// Returns `Ok(None)` when the path does not match at all, and the first soft
    /// failure when a guard rejects the request.
    pub fn resolve(&self, request: &dyn HttpRequest) -> MatchResult<Option<Arguments>> {
        let Some(params) = self.template.matches(&request.path()) else {
            return Ok(None);
        };
        let ctx = RouteContext::new(&params, &self.template);

        let mut args = Arguments::with_capacity(self.guards.len().saturating_sub(1));
        for guard in &self.guards {
            match guard {
                Guard::Method(method) => method.resolve(request)?,
                Guard::Param(param) => {
                    let value = param.resolve(request, &ctx)?;
                    args.push(param.name(), value);
                }
            }
        }
        Ok(Some(args))
    }
}
