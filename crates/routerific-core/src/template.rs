//! Path template compilation.
//!
//! A template is a URL path with named placeholders, written `<name>` or `<type:name>`:
//!
//! ```text
//! /blog/<int:id>
//! /files/<path:rest>
//! /users/<uuid:user>/posts/<slug:post>
//! ```
//!
//! Text between placeholders is regular-expression source, so templates written with
//! named groups (`/blog/(?P<id>\d+)`) compile unchanged. The compiled pattern always
//! matches the whole path.
//!
//! ```rust,ignore
//! use routerific_core::PathTemplate;
//!
//! let template = PathTemplate::compile("/blog/<int:id>")?;
//! let params = template.matches("/blog/123").unwrap();
//! assert_eq!(params.get("id"), Some("123"));
//! assert!(template.matches("/blog/abc").is_none());
//! ```

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use tracing::trace;

use crate::error::{RouteConfigError, RouteConfigResult};

// ============================================================================
// Placeholder types
// ============================================================================

/// Type tag of a placeholder, selecting the pattern its segment must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaceholderType {
    /// Any non-empty run without `/`. The default when no tag is given.
    #[default]
    Str,
    /// ASCII decimal digits.
    Int,
    /// Letters, digits, `-` and `_`.
    Slug,
    /// Lower-case hyphenated UUID.
    Uuid,
    /// Any non-empty text, `/` included.
    Path,
}

impl PlaceholderType {
    /// Looks up a type tag as written in a template.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "str" => Some(Self::Str),
            "int" => Some(Self::Int),
            "slug" => Some(Self::Slug),
            "uuid" => Some(Self::Uuid),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    /// The tag as written in a template.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Slug => "slug",
            Self::Uuid => "uuid",
            Self::Path => "path",
        }
    }

    /// Regular-expression fragment for this type.
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Str => "[^/]+",
            Self::Int => "[0-9]+",
            Self::Slug => "[a-zA-Z0-9_-]+",
            Self::Uuid => "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
            Self::Path => ".+",
        }
    }
}

impl fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Raw pattern text, copied into the compiled regex as is.
    Literal(String),
    /// A `<type:name>` placeholder.
    Placeholder {
        /// Placeholder name.
        name: String,
        /// Type tag.
        kind: PlaceholderType,
    },
}

// ============================================================================
// Captured parameters
// ============================================================================

/// Raw strings captured by a successful template match, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Returns the raw value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if `name` was captured.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// PathTemplate
// ============================================================================

/// A compiled, immutable path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
    regex: Regex,
    names: Vec<String>,
}

impl PathTemplate {
    /// Compiles a template into a full-match matcher.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteConfigError`] for an unknown type tag, a repeated placeholder
    /// name, a malformed placeholder, or text that is not a valid pattern.
    pub fn compile(template: &str) -> RouteConfigResult<Self> {
        let (segments, declared) = scan(template)?;

        let mut seen = HashSet::new();
        if let Some(name) = declared.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(RouteConfigError::DuplicatePlaceholder {
                template: template.to_owned(),
                name: name.clone(),
            });
        }

        let mut pattern = String::from("^(?:");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => pattern.push_str(text),
                Segment::Placeholder { name, kind } => {
                    pattern.push_str(&format!("(?P<{name}>{})", kind.pattern()));
                }
            }
        }
        pattern.push_str(")$");

        let regex = Regex::new(&pattern).map_err(|e| RouteConfigError::InvalidPattern {
            template: template.to_owned(),
            reason: e.to_string(),
        })?;
        let names: Vec<String> = regex.capture_names().flatten().map(String::from).collect();

        trace!(template, pattern = %pattern, placeholders = ?names, "Compiled path template");

        Ok(Self {
            source: template.to_owned(),
            segments,
            regex,
            names,
        })
    }

    /// Matches a whole path, returning the captured raw values.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let captures = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_owned()))
                })
                .collect(),
        )
    }

    /// Names of every placeholder and named group, in template order.
    pub fn placeholder_names(&self) -> &[String] {
        &self.names
    }

    /// Returns `true` if the template declares `name`.
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The compiled, anchored pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PathTemplate {}

// ============================================================================
// Scanner
// ============================================================================

/// Splits a template into literal regex text and placeholders, and returns every
/// capture name (placeholders and legacy groups) in template order.
///
/// A `<` starts a placeholder only when it is followed by placeholder characters
/// (`[A-Za-z0-9_:]`) up to a `>` or the end of the template. Any other `<` is regex text,
/// e.g. inside `[^<]` or `<>`.
fn scan(template: &str) -> RouteConfigResult<(Vec<Segment>, Vec<String>)> {
    let mut segments = Vec::new();
    let mut names = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(start) = rest.find('<') {
        literal.push_str(&rest[..start]);
        literal.push('<');
        let after = &rest[start + 1..];
        rest = after;

        let body_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(after.len());
        let body = &after[..body_len];

        // `(?P<name>` and `(?<name>` open a named group, not a placeholder.
        if literal.ends_with("(?P<") || literal.ends_with("(?<") {
            if after[body_len..].starts_with('>') && is_identifier(body) {
                names.push(body.to_owned());
            }
            continue;
        }

        if body_len == 0 {
            continue;
        }
        if !after[body_len..].starts_with('>') {
            if body_len == after.len() {
                return Err(RouteConfigError::malformed(
                    template,
                    "unterminated placeholder",
                ));
            }
            continue;
        }

        literal.pop();
        let (kind, name) = match body.split_once(':') {
            Some((tag, name)) => {
                let kind = PlaceholderType::from_tag(tag).ok_or_else(|| {
                    RouteConfigError::UnknownPlaceholderType {
                        template: template.to_owned(),
                        tag: tag.to_owned(),
                    }
                })?;
                (kind, name)
            }
            None => (PlaceholderType::Str, body),
        };
        if !is_identifier(name) {
            return Err(RouteConfigError::malformed(
                template,
                format!("'{name}' is not a valid placeholder name"),
            ));
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        names.push(name.to_owned());
        segments.push(Segment::Placeholder {
            name: name.to_owned(),
            kind,
        });
        rest = &after[body_len + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok((segments, names))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_placeholder() {
        let template = PathTemplate::compile("/blog/<int:id>").unwrap();
        assert_eq!(template.placeholder_names(), ["id"]);

        let params = template.matches("/blog/123").unwrap();
        assert_eq!(params.get("id"), Some("123"));
        assert!(template.matches("/blog/abc").is_none());
        assert!(template.matches("/blog/").is_none());
    }

    #[test]
    fn test_untyped_placeholder_defaults_to_str() {
        let template = PathTemplate::compile("/users/<name>").unwrap();
        assert!(matches!(
            template.segments()[1],
            Segment::Placeholder {
                kind: PlaceholderType::Str,
                ..
            }
        ));
        assert_eq!(
            template.matches("/users/alice").unwrap().get("name"),
            Some("alice")
        );
        assert!(template.matches("/users/alice/posts").is_none());
    }

    #[test]
    fn test_full_match_only() {
        let template = PathTemplate::compile("/blog/").unwrap();
        assert!(template.matches("/blog/").is_some());
        assert!(template.matches("/blog/extra").is_none());
        assert!(template.matches("/prefix/blog/").is_none());
    }

    #[test]
    fn test_slug_uuid_and_path_types() {
        let template =
            PathTemplate::compile("/u/<uuid:user>/<slug:post>/<path:rest>").unwrap();
        let params = template
            .matches("/u/67e55044-10b1-426f-9247-bb680e5fe0c8/hello-world_2/a/b/c.txt")
            .unwrap();
        assert_eq!(
            params.get("user"),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert_eq!(params.get("post"), Some("hello-world_2"));
        assert_eq!(params.get("rest"), Some("a/b/c.txt"));
        assert_eq!(params.len(), 3);

        assert!(template.matches("/u/not-a-uuid/post/x").is_none());
    }

    #[test]
    fn test_legacy_named_groups() {
        let template = PathTemplate::compile(r"/blog/(?P<id>\d+)/(?<slug>[a-z]+)").unwrap();
        assert_eq!(template.placeholder_names(), ["id", "slug"]);

        let params = template.matches("/blog/7/intro").unwrap();
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("slug"), Some("intro"));
    }

    #[test]
    fn test_mixed_legacy_and_placeholder() {
        let template = PathTemplate::compile(r"/(?P<year>[0-9]{4})/<slug:title>").unwrap();
        assert_eq!(template.placeholder_names(), ["year", "title"]);
        assert!(template.matches("/2024/hello").is_some());
        assert!(template.matches("/24/hello").is_none());
    }

    #[test]
    fn test_angle_bracket_inside_legacy_group() {
        let template = PathTemplate::compile(r"/x/(?P<id>[^<]+)").unwrap();
        assert_eq!(template.placeholder_names(), ["id"]);
        assert_eq!(template.matches("/x/a>b").unwrap().get("id"), Some("a>b"));
        assert!(template.matches("/x/a<b").is_none());

        let template = PathTemplate::compile(r"/x/(?P<op>[<>=]+)/<int:n>").unwrap();
        assert_eq!(template.placeholder_names(), ["op", "n"]);
        assert!(template.matches("/x/<=/3").is_some());

        let template = PathTemplate::compile("/cmp/<>").unwrap();
        assert!(template.placeholder_names().is_empty());
        assert!(template.matches("/cmp/<>").is_some());
    }

    #[test]
    fn test_unknown_type_tag() {
        let err = PathTemplate::compile("/blog/<float:x>").unwrap_err();
        assert!(matches!(
            err,
            RouteConfigError::UnknownPlaceholderType { ref tag, .. } if tag == "float"
        ));
    }

    #[test]
    fn test_duplicate_placeholder() {
        let err = PathTemplate::compile("/<int:id>/<id>").unwrap_err();
        assert!(matches!(
            err,
            RouteConfigError::DuplicatePlaceholder { ref name, .. } if name == "id"
        ));
    }

    #[test]
    fn test_placeholder_reusing_legacy_group_name() {
        let err = PathTemplate::compile(r"/(?P<id>\d+)/<id>").unwrap_err();
        assert!(matches!(
            err,
            RouteConfigError::DuplicatePlaceholder { ref name, .. } if name == "id"
        ));

        let err = PathTemplate::compile(r"/<int:id>/(?<id>\d+)").unwrap_err();
        assert!(matches!(err, RouteConfigError::DuplicatePlaceholder { .. }));
    }

    #[test]
    fn test_malformed_placeholders() {
        assert!(matches!(
            PathTemplate::compile("/blog/<int:id").unwrap_err(),
            RouteConfigError::MalformedPlaceholder { .. }
        ));
        assert!(matches!(
            PathTemplate::compile("/blog/<int:").unwrap_err(),
            RouteConfigError::MalformedPlaceholder { .. }
        ));
        assert!(matches!(
            PathTemplate::compile("/blog/<int:1st>").unwrap_err(),
            RouteConfigError::MalformedPlaceholder { .. }
        ));
    }

    #[test]
    fn test_invalid_literal_pattern() {
        let err = PathTemplate::compile("/blog/(unclosed").unwrap_err();
        assert!(matches!(err, RouteConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_display_round_trips_source() {
        let template = PathTemplate::compile("/blog/<int:id>").unwrap();
        assert_eq!(template.to_string(), "/blog/<int:id>");
        assert!(template.pattern().starts_with("^(?:"));
    }
}
