//! Constraint expressions refining parsed parameter values.
//!
//! An [`Expr`] is a small tree of predicates joined with `and`, `or` and `negate`.
//! It is compiled once, at route registration, into a plain [`Predicate`] closure that
//! runs after a value parsed successfully.
//!
//! ```rust,ignore
//! use routerific_core::Expr;
//!
//! // 0 < id <= 10_000, or exactly -1
//! let expr = Expr::gt(0).and(Expr::le(10_000)).or(Expr::eq(-1));
//! let predicate = expr.compile();
//! assert!(predicate(&5_i64));
//! assert!(!predicate(&0_i64));
//! ```
//!
//! Comparisons are typed: an integer literal only ever compares against integer values
//! and a string literal against textual values. A comparison between mismatched kinds is
//! `false`.

use std::any::Any;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use uuid::Uuid;

use crate::error::{RouteConfigError, RouteConfigResult};

/// A compiled constraint, evaluated against a parsed value.
pub type Predicate = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ne => ordering.is_ne(),
            Self::Lt => ordering.is_lt(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Ge => ordering.is_ge(),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Str(String),
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}

// ============================================================================
// Expr
// ============================================================================

/// A constraint expression tree.
#[derive(Clone)]
pub enum Expr {
    /// `value <op> literal`.
    Compare(CmpOp, Literal),
    /// `len(value) <op> n`, counted in characters.
    Length(CmpOp, usize),
    /// The textual value matches the regex anywhere.
    Matches(Regex),
    /// The value equals one of the literals.
    OneOf(Vec<Literal>),
    /// Arbitrary predicate.
    Custom(Predicate),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn eq(literal: impl Into<Literal>) -> Self {
        Self::Compare(CmpOp::Eq, literal.into())
    }

    pub fn ne(literal: impl Into<Literal>) -> Self {
        Self::Compare(CmpOp::Ne, literal.into())
    }

    pub fn lt(literal: impl Into<Literal>) -> Self {
        Self::Compare(CmpOp::Lt, literal.into())
    }

    pub fn le(literal: impl Into<Literal>) -> Self {
        Self::Compare(CmpOp::Le, literal.into())
    }

    pub fn gt(literal: impl Into<Literal>) -> Self {
        Self::Compare(CmpOp::Gt, literal.into())
    }

    pub fn ge(literal: impl Into<Literal>) -> Self {
        Self::Compare(CmpOp::Ge, literal.into())
    }

    /// At least `n` characters.
    pub fn min_len(n: usize) -> Self {
        Self::Length(CmpOp::Ge, n)
    }

    /// At most `n` characters.
    pub fn max_len(n: usize) -> Self {
        Self::Length(CmpOp::Le, n)
    }

    /// Textual value matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteConfigError::InvalidConstraintPattern`] if `pattern` does not
    /// compile.
    pub fn matches(pattern: &str) -> RouteConfigResult<Self> {
        Regex::new(pattern)
            .map(Self::Matches)
            .map_err(|e| RouteConfigError::InvalidConstraintPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })
    }

    pub fn one_of<I, L>(literals: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        Self::OneOf(literals.into_iter().map(Into::into).collect())
    }

    /// A predicate over values of type `T`. Values of any other type fail it.
    pub fn custom<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(move |value: &dyn Any| {
            value.downcast_ref::<T>().is_some_and(&f)
        }))
    }

    pub fn and(self, other: Expr) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Joins every expression with `and`. `None` when the input is empty.
    pub fn all<I: IntoIterator<Item = Expr>>(exprs: I) -> Option<Self> {
        exprs.into_iter().reduce(Expr::and)
    }

    /// Compiles the tree into a predicate.
    pub fn compile(&self) -> Predicate {
        match self {
            Self::Compare(op, literal) => {
                let (op, literal) = (*op, literal.clone());
                Arc::new(move |value: &dyn Any| compare(value, op, &literal))
            }
            Self::Length(op, n) => {
                let (op, n) = (*op, *n);
                Arc::new(move |value: &dyn Any| {
                    as_text(value).is_some_and(|text| op.holds(text.chars().count().cmp(&n)))
                })
            }
            Self::Matches(regex) => {
                let regex = regex.clone();
                Arc::new(move |value: &dyn Any| {
                    as_text(value).is_some_and(|text| regex.is_match(&text))
                })
            }
            Self::OneOf(literals) => {
                let literals = literals.clone();
                Arc::new(move |value: &dyn Any| {
                    literals
                        .iter()
                        .any(|literal| compare(value, CmpOp::Eq, literal))
                })
            }
            Self::Custom(predicate) => Arc::clone(predicate),
            Self::And(lhs, rhs) => {
                let (lhs, rhs) = (lhs.compile(), rhs.compile());
                Arc::new(move |value: &dyn Any| lhs(value) && rhs(value))
            }
            Self::Or(lhs, rhs) => {
                let (lhs, rhs) = (lhs.compile(), rhs.compile());
                Arc::new(move |value: &dyn Any| lhs(value) || rhs(value))
            }
            Self::Not(inner) => {
                let inner = inner.compile();
                Arc::new(move |value: &dyn Any| !inner(value))
            }
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare(op, literal) => write!(f, "value {} {literal}", op.symbol()),
            Self::Length(op, n) => write!(f, "len(value) {} {n}", op.symbol()),
            Self::Matches(regex) => write!(f, "value =~ /{}/", regex.as_str()),
            Self::OneOf(literals) => f.debug_set().entries(literals).finish(),
            Self::Custom(_) => f.write_str("<custom>"),
            Self::And(lhs, rhs) => write!(f, "({lhs:?} and {rhs:?})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs:?} or {rhs:?})"),
            Self::Not(inner) => write!(f, "not {inner:?}"),
        }
    }
}

// ============================================================================
// Value views
// ============================================================================

fn compare(value: &dyn Any, op: CmpOp, literal: &Literal) -> bool {
    match literal {
        Literal::Int(rhs) => as_int(value).is_some_and(|lhs| op.holds(lhs.cmp(rhs))),
        Literal::Str(rhs) => {
            as_text(value).is_some_and(|lhs| op.holds((*lhs).cmp(rhs.as_str())))
        }
    }
}

fn as_int(value: &dyn Any) -> Option<i64> {
    if let Some(v) = value.downcast_ref::<i64>() {
        return Some(*v);
    }
    if let Some(v) = value.downcast_ref::<i32>() {
        return Some(i64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<u32>() {
        return Some(i64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<u64>() {
        return i64::try_from(*v).ok();
    }
    value
        .downcast_ref::<usize>()
        .and_then(|v| i64::try_from(*v).ok())
}

fn as_text(value: &dyn Any) -> Option<Cow<'_, str>> {
    if let Some(v) = value.downcast_ref::<String>() {
        return Some(Cow::Borrowed(v.as_str()));
    }
    if let Some(v) = value.downcast_ref::<&'static str>() {
        return Some(Cow::Borrowed(v));
    }
    value
        .downcast_ref::<Uuid>()
        .map(|v| Cow::Owned(v.to_string()))
}
