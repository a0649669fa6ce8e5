//! Filter expression parser and lowering to rule sets.
//!
//! Expressions combine type predicates with boolean operators (`and`, `or`,
//! `not`) and parentheses. A parsed [`FilterExpr`] is lowered to disjunctive
//! normal form: each conjunction becomes one rule group and each leaf one
//! filter step.
//!
//! ## Grammar
//!
//! ```text
//! <expr>       := <and_expr> ("or" <and_expr>)*
//! <and_expr>   := <term> ("and" <term>)*
//! <term>       := ["not"] <factor>
//! <factor>     := <predicate> | "(" <expr> ")"
//! <predicate>  := key ":" value | key "=" value | key "!=" value | flag
//! ```
//!
//! ## Keys
//!
//! | Key | `:` | `=` |
//! |-----|-----|-----|
//! | `name` | glob | exact |
//! | `namespace` | glob | namespace or child |
//! | `prefix`, `suffix` | name prefix / suffix | same |
//! | `attr`, `inherits`, `implements` | same | same |
//! | `depends`, `only_depends` | glob | glob |
//! | `kind` | class, interface, struct, enum, delegate | same |
//! | `visibility` | public, internal, protected, private | same |
//! | `sealed`, `abstract`, `static`, `nested`, `generic` | true/false | true/false |
//!
//! Flags and kind names may be written bare (`sealed`, `interface`, `public`).
//! `!=` negates the predicate.
//! Parentheses nest at most [`MAX_DEPTH`] levels deep.
//!
//! ## Examples
//!
//! ```text
//! name:*Service                               # Glob on the type name
//! namespace:App.Services.* and sealed         # Conjunction
//! interface or abstract                       # Disjunction
//! not depends:App.Web.*                       # Negation
//! (name:*Dto or name:*Model) and not static   # Grouping
//! attr="Serializable"                         # Quoted value
//! ```

use thiserror::Error;
use tracing::debug;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, repeat};
use winnow::error::{AddContext, ContextError, ErrMode, ParserError, StrContext};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

use crate::pattern::{PatternError, PatternMatcher};
use crate::predicate::{Predicate, PredicateKind};
use crate::rules::{RuleSet, RuleSetBuilder};
use crate::types::{TypeKind, Visibility};

/// Upper bound on the number of groups an expression may lower to.
pub const MAX_GROUPS: usize = 256;

/// Upper bound on parenthesis nesting. Parsing and lowering recurse once per
/// level, so this also bounds their stack use.
pub const MAX_DEPTH: usize = 64;

const DEPTH_LABEL: &str = "nesting depth";

/// Error type for expression parsing and lowering.
#[derive(Debug, Error)]
pub enum ExprError {
    /// Invalid expression syntax.
    #[error("invalid expression '{input}': {message}")]
    InvalidExpression { input: String, message: String },

    /// Invalid predicate value.
    #[error("invalid value '{value}' for predicate '{key}': {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    /// Glob pattern error.
    #[error(transparent)]
    PatternError(#[from] PatternError),

    /// Expression expands to too many groups.
    #[error("expression expands to more than {limit} groups")]
    TooComplex { limit: usize },

    /// Parentheses nest too deeply.
    #[error("expression nests parentheses more than {limit} levels deep")]
    TooDeep { limit: usize },
}

/// Predicate key identifying what property to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKey {
    Name,
    Prefix,
    Suffix,
    Namespace,
    Attr,
    Inherits,
    Implements,
    Depends,
    OnlyDepends,
    Kind,
    Visibility,
    Sealed,
    Abstract,
    Static,
    Nested,
    Generic,
}

impl PredicateKey {
    /// Parse a predicate key from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name" => Some(PredicateKey::Name),
            "prefix" => Some(PredicateKey::Prefix),
            "suffix" => Some(PredicateKey::Suffix),
            "namespace" | "ns" => Some(PredicateKey::Namespace),
            "attr" | "attribute" => Some(PredicateKey::Attr),
            "inherits" => Some(PredicateKey::Inherits),
            "implements" => Some(PredicateKey::Implements),
            "depends" => Some(PredicateKey::Depends),
            "only_depends" => Some(PredicateKey::OnlyDepends),
            "kind" => Some(PredicateKey::Kind),
            "visibility" => Some(PredicateKey::Visibility),
            "sealed" => Some(PredicateKey::Sealed),
            "abstract" => Some(PredicateKey::Abstract),
            "static" => Some(PredicateKey::Static),
            "nested" => Some(PredicateKey::Nested),
            "generic" => Some(PredicateKey::Generic),
            _ => None,
        }
    }

    /// Returns true if this key takes a boolean value.
    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            PredicateKey::Sealed
                | PredicateKey::Abstract
                | PredicateKey::Static
                | PredicateKey::Nested
                | PredicateKey::Generic
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            PredicateKey::Name => "name",
            PredicateKey::Prefix => "prefix",
            PredicateKey::Suffix => "suffix",
            PredicateKey::Namespace => "namespace",
            PredicateKey::Attr => "attr",
            PredicateKey::Inherits => "inherits",
            PredicateKey::Implements => "implements",
            PredicateKey::Depends => "depends",
            PredicateKey::OnlyDepends => "only_depends",
            PredicateKey::Kind => "kind",
            PredicateKey::Visibility => "visibility",
            PredicateKey::Sealed => "sealed",
            PredicateKey::Abstract => "abstract",
            PredicateKey::Static => "static",
            PredicateKey::Nested => "nested",
            PredicateKey::Generic => "generic",
        }
    }
}

/// Predicate comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    /// Glob pattern match (`:` operator).
    Glob,
    /// Equality (`=` operator).
    Eq,
    /// Inequality (`!=` operator).
    Neq,
}

/// A single parsed predicate with key, operator, and value.
#[derive(Debug, Clone)]
pub struct FilterPredicate {
    /// The property to test.
    pub key: PredicateKey,
    /// The comparison operator.
    pub op: PredicateOp,
    /// The value to compare against.
    pub value: String,
}

impl FilterPredicate {
    /// Create a new predicate.
    pub fn new(key: PredicateKey, op: PredicateOp, value: impl Into<String>) -> Self {
        Self {
            key,
            op,
            value: value.into(),
        }
    }

    /// Resolve into a type predicate, compiling any glob.
    pub fn to_predicate(&self) -> Result<Predicate, ExprError> {
        let value = self.value.as_str();
        let glob = self.op == PredicateOp::Glob;

        let (kind, flip) = match self.key {
            PredicateKey::Name if glob => (
                PredicateKind::HaveNameMatching(PatternMatcher::from_pattern(value)?),
                false,
            ),
            PredicateKey::Name => (PredicateKind::HaveName(value.to_string()), false),
            PredicateKey::Prefix => (PredicateKind::HaveNameStartingWith(value.to_string()), false),
            PredicateKey::Suffix => (PredicateKind::HaveNameEndingWith(value.to_string()), false),
            PredicateKey::Namespace if glob => (
                PredicateKind::ResideInNamespaceMatching(PatternMatcher::from_pattern(value)?),
                false,
            ),
            PredicateKey::Namespace => (PredicateKind::ResideInNamespace(value.to_string()), false),
            PredicateKey::Attr => (PredicateKind::HaveAttribute(value.to_string()), false),
            PredicateKey::Inherits => (PredicateKind::Inherit(value.to_string()), false),
            PredicateKey::Implements => {
                (PredicateKind::ImplementInterface(value.to_string()), false)
            }
            PredicateKey::Depends => (
                PredicateKind::HaveDependencyOn(PatternMatcher::from_pattern(value)?),
                false,
            ),
            PredicateKey::OnlyDepends => (
                PredicateKind::OnlyHaveDependenciesOn(PatternMatcher::from_pattern(value)?),
                false,
            ),
            PredicateKey::Kind => {
                let kind = TypeKind::parse(value).ok_or_else(|| self.invalid("unknown kind"))?;
                (PredicateKind::BeKind(kind), false)
            }
            PredicateKey::Visibility => {
                let vis =
                    Visibility::parse(value).ok_or_else(|| self.invalid("unknown visibility"))?;
                (PredicateKind::HaveVisibility(vis), false)
            }
            PredicateKey::Sealed => (PredicateKind::BeSealed, !self.parse_bool()?),
            PredicateKey::Abstract => (PredicateKind::BeAbstract, !self.parse_bool()?),
            PredicateKey::Static => (PredicateKind::BeStatic, !self.parse_bool()?),
            PredicateKey::Nested => (PredicateKind::BeNested, !self.parse_bool()?),
            PredicateKey::Generic => (PredicateKind::BeGeneric, !self.parse_bool()?),
        };

        Ok(Predicate {
            kind,
            negate: flip != (self.op == PredicateOp::Neq),
        })
    }

    fn parse_bool(&self) -> Result<bool, ExprError> {
        match self.value.to_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => Err(self.invalid("expected true or false")),
        }
    }

    fn invalid(&self, message: &str) -> ExprError {
        ExprError::InvalidValue {
            key: self.key.as_str().to_string(),
            value: self.value.clone(),
            message: message.to_string(),
        }
    }
}

/// A filter expression combining predicates with boolean operators.
#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// Conjunction of expressions (all must match).
    And(Vec<FilterExpr>),
    /// Disjunction of expressions (any must match).
    Or(Vec<FilterExpr>),
    /// Negation of an expression.
    Not(Box<FilterExpr>),
    /// A single predicate.
    Pred(FilterPredicate),
}

/// Conjunctions of (predicate, negated) leaves.
type Dnf<'a> = Vec<Vec<(&'a FilterPredicate, bool)>>;

impl FilterExpr {
    /// Lower to a rule set: one group per conjunction in disjunctive normal form.
    ///
    /// Negations are pushed to the leaves first, so `not (a or b)` becomes the
    /// single group `not a, not b`.
    pub fn to_rule_set(&self) -> Result<RuleSet, ExprError> {
        let dnf = self.to_dnf(false)?;
        let mut builder = RuleSetBuilder::new();

        for (index, conjunction) in dnf.iter().enumerate() {
            if index > 0 {
                builder.start_new_group();
            }
            for (leaf, negated) in conjunction {
                let predicate = leaf.to_predicate()?;
                let predicate = if *negated {
                    predicate.negated()
                } else {
                    predicate
                };
                builder.add_step(predicate.into_step());
            }
        }

        let rules = builder.build();
        debug!(groups = rules.group_count(), "lowered filter expression");
        Ok(rules)
    }

    fn to_dnf(&self, negated: bool) -> Result<Dnf<'_>, ExprError> {
        match (self, negated) {
            (FilterExpr::Pred(pred), _) => Ok(vec![vec![(pred, negated)]]),
            (FilterExpr::Not(inner), _) => inner.to_dnf(!negated),
            (FilterExpr::Or(exprs), false) | (FilterExpr::And(exprs), true) => {
                let mut out = Vec::new();
                for expr in exprs {
                    out.extend(expr.to_dnf(negated)?);
                    check_size(out.len())?;
                }
                Ok(out)
            }
            (FilterExpr::And(exprs), false) | (FilterExpr::Or(exprs), true) => {
                let mut out: Dnf<'_> = vec![Vec::new()];
                for expr in exprs {
                    let rhs = expr.to_dnf(negated)?;
                    check_size(out.len() * rhs.len())?;
                    let mut next = Vec::with_capacity(out.len() * rhs.len());
                    for left in &out {
                        for right in &rhs {
                            let mut conjunction = left.clone();
                            conjunction.extend(right.iter().copied());
                            next.push(conjunction);
                        }
                    }
                    out = next;
                }
                Ok(out)
            }
        }
    }
}

fn check_size(groups: usize) -> Result<(), ExprError> {
    if groups > MAX_GROUPS {
        Err(ExprError::TooComplex { limit: MAX_GROUPS })
    } else {
        Ok(())
    }
}

/// Parse a filter expression from a string.
///
/// # Examples
///
/// ```
/// use typesift_core::expr::parse_filter_expr;
///
/// // Simple predicate
/// let expr = parse_filter_expr("name:*Service").unwrap();
///
/// // Compound expression
/// let expr = parse_filter_expr("namespace:App.* and sealed").unwrap();
///
/// // Negation and grouping
/// let expr = parse_filter_expr("not (interface or abstract)").unwrap();
/// let rules = expr.to_rule_set().unwrap();
/// assert_eq!(rules.group_count(), 1);
/// ```
pub fn parse_filter_expr(input: &str) -> Result<FilterExpr, ExprError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ExprError::InvalidExpression {
            input: input.to_string(),
            message: "empty expression".to_string(),
        });
    }

    (|i: &mut &str| parse_expr(i, 0))
        .parse(input)
        .map_err(|e| {
            let too_deep = e
                .inner()
                .context()
                .any(|c| matches!(c, StrContext::Label(DEPTH_LABEL)));
            if too_deep {
                ExprError::TooDeep { limit: MAX_DEPTH }
            } else {
                ExprError::InvalidExpression {
                    input: input.to_string(),
                    message: format!("{:?}", e),
                }
            }
        })
}

/// Parse and lower in one step.
pub fn compile_filter(input: &str) -> Result<RuleSet, ExprError> {
    parse_filter_expr(input)?.to_rule_set()
}

// ============================================================================
// Parser implementation using winnow
// ============================================================================

/// Parse the top-level expression (handles 'or' at lowest precedence).
fn parse_expr(input: &mut &str, depth: usize) -> ModalResult<FilterExpr> {
    let first = parse_and_expr(input, depth)?;

    let rest: Vec<FilterExpr> = repeat(
        0..,
        preceded(
            (multispace0, parse_or_keyword, multispace0),
            |i: &mut &str| parse_and_expr(i, depth),
        ),
    )
    .parse_next(input)?;

    if rest.is_empty() {
        Ok(first)
    } else {
        let mut all = vec![first];
        all.extend(rest);
        Ok(FilterExpr::Or(all))
    }
}

/// Parse an 'and' expression (higher precedence than 'or').
fn parse_and_expr(input: &mut &str, depth: usize) -> ModalResult<FilterExpr> {
    let first = parse_term(input, depth)?;

    let rest: Vec<FilterExpr> = repeat(
        0..,
        preceded(
            (multispace0, parse_and_keyword, multispace0),
            |i: &mut &str| parse_term(i, depth),
        ),
    )
    .parse_next(input)?;

    if rest.is_empty() {
        Ok(first)
    } else {
        let mut all = vec![first];
        all.extend(rest);
        Ok(FilterExpr::And(all))
    }
}

/// Parse a term (handles 'not' prefix).
fn parse_term(input: &mut &str, depth: usize) -> ModalResult<FilterExpr> {
    let _ = multispace0.parse_next(input)?;

    let negated = opt((parse_not_keyword, multispace0))
        .parse_next(input)?
        .is_some();

    let factor = parse_factor(input, depth)?;

    if negated {
        Ok(FilterExpr::Not(Box::new(factor)))
    } else {
        Ok(factor)
    }
}

/// Parse a factor (predicate or parenthesized expression).
///
/// `depth` counts the parentheses already open around this factor.
fn parse_factor(input: &mut &str, depth: usize) -> ModalResult<FilterExpr> {
    let _ = multispace0.parse_next(input)?;

    if !input.starts_with('(') {
        return parse_predicate.map(FilterExpr::Pred).parse_next(input);
    }
    if depth >= MAX_DEPTH {
        let start = input.checkpoint();
        return Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &start,
            StrContext::Label(DEPTH_LABEL),
        )));
    }

    delimited(
        ('(', multispace0),
        |i: &mut &str| parse_expr(i, depth + 1),
        (multispace0, ')'),
    )
    .parse_next(input)
}

/// Parse a predicate (key:value, key=value, key!=value, or a bare flag).
fn parse_predicate(input: &mut &str) -> ModalResult<FilterPredicate> {
    let _ = multispace0.parse_next(input)?;

    let word: &str =
        take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)?;

    match opt(parse_operator).parse_next(input)? {
        Some(op) => {
            let key = PredicateKey::parse(word).ok_or_else(|| ErrMode::from_input(input))?;
            let value = parse_value(input)?;
            Ok(FilterPredicate::new(key, op, value))
        }
        None => bare_predicate(word).ok_or_else(|| ErrMode::from_input(input)),
    }
}

/// Resolve a bare word: a boolean flag, a kind name, or a visibility.
fn bare_predicate(word: &str) -> Option<FilterPredicate> {
    if let Some(key) = PredicateKey::parse(word).filter(|k| k.is_flag()) {
        return Some(FilterPredicate::new(key, PredicateOp::Eq, "true"));
    }
    if TypeKind::parse(word).is_some() {
        return Some(FilterPredicate::new(PredicateKey::Kind, PredicateOp::Eq, word));
    }
    if Visibility::parse(word).is_some() {
        return Some(FilterPredicate::new(
            PredicateKey::Visibility,
            PredicateOp::Eq,
            word,
        ));
    }
    None
}

/// Parse an operator.
fn parse_operator(input: &mut &str) -> ModalResult<PredicateOp> {
    alt((
        "!=".map(|_| PredicateOp::Neq),
        "=".map(|_| PredicateOp::Eq),
        ":".map(|_| PredicateOp::Glob),
    ))
    .parse_next(input)
}

/// Parse a value (quoted or unquoted).
fn parse_value(input: &mut &str) -> ModalResult<String> {
    alt((parse_double_quoted, parse_single_quoted, parse_unquoted)).parse_next(input)
}

/// Parse a double-quoted string.
fn parse_double_quoted(input: &mut &str) -> ModalResult<String> {
    delimited('"', take_till(0.., |c| c == '"'), '"')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

/// Parse a single-quoted string.
fn parse_single_quoted(input: &mut &str) -> ModalResult<String> {
    delimited('\'', take_till(0.., |c| c == '\''), '\'')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

/// Parse an unquoted value (stops at whitespace or parentheses).
fn parse_unquoted(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| !c.is_whitespace() && c != ')' && c != '(')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

/// Parse a case-insensitive keyword.
fn parse_keyword(input: &mut &str, keyword: &str) -> ModalResult<()> {
    let checkpoint = *input;
    let word: &str = take_while(1.., |c: char| c.is_alphabetic()).parse_next(input)?;

    if word.eq_ignore_ascii_case(keyword) {
        Ok(())
    } else {
        *input = checkpoint;
        Err(ErrMode::from_input(input))
    }
}

fn parse_and_keyword(input: &mut &str) -> ModalResult<()> {
    parse_keyword(input, "and")
}

fn parse_or_keyword(input: &mut &str) -> ModalResult<()> {
    parse_keyword(input, "or")
}

/// Parse the 'not' keyword (case-insensitive).
fn parse_not_keyword(input: &mut &str) -> ModalResult<()> {
    let checkpoint = *input;
    parse_keyword(input, "not")?;

    // Must be followed by whitespace or '(' to avoid matching "nothing"
    if input.is_empty() || input.starts_with(char::is_whitespace) || input.starts_with('(') {
        Ok(())
    } else {
        *input = checkpoint;
        Err(ErrMode::from_input(input))
    }
}
