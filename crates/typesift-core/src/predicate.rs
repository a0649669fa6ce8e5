//! Type predicates and their filter steps.
//!
//! A [`Predicate`] tests one structural property of a type. Each predicate
//! carries a `negate` flag and becomes a [`FilterStep`] via
//! [`Predicate::into_step`], which is how predicates enter a rule set.
//!
//! ## Predicate Kinds
//!
//! - name: exact, glob, prefix, suffix
//! - namespace: prefix containment or glob
//! - attributes, base types, interfaces
//! - kind (class, interface, struct, enum, delegate) and visibility
//! - sealed, abstract, static, nested, generic flags
//! - dependencies: any, all, only
//!
//! A property that is absent on a type (no base type, no dependencies, ...)
//! never raises an error; the positive predicate is simply false.

use std::fmt;

use crate::pattern::{PatternError, PatternMatcher};
use crate::rules::FilterStep;
use crate::types::{TypeDescriptor, TypeKind, Visibility};

/// The property a predicate tests.
#[derive(Debug, Clone)]
pub enum PredicateKind {
    /// Name equals the value.
    HaveName(String),
    /// Name matches a glob matcher.
    HaveNameMatching(PatternMatcher),
    HaveNameStartingWith(String),
    HaveNameEndingWith(String),
    /// Namespace equals the value or is nested under it.
    ResideInNamespace(String),
    /// Namespace matches a glob matcher.
    ResideInNamespaceMatching(PatternMatcher),
    /// An attribute with this full or short name is applied.
    HaveAttribute(String),
    /// Derives from this full type name, directly or transitively.
    Inherit(String),
    /// Implements this full interface name.
    ImplementInterface(String),
    BeKind(TypeKind),
    HaveVisibility(Visibility),
    BeSealed,
    BeAbstract,
    BeStatic,
    BeNested,
    BeGeneric,
    /// At least one dependency matches.
    HaveDependencyOn(PatternMatcher),
    /// Every matcher is matched by at least one dependency.
    HaveDependencyOnAll(Vec<PatternMatcher>),
    /// Every dependency matches. Types without dependencies qualify.
    OnlyHaveDependenciesOn(PatternMatcher),
}

/// A predicate with an optional negation.
#[derive(Debug, Clone)]
pub struct Predicate {
    /// The property to test.
    pub kind: PredicateKind,
    /// Invert the test.
    pub negate: bool,
}

impl Predicate {
    /// Create a non-negated predicate.
    pub fn new(kind: PredicateKind) -> Self {
        Predicate {
            kind,
            negate: false,
        }
    }

    pub fn have_name(name: impl Into<String>) -> Self {
        Predicate::new(PredicateKind::HaveName(name.into()))
    }

    /// Name matches a glob pattern.
    pub fn have_name_matching(pattern: &str) -> Result<Self, PatternError> {
        Ok(Predicate::new(PredicateKind::HaveNameMatching(
            PatternMatcher::from_pattern(pattern)?,
        )))
    }

    pub fn have_name_starting_with(prefix: impl Into<String>) -> Self {
        Predicate::new(PredicateKind::HaveNameStartingWith(prefix.into()))
    }

    pub fn have_name_ending_with(suffix: impl Into<String>) -> Self {
        Predicate::new(PredicateKind::HaveNameEndingWith(suffix.into()))
    }

    pub fn reside_in_namespace(namespace: impl Into<String>) -> Self {
        Predicate::new(PredicateKind::ResideInNamespace(namespace.into()))
    }

    /// Namespace matches a glob pattern.
    pub fn reside_in_namespace_matching(pattern: &str) -> Result<Self, PatternError> {
        Ok(Predicate::new(PredicateKind::ResideInNamespaceMatching(
            PatternMatcher::from_pattern(pattern)?,
        )))
    }

    pub fn have_attribute(attribute: impl Into<String>) -> Self {
        Predicate::new(PredicateKind::HaveAttribute(attribute.into()))
    }

    pub fn inherit(base: impl Into<String>) -> Self {
        Predicate::new(PredicateKind::Inherit(base.into()))
    }

    pub fn implement_interface(iface: impl Into<String>) -> Self {
        Predicate::new(PredicateKind::ImplementInterface(iface.into()))
    }

    pub fn are_classes() -> Self {
        Predicate::new(PredicateKind::BeKind(TypeKind::Class))
    }

    pub fn are_interfaces() -> Self {
        Predicate::new(PredicateKind::BeKind(TypeKind::Interface))
    }

    pub fn are_structs() -> Self {
        Predicate::new(PredicateKind::BeKind(TypeKind::Struct))
    }

    pub fn are_enums() -> Self {
        Predicate::new(PredicateKind::BeKind(TypeKind::Enum))
    }

    pub fn are_public() -> Self {
        Predicate::new(PredicateKind::HaveVisibility(Visibility::Public))
    }

    pub fn are_sealed() -> Self {
        Predicate::new(PredicateKind::BeSealed)
    }

    pub fn are_abstract() -> Self {
        Predicate::new(PredicateKind::BeAbstract)
    }

    pub fn are_static() -> Self {
        Predicate::new(PredicateKind::BeStatic)
    }

    pub fn are_nested() -> Self {
        Predicate::new(PredicateKind::BeNested)
    }

    pub fn are_generic() -> Self {
        Predicate::new(PredicateKind::BeGeneric)
    }

    /// Any dependency matches the glob pattern.
    pub fn have_dependency_on(pattern: &str) -> Result<Self, PatternError> {
        Ok(Predicate::new(PredicateKind::HaveDependencyOn(
            PatternMatcher::from_pattern(pattern)?,
        )))
    }

    /// Any dependency matches any of the glob patterns.
    pub fn have_dependency_on_any<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        Ok(Predicate::new(PredicateKind::HaveDependencyOn(
            PatternMatcher::any_of(patterns)?,
        )))
    }

    /// Each glob pattern is matched by some dependency.
    pub fn have_dependency_on_all<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let matchers = patterns
            .iter()
            .map(|p| PatternMatcher::from_pattern(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Predicate::new(PredicateKind::HaveDependencyOnAll(matchers)))
    }

    /// Every dependency matches one of the glob patterns.
    pub fn only_have_dependencies_on<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        Ok(Predicate::new(PredicateKind::OnlyHaveDependenciesOn(
            PatternMatcher::any_of(patterns)?,
        )))
    }

    /// The same predicate with its negation flipped.
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Test a single type, applying the negation flag.
    pub fn evaluate(&self, ty: &TypeDescriptor) -> bool {
        self.test(ty) != self.negate
    }

    fn test(&self, ty: &TypeDescriptor) -> bool {
        match &self.kind {
            PredicateKind::HaveName(name) => ty.name == *name,
            PredicateKind::HaveNameMatching(matcher) => matcher.is_match(&ty.name),
            PredicateKind::HaveNameStartingWith(prefix) => ty.name.starts_with(prefix.as_str()),
            PredicateKind::HaveNameEndingWith(suffix) => ty.name.ends_with(suffix.as_str()),
            PredicateKind::ResideInNamespace(namespace) => ty.resides_in(namespace),
            PredicateKind::ResideInNamespaceMatching(matcher) => matcher.is_match(&ty.namespace),
            PredicateKind::HaveAttribute(attr) => ty.has_attribute(attr),
            PredicateKind::Inherit(base) => ty.inherits(base),
            PredicateKind::ImplementInterface(iface) => ty.implements(iface),
            PredicateKind::BeKind(kind) => ty.kind == *kind,
            PredicateKind::HaveVisibility(visibility) => ty.visibility == *visibility,
            PredicateKind::BeSealed => ty.is_sealed,
            PredicateKind::BeAbstract => ty.is_abstract,
            PredicateKind::BeStatic => ty.is_static,
            PredicateKind::BeNested => ty.is_nested,
            PredicateKind::BeGeneric => ty.is_generic(),
            PredicateKind::HaveDependencyOn(matcher) => {
                ty.dependencies.iter().any(|d| matcher.is_match(d))
            }
            PredicateKind::HaveDependencyOnAll(matchers) => matchers
                .iter()
                .all(|m| ty.dependencies.iter().any(|d| m.is_match(d))),
            PredicateKind::OnlyHaveDependenciesOn(matcher) => {
                ty.dependencies.iter().all(|d| matcher.is_match(d))
            }
        }
    }

    /// Turn this predicate into a filter step keeping the types it accepts.
    pub fn into_step(self) -> FilterStep {
        let label = self.to_string();
        FilterStep::per_type(label, move |ty| self.evaluate(ty))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "not ")?;
        }
        match &self.kind {
            PredicateKind::HaveName(name) => write!(f, "name = {}", name),
            PredicateKind::HaveNameMatching(m) => write!(f, "name : {}", m),
            PredicateKind::HaveNameStartingWith(p) => write!(f, "prefix = {}", p),
            PredicateKind::HaveNameEndingWith(s) => write!(f, "suffix = {}", s),
            PredicateKind::ResideInNamespace(ns) => write!(f, "namespace = {}", ns),
            PredicateKind::ResideInNamespaceMatching(m) => write!(f, "namespace : {}", m),
            PredicateKind::HaveAttribute(a) => write!(f, "attr = {}", a),
            PredicateKind::Inherit(b) => write!(f, "inherits = {}", b),
            PredicateKind::ImplementInterface(i) => write!(f, "implements = {}", i),
            PredicateKind::BeKind(k) => write!(f, "kind = {}", k),
            PredicateKind::HaveVisibility(v) => write!(f, "visibility = {}", v),
            PredicateKind::BeSealed => write!(f, "sealed"),
            PredicateKind::BeAbstract => write!(f, "abstract"),
            PredicateKind::BeStatic => write!(f, "static"),
            PredicateKind::BeNested => write!(f, "nested"),
            PredicateKind::BeGeneric => write!(f, "generic"),
            PredicateKind::HaveDependencyOn(m) => write!(f, "depends : {}", m),
            PredicateKind::HaveDependencyOnAll(ms) => {
                let parts: Vec<String> = ms.iter().map(|m| m.to_string()).collect();
                write!(f, "depends_all : [{}]", parts.join(", "))
            }
            PredicateKind::OnlyHaveDependenciesOn(m) => write!(f, "only_depends : {}", m),
        }
    }
}
