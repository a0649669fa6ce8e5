//! Rule groups: disjunctive normal form over filter steps.
//!
//! A [`RuleSet`] is an OR of groups, each group an AND-chain of
//! [`FilterStep`]s. Steps narrow a collection of types; a group feeds each
//! step's output into the next, so a type survives the group only if it
//! survives every step.
//!
//! ## Execution
//!
//! 1. Every group starts from a fresh copy of the original input.
//! 2. A group whose result is empty contributes nothing.
//! 3. Surviving results are concatenated in group order.
//! 4. A group result identical element-for-element to an earlier kept result
//!    is dropped. This is a whole-result comparison: a type selected by two
//!    groups whose results differ appears twice in the output.
//!
//! Rule sets are built with [`RuleSetBuilder`] and are immutable afterwards,
//! so one rule set may be executed any number of times, from any number of
//! threads.
//!
//! ```
//! use typesift_core::rules::{FilterStep, RuleSetBuilder};
//! use typesift_core::types::{type_set, TypeDescriptor};
//!
//! let types = type_set([
//!     TypeDescriptor::new("App", "A1"),
//!     TypeDescriptor::new("App", "B1"),
//!     TypeDescriptor::new("App", "C1"),
//! ]);
//!
//! let mut builder = RuleSetBuilder::new();
//! builder.add_step(FilterStep::per_type("name=A1", |t| t.name == "A1"));
//! builder.start_new_group();
//! builder.add_step(FilterStep::per_type("name=B1", |t| t.name == "B1"));
//! let rules = builder.build();
//!
//! let selected = rules.execute(&types).unwrap();
//! let names: Vec<&str> = selected.iter().map(|t| t.name.as_str()).collect();
//! assert_eq!(names, ["A1", "B1"]);
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::types::{TypeDescriptor, TypeRef, TypeSet};

/// Error raised by a filter step.
///
/// Steps treat absent properties as non-matches; an error here means the
/// step itself was misconfigured or its collaborator failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("filter step '{step}' failed: {message}")]
    Failed { step: String, message: String },
}

type StepFn = dyn Fn(&[TypeRef]) -> Result<TypeSet, StepError> + Send + Sync;

/// A pure function narrowing a collection of types to a subset.
///
/// Implementations must return a subset of their input, in input order.
#[derive(Clone)]
pub struct FilterStep {
    label: Arc<str>,
    func: Arc<StepFn>,
}

impl FilterStep {
    /// Create a step from a whole-collection function.
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[TypeRef]) -> Result<TypeSet, StepError> + Send + Sync + 'static,
    {
        FilterStep {
            label: Arc::from(label.into()),
            func: Arc::new(func),
        }
    }

    /// Create a step that keeps every type satisfying `test`.
    pub fn per_type<F>(label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        FilterStep::new(label, move |types| {
            Ok(types.iter().filter(|t| test(t)).cloned().collect())
        })
    }

    /// Human-readable description used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Apply this step to `input`.
    pub fn apply(&self, input: &[TypeRef]) -> Result<TypeSet, StepError> {
        (self.func)(input)
    }
}

impl fmt::Debug for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FilterStep").field(&self.label).finish()
    }
}

/// An AND-chain of filter steps.
#[derive(Debug, Clone, Default)]
struct Group {
    steps: Vec<FilterStep>,
}

impl Group {
    /// Apply every step in order, each to the previous step's output.
    ///
    /// A group with no steps returns its input unchanged.
    fn apply(&self, input: &[TypeRef]) -> Result<TypeSet, StepError> {
        let mut current: TypeSet = input.to_vec();
        for step in &self.steps {
            if current.is_empty() {
                break;
            }
            current = step.apply(&current)?;
            trace!(step = step.label(), remaining = current.len(), "applied filter step");
        }
        Ok(current)
    }
}

/// An immutable OR of AND-groups.
#[derive(Debug, Clone)]
pub struct RuleSet {
    /// Never empty.
    groups: Vec<Group>,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::new()
    }
}

impl RuleSet {
    /// A rule set with one empty group, which selects everything.
    pub fn new() -> Self {
        RuleSet {
            groups: vec![Group::default()],
        }
    }

    /// Number of OR-groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of steps in each group, in group order.
    pub fn group_sizes(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.steps.len()).collect()
    }

    /// Returns true if this rule set is a single group with no steps.
    pub fn is_noop(&self) -> bool {
        self.groups.len() == 1 && self.groups[0].steps.is_empty()
    }

    /// Select the types of `input` accepted by any group.
    ///
    /// `input` is never modified. The first error raised by a step is returned
    /// and no partial result is produced.
    pub fn execute(&self, input: &[TypeRef]) -> Result<TypeSet, StepError> {
        let mut kept: Vec<TypeSet> = Vec::with_capacity(self.groups.len());

        for (index, group) in self.groups.iter().enumerate() {
            let result = group.apply(input)?;
            if result.is_empty() {
                trace!(group = index, "group selected nothing");
                continue;
            }
            if kept.iter().any(|prior| *prior == result) {
                trace!(group = index, "group result duplicates an earlier group");
                continue;
            }
            kept.push(result);
        }

        let selected: TypeSet = kept.into_iter().flatten().collect();
        debug!(
            groups = self.groups.len(),
            input = input.len(),
            selected = selected.len(),
            "executed rule set"
        );
        Ok(selected)
    }
}

/// Builder that owns a rule set under construction.
///
/// Steps are appended to the current group, which is always the last one.
#[derive(Debug, Clone)]
pub struct RuleSetBuilder {
    groups: Vec<Group>,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        RuleSetBuilder::new()
    }
}

impl RuleSetBuilder {
    /// Start with exactly one empty group.
    pub fn new() -> Self {
        RuleSetBuilder {
            groups: vec![Group::default()],
        }
    }

    /// Append a step to the current group.
    pub fn add_step(&mut self, step: FilterStep) {
        if let Some(group) = self.groups.last_mut() {
            group.steps.push(step);
        }
    }

    /// Open a new empty group; later steps go there.
    pub fn start_new_group(&mut self) {
        self.groups.push(Group::default());
    }

    /// Number of steps in the current group.
    pub fn current_group_len(&self) -> usize {
        self.groups.last().map_or(0, |g| g.steps.len())
    }

    /// Finish construction.
    pub fn build(self) -> RuleSet {
        RuleSet {
            groups: self.groups,
        }
    }
}
