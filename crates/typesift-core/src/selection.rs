//! Selections: choose types, then assert conditions about them.
//!
//! [`Types`] is the entry point. `that` starts a predicate clause and `should`
//! / `should_not` start a condition clause. Within a clause, `and` adds a step
//! to the current group and `or` opens a new group, so
//! `that(a).and(b).or(c)` selects `(a AND b) OR c`.
//!
//! ```
//! use typesift_core::predicate::Predicate;
//! use typesift_core::selection::Types;
//! use typesift_core::types::{type_set, TypeDescriptor};
//!
//! let types = type_set([
//!     TypeDescriptor::new("App.Services", "OrderService").sealed(),
//!     TypeDescriptor::new("App.Services", "BillingService"),
//! ]);
//!
//! let result = Types::from_set(types)
//!     .that(Predicate::reside_in_namespace("App.Services"))
//!     .should(Predicate::are_sealed())
//!     .get_result()
//!     .unwrap();
//!
//! assert!(!result.is_successful);
//! assert_eq!(result.failing_type_names(), ["App.Services.BillingService"]);
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::module::ModuleReader;
use crate::predicate::Predicate;
use crate::rules::{RuleSet, RuleSetBuilder, StepError};
use crate::types::{TypeRef, TypeSet};

/// Outcome of checking conditions against selected types.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// True when no selected type violates the conditions.
    pub is_successful: bool,
    /// Number of types the conditions were checked against.
    pub checked: usize,
    /// Selected types that violate the conditions, in selection order.
    pub failing_types: TypeSet,
}

impl TestResult {
    pub fn failing_type_names(&self) -> Vec<String> {
        self.failing_types.iter().map(|t| t.full_name()).collect()
    }
}

/// Select the types of `input` accepted by `rules`.
pub fn select(input: &[TypeRef], rules: &RuleSet) -> Result<TypeSet, StepError> {
    rules.execute(input)
}

/// Check `conditions` against `selected`.
///
/// With `should`, a selected type fails when the conditions do not accept it.
/// Without (`should_not`), a selected type fails when the conditions accept it.
pub fn check(
    selected: &[TypeRef],
    conditions: &RuleSet,
    should: bool,
) -> Result<TestResult, StepError> {
    let accepted = conditions.execute(selected)?;
    let accepted: HashSet<String> = accepted.iter().map(|t| t.full_name()).collect();

    let failing: TypeSet = selected
        .iter()
        .filter(|t| accepted.contains(&t.full_name()) != should)
        .cloned()
        .collect();

    debug!(
        checked = selected.len(),
        failing = failing.len(),
        should,
        "checked conditions"
    );

    Ok(TestResult {
        is_successful: failing.is_empty(),
        checked: selected.len(),
        failing_types: failing,
    })
}

/// Entry point: the full set of types a selection starts from.
#[derive(Debug, Clone)]
pub struct Types {
    types: TypeSet,
}

impl Types {
    /// All types of a module.
    pub fn in_module(reader: &impl ModuleReader) -> Self {
        Types {
            types: reader.types(),
        }
    }

    pub fn from_set(types: TypeSet) -> Self {
        Types { types }
    }

    /// Every type, unfiltered.
    pub fn get_types(&self) -> TypeSet {
        self.types.clone()
    }

    /// Start a predicate clause with its first predicate.
    pub fn that(self, predicate: Predicate) -> Predicates {
        let mut rules = RuleSetBuilder::new();
        rules.add_step(predicate.into_step());
        Predicates {
            types: self.types,
            rules,
        }
    }

    /// Assert conditions over every type.
    pub fn should(self, condition: Predicate) -> Conditions {
        Conditions::start(self.types, RuleSet::new(), condition, true)
    }

    /// Assert that no type satisfies the conditions.
    pub fn should_not(self, condition: Predicate) -> Conditions {
        Conditions::start(self.types, RuleSet::new(), condition, false)
    }
}

/// A predicate clause under construction.
#[derive(Debug, Clone)]
pub struct Predicates {
    types: TypeSet,
    rules: RuleSetBuilder,
}

impl Predicates {
    /// Narrow the current group.
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.rules.add_step(predicate.into_step());
        self
    }

    /// Open a new group.
    pub fn or(mut self, predicate: Predicate) -> Self {
        self.rules.start_new_group();
        self.rules.add_step(predicate.into_step());
        self
    }

    /// Finish the clause into a reusable rule set.
    pub fn into_rule_set(self) -> RuleSet {
        self.rules.build()
    }

    /// Types selected by the clause.
    pub fn get_types(self) -> Result<TypeSet, StepError> {
        let rules = self.rules.build();
        select(&self.types, &rules)
    }

    /// Assert conditions over the selected types.
    pub fn should(self, condition: Predicate) -> Conditions {
        Conditions::start(self.types, self.rules.build(), condition, true)
    }

    /// Assert that no selected type satisfies the conditions.
    pub fn should_not(self, condition: Predicate) -> Conditions {
        Conditions::start(self.types, self.rules.build(), condition, false)
    }
}

/// A condition clause under construction.
#[derive(Debug, Clone)]
pub struct Conditions {
    types: TypeSet,
    predicates: RuleSet,
    conditions: RuleSetBuilder,
    should: bool,
}

impl Conditions {
    fn start(types: TypeSet, predicates: RuleSet, condition: Predicate, should: bool) -> Self {
        let mut conditions = RuleSetBuilder::new();
        conditions.add_step(condition.into_step());
        Conditions {
            types,
            predicates,
            conditions,
            should,
        }
    }

    pub fn and(mut self, condition: Predicate) -> Self {
        self.conditions.add_step(condition.into_step());
        self
    }

    pub fn or(mut self, condition: Predicate) -> Self {
        self.conditions.start_new_group();
        self.conditions.add_step(condition.into_step());
        self
    }

    /// Run the selection and check the conditions.
    pub fn get_result(self) -> Result<TestResult, StepError> {
        let selected = select(&self.types, &self.predicates)?;
        check(&selected, &self.conditions.build(), self.should)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{type_set, TypeDescriptor, TypeKind};

    fn module_types() -> TypeSet {
        type_set([
            TypeDescriptor::new("App.Services", "OrderService")
                .sealed()
                .with_dependency("App.Data.OrderRepository"),
            TypeDescriptor::new("App.Services", "BillingService")
                .with_dependency("App.Web.Controller"),
            TypeDescriptor::new("App.Data", "OrderRepository"),
            TypeDescriptor::new("App.Contracts", "IOrderService").with_kind(TypeKind::Interface),
            TypeDescriptor::new("App.Web", "Controller").abstract_type(),
        ])
    }

    fn names(types: &[TypeRef]) -> Vec<String> {
        types.iter().map(|t| t.full_name()).collect()
    }

    #[test]
    fn test_that_and_selects_intersection() {
        let selected = Types::from_set(module_types())
            .that(Predicate::reside_in_namespace("App.Services"))
            .and(Predicate::are_sealed())
            .get_types()
            .unwrap();
        assert_eq!(names(&selected), vec!["App.Services.OrderService"]);
    }

    #[test]
    fn test_that_or_selects_union() {
        let selected = Types::from_set(module_types())
            .that(Predicate::reside_in_namespace("App.Data"))
            .or(Predicate::are_interfaces())
            .get_types()
            .unwrap();
        assert_eq!(
            names(&selected),
            vec!["App.Data.OrderRepository", "App.Contracts.IOrderService"]
        );
    }

    #[test]
    fn test_should_passes_when_all_selected_satisfy() {
        let result = Types::from_set(module_types())
            .that(Predicate::reside_in_namespace("App.Services"))
            .should(Predicate::have_name_ending_with("Service"))
            .get_result()
            .unwrap();
        assert!(result.is_successful);
        assert_eq!(result.checked, 2);
        assert!(result.failing_types.is_empty());
    }

    #[test]
    fn test_should_not_reports_violators() {
        let result = Types::from_set(module_types())
            .that(Predicate::reside_in_namespace("App.Services"))
            .should_not(Predicate::have_dependency_on("App.Web.*").unwrap())
            .get_result()
            .unwrap();
        assert!(!result.is_successful);
        assert_eq!(result.failing_type_names(), vec!["App.Services.BillingService"]);
    }

    #[test]
    fn test_conditions_or() {
        let result = Types::from_set(module_types())
            .that(Predicate::reside_in_namespace("App.Web"))
            .or(Predicate::reside_in_namespace("App.Services"))
            .should(Predicate::are_sealed())
            .or(Predicate::are_abstract())
            .get_result()
            .unwrap();
        assert_eq!(result.failing_type_names(), vec!["App.Services.BillingService"]);
    }

    #[test]
    fn test_should_over_all_types() {
        let result = Types::from_set(module_types())
            .should(Predicate::are_public())
            .get_result()
            .unwrap();
        assert!(result.is_successful);
        assert_eq!(result.checked, 5);
    }

    #[test]
    fn test_empty_selection_is_successful() {
        let result = Types::from_set(module_types())
            .that(Predicate::reside_in_namespace("Nowhere"))
            .should(Predicate::are_sealed())
            .get_result()
            .unwrap();
        assert!(result.is_successful);
        assert_eq!(result.checked, 0);
    }

    #[test]
    fn test_into_rule_set_is_reusable() {
        let rules = Types::from_set(Vec::new())
            .that(Predicate::are_sealed())
            .into_rule_set();
        let first = select(&module_types(), &rules).unwrap();
        let second = select(&module_types(), &rules).unwrap();
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&first), vec!["App.Services.OrderService"]);
    }
}
