//! Core of typesift.
//!
//! This crate selects types out of a module with composable predicates:
//! - Rule sets: OR-groups of AND-chained filter steps
//! - Glob pattern matchers with union and exclusion
//! - Type descriptors and module readers
//! - Type predicates realized as filter steps
//! - Selections and condition checks
//! - A textual filter expression language lowered to rule sets

pub mod expr;
pub mod module;
pub mod pattern;
pub mod predicate;
pub mod rules;
pub mod selection;
pub mod types;
