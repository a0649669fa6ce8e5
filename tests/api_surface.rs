//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -p typesift -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Engine Types
// ============================================================================

// rules module - rule groups and filter steps
use typesift::rules::{FilterStep, RuleSet, RuleSetBuilder, StepError};

// pattern module - glob matchers
use typesift::pattern::{PatternError, PatternMatcher};

// types module - type descriptors
use typesift::types::{type_set, TypeDescriptor, TypeKind, TypeRef, TypeSet, Visibility};

// predicate module - type predicates
use typesift::predicate::{Predicate, PredicateKind};

// module module - type universes
use typesift::module::{JsonModule, ModuleError, ModuleReader};

// selection module - builder layer
use typesift::selection::{check, select, Conditions, Predicates, TestResult, Types};

// expr module - filter expressions
use typesift::expr::{
    compile_filter, parse_filter_expr, ExprError, FilterExpr, FilterPredicate, PredicateKey,
    PredicateOp, MAX_DEPTH, MAX_GROUPS,
};

// ============================================================================
// Front Door Types
// ============================================================================

use typesift::cli::{load_module, resolve_module_path, run_check, run_rules, run_select};
use typesift::config::{Config, ModuleConfig, RuleConfig, CONFIG_FILE_NAME};
use typesift::error::{OutputErrorCode, SiftError, RULE_FAILED_EXIT_CODE};
use typesift::output::{
    emit_response, CheckResponse, ErrorInfo, ErrorResponse, RuleOutcome, RulesResponse,
    SelectResponse, TypeSummary, SCHEMA_VERSION,
};

#[test]
fn api_surface_compiles() {
    // Any change that breaks these imports is a breaking change.
    let _ = std::any::type_name::<RuleSet>();
    let _ = std::any::type_name::<PatternMatcher>();
    let _ = std::any::type_name::<TypeDescriptor>();
    let _ = std::any::type_name::<Predicate>();
    let _ = std::any::type_name::<JsonModule>();
    let _ = std::any::type_name::<TestResult>();
    let _ = std::any::type_name::<FilterExpr>();
    let _ = std::any::type_name::<SiftError>();
    let _ = std::any::type_name::<Config>();
}

#[test]
fn engine_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RuleSet>();
    assert_send_sync::<FilterStep>();
    assert_send_sync::<PatternMatcher>();
    assert_send_sync::<TypeRef>();
}

#[test]
fn schema_version_is_stable() {
    // The schema version is part of the public API contract
    assert_eq!(SCHEMA_VERSION, "1");
}
