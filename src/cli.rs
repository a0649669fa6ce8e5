//! Command helpers behind the `typesift` binary.
//!
//! Each `run_*` function takes an already-loaded module and returns the
//! response the binary prints. The caller (`main.rs`) resolves the module
//! path, loads config, and maps the response to an exit code.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, SiftError>`. A rule that runs and fails is
//! not an error: it comes back as a response with `passed == false`.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use typesift_core::expr::compile_filter;
use typesift_core::module::{JsonModule, ModuleReader};
use typesift_core::rules::RuleSet;
use typesift_core::selection::{check, select};

use crate::config::{Config, RuleConfig};
use crate::error::SiftError;
use crate::output::{CheckResponse, RuleOutcome, RulesResponse, SelectResponse, TypeSummary};

/// Pick the module path: the explicit flag wins over `[module] path`.
pub fn resolve_module_path(explicit: Option<PathBuf>, config: &Config) -> Result<PathBuf, SiftError> {
    explicit
        .or_else(|| config.module.path.clone())
        .ok_or_else(|| {
            SiftError::invalid_args("no module given: pass --module or set [module] path in config")
        })
}

/// Load the module document at `path`.
pub fn load_module(path: &Path) -> Result<JsonModule, SiftError> {
    Ok(JsonModule::load(path)?)
}

/// Select the types matching `filter`.
pub fn run_select(module: &JsonModule, filter: &str) -> Result<SelectResponse, SiftError> {
    let rules = compile_filter(filter)?;
    let selected = select(&module.types(), &rules)?;
    debug!(filter, selected = selected.len(), "select");

    let types = selected.iter().map(|t| TypeSummary::from(t.as_ref())).collect();
    Ok(SelectResponse::new(module.module_name(), types))
}

/// Check one ad-hoc rule.
pub fn run_check(
    module: &JsonModule,
    that: Option<&str>,
    should: &str,
    negate: bool,
) -> Result<CheckResponse, SiftError> {
    let outcome = evaluate_rule(module, None, that, should, negate)?;
    Ok(CheckResponse::new(module.module_name(), outcome))
}

/// Check every rule in `config`, in file order.
pub fn run_rules(module: &JsonModule, config: &Config) -> Result<RulesResponse, SiftError> {
    if config.rules.is_empty() {
        return Err(SiftError::Config("config defines no rules".to_string()));
    }

    let outcomes = config
        .rules
        .iter()
        .map(|rule| evaluate_config_rule(module, rule))
        .collect::<Result<Vec<_>, _>>()?;

    let response = RulesResponse::new(module.module_name(), outcomes);
    info!(
        rules = response.rules.len(),
        passed = response.passed,
        "checked config rules"
    );
    Ok(response)
}

fn evaluate_config_rule(module: &JsonModule, rule: &RuleConfig) -> Result<RuleOutcome, SiftError> {
    evaluate_rule(
        module,
        Some(rule.name.clone()),
        rule.that.as_deref(),
        &rule.should,
        rule.negate,
    )
}

fn evaluate_rule(
    module: &JsonModule,
    name: Option<String>,
    that: Option<&str>,
    should: &str,
    negate: bool,
) -> Result<RuleOutcome, SiftError> {
    // No `that` clause: every type is under test.
    let predicates = match that {
        Some(expr) => compile_filter(expr)?,
        None => RuleSet::new(),
    };
    let conditions = compile_filter(should)?;

    let selected = select(&module.types(), &predicates)?;
    let result = check(&selected, &conditions, !negate)?;
    debug!(
        rule = name.as_deref().unwrap_or("<check>"),
        checked = result.checked,
        passed = result.is_successful,
        "evaluated rule"
    );

    Ok(RuleOutcome::from_result(name, &result))
}
