//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Structured JSON:** every command writes exactly one JSON document to stdout
//! 2. **Status first:** every response has `status` as its first field
//! 3. **Deterministic:** selected types appear in group order, then module order
//!    within a group; rules appear in config order
//! 4. **Versioned:** `schema_version` enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use typesift_core::expr::ExprError;
use typesift_core::module::ModuleError;
use typesift_core::selection::TestResult;
use typesift_core::types::TypeDescriptor;

use crate::error::{OutputErrorCode, SiftError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Shared Types
// ============================================================================

/// One type as reported in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    /// Namespace-qualified name.
    pub full_name: String,
    pub namespace: String,
    pub name: String,
    /// Declaration kind (`class`, `interface`, ...).
    pub kind: String,
}

impl From<&TypeDescriptor> for TypeSummary {
    fn from(ty: &TypeDescriptor) -> Self {
        TypeSummary {
            full_name: ty.full_name(),
            namespace: ty.namespace.clone(),
            name: ty.name.clone(),
            kind: ty.kind.as_str().to_string(),
        }
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Rule name (absent for ad-hoc `check` runs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// True when no selected type violates the rule.
    pub passed: bool,
    /// Number of selected types the rule was checked against.
    pub checked: usize,
    /// Selected types that violate the rule.
    pub failing: Vec<TypeSummary>,
}

impl RuleOutcome {
    pub fn from_result(name: Option<String>, result: &TestResult) -> Self {
        RuleOutcome {
            name,
            passed: result.is_successful,
            checked: result.checked,
            failing: result
                .failing_types
                .iter()
                .map(|t| TypeSummary::from(t.as_ref()))
                .collect(),
        }
    }
}

// ============================================================================
// Command Responses
// ============================================================================

/// Response for `typesift select`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    /// Module the types were selected from.
    pub module: String,
    /// Number of selected types.
    pub count: usize,
    pub types: Vec<TypeSummary>,
}

impl SelectResponse {
    pub fn new(module: impl Into<String>, types: Vec<TypeSummary>) -> Self {
        SelectResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            module: module.into(),
            count: types.len(),
            types,
        }
    }
}

/// Response for `typesift check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    /// Status: "ok" (the rule ran; see `result.passed`).
    pub status: String,
    pub schema_version: String,
    pub module: String,
    pub result: RuleOutcome,
}

impl CheckResponse {
    pub fn new(module: impl Into<String>, result: RuleOutcome) -> Self {
        CheckResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            module: module.into(),
            result,
        }
    }

    pub fn passed(&self) -> bool {
        self.result.passed
    }
}

/// Response for `typesift rules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesResponse {
    /// Status: "ok" (every rule ran; see `passed`).
    pub status: String,
    pub schema_version: String,
    pub module: String,
    /// True when every rule passed.
    pub passed: bool,
    pub rules: Vec<RuleOutcome>,
}

impl RulesResponse {
    pub fn new(module: impl Into<String>, rules: Vec<RuleOutcome>) -> Self {
        RulesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            module: module.into(),
            passed: rules.iter().all(|r| r.passed),
            rules,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code (matches the exit code).
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a SiftError.
    pub fn from_error(err: &SiftError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let details = match err {
            SiftError::Expr(ExprError::InvalidExpression { input, .. }) => {
                Some(serde_json::json!({ "input": input }))
            }
            SiftError::Expr(ExprError::InvalidValue { key, value, .. }) => {
                Some(serde_json::json!({ "key": key, "value": value }))
            }
            SiftError::Module(ModuleError::ReadError { path, .. }) => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            SiftError::Module(ModuleError::DuplicateType { module, full_name }) => {
                Some(serde_json::json!({ "module": module, "full_name": full_name }))
            }
            _ => None,
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a SiftError.
    pub fn from_error(err: &SiftError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Serialization Helpers
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
