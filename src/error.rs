//! Error types and error code constants for typesift.
//!
//! `SiftError` bridges the core crate's per-module errors (module loading,
//! expressions, patterns, filter steps, config) into one type suitable for
//! JSON output.
//!
//! ## Error Code Mapping
//!
//! - `1`: A rule failed (not an error; reported by `check` and `rules`)
//! - `2`: Invalid arguments (bad expression, bad pattern, missing module)
//! - `3`: Module errors (unreadable or malformed module document)
//! - `4`: Config errors
//! - `10`: Internal errors (filter step failures, output failures)

use std::fmt;

use thiserror::Error;

use typesift_core::expr::ExprError;
use typesift_core::module::ModuleError;
use typesift_core::pattern::PatternError;
use typesift_core::rules::StepError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed expression).
    InvalidArguments = 2,
    /// Module could not be read or parsed.
    ModuleError = 3,
    /// Config file could not be read or parsed.
    ConfigError = 4,
    /// Internal errors (bugs, collaborator failures).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Exit code for a rule that ran but did not hold.
pub const RULE_FAILED_EXIT_CODE: u8 = 1;

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum SiftError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Filter expression error.
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// Glob pattern error.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Module loading error.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Config error.
    #[error("config error: {0}")]
    Config(String),

    /// Filter step failure during execution.
    #[error(transparent)]
    Step(#[from] StepError),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl SiftError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        SiftError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SiftError::InternalError {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&SiftError> for OutputErrorCode {
    fn from(err: &SiftError) -> Self {
        match err {
            SiftError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            SiftError::Expr(_) => OutputErrorCode::InvalidArguments,
            SiftError::Pattern(_) => OutputErrorCode::InvalidArguments,
            SiftError::Module(_) => OutputErrorCode::ModuleError,
            SiftError::Config(_) => OutputErrorCode::ConfigError,
            SiftError::Step(_) => OutputErrorCode::InternalError,
            SiftError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<SiftError> for OutputErrorCode {
    fn from(err: SiftError) -> Self {
        OutputErrorCode::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typesift_core::expr::parse_filter_expr;

    #[test]
    fn test_error_codes() {
        assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
        assert_eq!(OutputErrorCode::ModuleError.code(), 3);
        assert_eq!(OutputErrorCode::ConfigError.code(), 4);
        assert_eq!(OutputErrorCode::InternalError.code(), 10);
    }

    #[test]
    fn test_expr_error_is_invalid_arguments() {
        let err: SiftError = parse_filter_expr("").unwrap_err().into();
        assert_eq!(OutputErrorCode::from(&err), OutputErrorCode::InvalidArguments);
        assert!(err.to_string().contains("empty expression"));
    }

    #[test]
    fn test_module_error_code() {
        let err: SiftError = ModuleError::ParseError("eof".to_string()).into();
        assert_eq!(OutputErrorCode::from(err), OutputErrorCode::ModuleError);
    }

    #[test]
    fn test_step_error_is_internal() {
        let err: SiftError = StepError::Failed {
            step: "s".to_string(),
            message: "m".to_string(),
        }
        .into();
        assert_eq!(OutputErrorCode::from(&err), OutputErrorCode::InternalError);
    }
}
