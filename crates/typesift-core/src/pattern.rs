//! Glob pattern matchers with union and exclusion.
//!
//! A [`PatternMatcher`] is a boolean test over strings. Leaves are built from
//! glob patterns; matchers combine with [`PatternMatcher::union`] and
//! [`PatternMatcher::exclude`] into new matchers without touching their
//! operands.
//!
//! ## Glob Syntax
//!
//! - `*` matches any sequence of characters, including `.`
//! - `?` matches exactly one character
//! - every other character matches itself
//! - the whole candidate must match, not a substring
//! - a pattern ending in `.*` also matches the pattern without that suffix,
//!   so `App.Services.*` matches `App.Services` as well as `App.Services.Orders`
//!
//! ## Usage
//!
//! ```
//! use typesift_core::pattern::PatternMatcher;
//!
//! let services = PatternMatcher::from_pattern("App.Services.*").unwrap();
//! let legacy = PatternMatcher::from_pattern("App.Services.Legacy*").unwrap();
//! let matcher = PatternMatcher::exclude(&services, &legacy);
//!
//! assert!(matcher.is_match("App.Services"));
//! assert!(matcher.is_match("App.Services.Orders"));
//! assert!(!matcher.is_match("App.Services.LegacyBilling"));
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

/// Error type for pattern construction.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern did not produce a valid regular expression.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Composable boolean test over strings.
///
/// Cloning is cheap: operands of a combination are shared, not copied.
#[derive(Clone)]
pub struct PatternMatcher {
    node: Arc<Node>,
}

enum Node {
    /// Matches nothing.
    Never,
    Glob {
        pattern: String,
        full: Regex,
        /// The pattern with a trailing `.*` removed, when present.
        stripped: Option<Regex>,
    },
    Union(PatternMatcher, PatternMatcher),
    Exclude(PatternMatcher, PatternMatcher),
}

impl PatternMatcher {
    /// Compile a glob pattern.
    ///
    /// Compilation is eager: an invalid pattern fails here, never at match time.
    pub fn from_pattern(pattern: &str) -> Result<Self, PatternError> {
        let full = compile_glob(pattern, pattern)?;
        let stripped = match pattern.strip_suffix(".*") {
            Some(prefix) => Some(compile_glob(pattern, prefix)?),
            None => None,
        };

        Ok(PatternMatcher {
            node: Arc::new(Node::Glob {
                pattern: pattern.to_string(),
                full,
                stripped,
            }),
        })
    }

    /// A matcher that rejects every candidate. Identity element for [`union`](Self::union).
    pub fn never() -> Self {
        PatternMatcher {
            node: Arc::new(Node::Never),
        }
    }

    /// Matches when either `a` or `b` matches.
    pub fn union(a: &PatternMatcher, b: &PatternMatcher) -> Self {
        PatternMatcher {
            node: Arc::new(Node::Union(a.clone(), b.clone())),
        }
    }

    /// Matches when `a` matches and `b` does not.
    pub fn exclude(a: &PatternMatcher, b: &PatternMatcher) -> Self {
        PatternMatcher {
            node: Arc::new(Node::Exclude(a.clone(), b.clone())),
        }
    }

    /// Union of every pattern in `patterns`. An empty list yields [`never`](Self::never).
    pub fn any_of<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        patterns.iter().try_fold(PatternMatcher::never(), |acc, p| {
            let next = PatternMatcher::from_pattern(p.as_ref())?;
            Ok(match *acc.node {
                Node::Never => next,
                _ => PatternMatcher::union(&acc, &next),
            })
        })
    }

    /// Test a candidate string.
    pub fn is_match(&self, candidate: &str) -> bool {
        match &*self.node {
            Node::Never => false,
            Node::Glob { full, stripped, .. } => {
                full.is_match(candidate) || stripped.as_ref().is_some_and(|re| re.is_match(candidate))
            }
            Node::Union(a, b) => a.is_match(candidate) || b.is_match(candidate),
            Node::Exclude(a, b) => a.is_match(candidate) && !b.is_match(candidate),
        }
    }
}

impl fmt::Display for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.node {
            Node::Never => write!(f, "<never>"),
            Node::Glob { pattern, .. } => write!(f, "{}", pattern),
            Node::Union(a, b) => write!(f, "({} + {})", a, b),
            Node::Exclude(a, b) => write!(f, "({} - {})", a, b),
        }
    }
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatternMatcher({})", self)
    }
}

/// Translate a glob to an anchored regex and compile it.
fn compile_glob(pattern: &str, glob: &str) -> Result<Regex, PatternError> {
    let mut source = String::with_capacity(glob.len() * 2 + 8);
    source.push_str("(?s)^(?:");
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            _ => source.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    source.push_str(")$");

    Regex::new(&source).map_err(|e| PatternError::InvalidPattern {
        pattern: excerpt(pattern),
        message: match e {
            regex::Error::CompiledTooBig(limit) => {
                format!("compiled pattern exceeds the size limit of {} bytes", limit)
            }
            // Syntax errors echo the generated regex, which can be huge.
            _ => "not a valid glob".to_string(),
        },
    })
}

/// Longest pattern prefix, in characters, quoted back in errors.
const ERROR_EXCERPT_CHARS: usize = 64;

fn excerpt(pattern: &str) -> String {
    match pattern.char_indices().nth(ERROR_EXCERPT_CHARS) {
        Some((end, _)) => format!("{}... ({} bytes)", &pattern[..end], pattern.len()),
        None => pattern.to_string(),
    }
}
