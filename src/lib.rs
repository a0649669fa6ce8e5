//! Typesift: declarative type selection and architecture rules
//!
//! Selects subsets of a module's types with predicate groups (an OR of
//! ANDs) and checks conditions against the selection. The engine lives in
//! `typesift-core`; this crate adds the CLI, config and JSON output.

// Engine - re-exported from typesift-core
pub use typesift_core::expr;
pub use typesift_core::module;
pub use typesift_core::pattern;
pub use typesift_core::predicate;
pub use typesift_core::rules;
pub use typesift_core::selection;
pub use typesift_core::types;

// Front door
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
