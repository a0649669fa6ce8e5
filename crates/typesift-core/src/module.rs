//! Module readers: where the type universe comes from.
//!
//! The rule engine only ever sees an ordered [`TypeSet`]. A [`ModuleReader`]
//! supplies it. [`JsonModule`] reads a module description produced by an
//! external extractor:
//!
//! ```json
//! {
//!   "name": "App",
//!   "types": [
//!     { "name": "OrderService", "namespace": "App.Services", "is_sealed": true,
//!       "dependencies": ["App.Data.OrderRepository"] }
//!   ]
//! }
//! ```
//!
//! Type order is document order and is stable across reads.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::types::{TypeDescriptor, TypeSet};

/// Error type for module loading.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Failed to read the module file.
    #[error("failed to read module '{path}': {message}")]
    ReadError { path: PathBuf, message: String },

    /// The module document is not valid JSON or does not match the schema.
    #[error("invalid module document: {0}")]
    ParseError(String),

    /// Two types share a full name.
    #[error("duplicate type '{full_name}' in module '{module}'")]
    DuplicateType { module: String, full_name: String },

    /// A type has an empty name.
    #[error("type #{index} in module '{module}' has an empty name")]
    EmptyTypeName { module: String, index: usize },
}

/// Source of the types a rule runs against.
///
/// Implementations are read-only and deterministic for a loaded module.
pub trait ModuleReader {
    /// Display name of the module.
    fn module_name(&self) -> &str;

    /// Every type in the module, in a stable order.
    fn types(&self) -> TypeSet;
}

#[derive(Debug, Deserialize)]
struct ModuleDocument {
    name: String,
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

/// A module loaded from a JSON description.
#[derive(Debug, Clone)]
pub struct JsonModule {
    name: String,
    types: TypeSet,
}

impl JsonModule {
    /// Build a module from descriptors, validating names.
    pub fn from_types(
        name: impl Into<String>,
        types: Vec<TypeDescriptor>,
    ) -> Result<Self, ModuleError> {
        let name = name.into();
        let mut seen = HashSet::with_capacity(types.len());

        for (index, ty) in types.iter().enumerate() {
            if ty.name.trim().is_empty() {
                return Err(ModuleError::EmptyTypeName {
                    module: name.clone(),
                    index,
                });
            }
            let full_name = ty.full_name();
            if !seen.insert(full_name.clone()) {
                return Err(ModuleError::DuplicateType {
                    module: name.clone(),
                    full_name,
                });
            }
        }

        Ok(JsonModule {
            name,
            types: types.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parse a module document.
    pub fn from_json_str(json: &str) -> Result<Self, ModuleError> {
        let doc: ModuleDocument =
            serde_json::from_str(json).map_err(|e| ModuleError::ParseError(e.to_string()))?;
        JsonModule::from_types(doc.name, doc.types)
    }

    /// Load a module document from disk.
    pub fn load(path: &Path) -> Result<Self, ModuleError> {
        let content = fs::read_to_string(path).map_err(|e| ModuleError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let module = JsonModule::from_json_str(&content)?;
        debug!(
            module = %module.name,
            path = %path.display(),
            types = module.types.len(),
            "loaded module"
        );
        Ok(module)
    }
}

impl ModuleReader for JsonModule {
    fn module_name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> TypeSet {
        self.types.clone()
    }
}
