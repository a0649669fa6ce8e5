//! Configuration handling for typesift.
//!
//! A project keeps its architecture rules in `typesift.toml`:
//!
//! ```toml
//! [module]
//! path = "build/module.json"
//!
//! [[rule]]
//! name = "services are sealed"
//! that = "namespace:App.Services.*"
//! should = "sealed"
//!
//! [[rule]]
//! name = "domain does not reach the web layer"
//! that = "namespace:App.Domain.*"
//! should = "depends:App.Web.*"
//! negate = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SiftError;

/// Config file name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "typesift.toml";

/// Typesift configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Module settings
    #[serde(default)]
    pub module: ModuleConfig,

    /// Named rules, in file order
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

/// Module configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModuleConfig {
    /// Module document used when `--module` is omitted
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// One named rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Rule name shown in reports
    pub name: String,

    /// Filter expression selecting the types under test (all types when absent)
    #[serde(default)]
    pub that: Option<String>,

    /// Filter expression the selected types must satisfy
    pub should: String,

    /// Selected types must NOT satisfy `should`
    #[serde(default)]
    pub negate: bool,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, SiftError> {
        let content = fs::read_to_string(path)
            .map_err(|e| SiftError::Config(format!("failed to read config file: {}", e)))?;
        Config::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, SiftError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| SiftError::Config(format!("failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `typesift.toml` in the given project root
    pub fn load_from_project(project_root: &Path) -> Result<Self, SiftError> {
        let config_path = project_root.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    fn validate(&self) -> Result<(), SiftError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(SiftError::Config(format!("rule #{} has an empty name", index)));
            }
            if self.rules[..index].iter().any(|r| r.name == rule.name) {
                return Err(SiftError::Config(format!(
                    "duplicate rule name '{}'",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}
