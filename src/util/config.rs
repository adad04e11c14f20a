//! Configuration file support for the resolver.
//!
//! Two configuration file locations are honored:
//! - Global: user-wide defaults, supplied by the embedder
//! - Project: `.fairway/resolver.toml` under the project root
//!
//! Project config takes precedence over global config.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Resolver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Registered path variables, substituted in `${NAME}` form.
    pub variables: HashMap<String, String>,

    /// Validation settings
    pub validation: ValidationConfig,
}

/// Validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Check that include/library/macro-file targets exist.
    pub check_existence: bool,

    /// Validate container-contributed entries one level deep.
    pub recurse_in_containers: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            check_existence: true,
            recurse_in_containers: false,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read resolver config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse resolver config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is
    /// missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to load resolver config from {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one. Values from `other` win.
    pub fn merge(&mut self, other: ResolverConfig) {
        for (name, value) in other.variables {
            self.variables.insert(name, value);
        }
        self.validation = other.validation;
    }

    /// Register a path variable programmatically.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }
}

/// Load global then project configuration, project values winning.
pub fn load_config(global_path: &Path, project_path: &Path) -> ResolverConfig {
    let mut config = ResolverConfig::load_or_default(global_path);
    if project_path.exists() {
        config.merge(ResolverConfig::load_or_default(project_path));
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_variables_and_validation() {
        let config: ResolverConfig = toml::from_str(
            r#"
[variables]
SDK_HOME = "/opt/sdk"

[validation]
check_existence = false
"#,
        )
        .unwrap();

        assert_eq!(config.variables["SDK_HOME"], "/opt/sdk");
        assert!(!config.validation.check_existence);
        assert!(!config.validation.recurse_in_containers);
    }

    #[test]
    fn defaults_when_empty() {
        let config: ResolverConfig = toml::from_str("").unwrap();
        assert!(config.variables.is_empty());
        assert!(config.validation.check_existence);
    }

    #[test]
    fn merge_prefers_other() {
        let mut base = ResolverConfig::default();
        base.set_variable("A", "1");
        base.set_variable("B", "2");

        let mut project = ResolverConfig::default();
        project.set_variable("B", "override");
        project.validation.check_existence = false;

        base.merge(project);
        assert_eq!(base.variables["A"], "1");
        assert_eq!(base.variables["B"], "override");
        assert!(!base.validation.check_existence);
    }

    #[test]
    fn load_config_project_over_global() {
        let tmp = tempfile::TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("resolver.toml");

        std::fs::write(&global, "[variables]\nROOT = \"/global\"\n").unwrap();
        std::fs::write(&project, "[variables]\nROOT = \"/project\"\n").unwrap();

        let config = load_config(&global, &project);
        assert_eq!(config.variables["ROOT"], "/project");
    }
}
