//! Configuration - user defaults, project settings and environment overrides
//!
//! Layers are applied in order, later layers winning field by field:
//! built-in defaults, the user config (`<config dir>/tsrc/config.yaml`),
//! the project's `.tsrc/config.yaml`, then `TSRC_*` environment variables.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use ulid::Ulid;

use crate::core::currency::CurrencyDefinition;
use crate::core::project::Project;
use crate::yaml::{parse_yaml_file, YamlError};

/// Environment variable overriding the order reference prefix
pub const ENV_ORDER_REF_PREFIX: &str = "TSRC_ORDER_REF_PREFIX";

/// Errors loading configuration
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Currency all prices are compared in
    pub native_currency: CurrencyDefinition,

    /// Directory of vendor price lists, relative to the project root
    pub vendors_dir: PathBuf,

    /// Quantity guidelines file, relative to the project root
    pub guidelines_file: PathBuf,

    /// Directory holding `hs_codes.yaml`, relative to the project root
    pub customs_dir: PathBuf,

    /// Vendors allowed for sourcing; empty allows every active vendor
    pub allowed_vendors: Vec<String>,

    /// Prefix for generated order references
    pub order_ref_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            native_currency: CurrencyDefinition::default(),
            vendors_dir: PathBuf::from("vendors"),
            guidelines_file: PathBuf::from("guidelines.yaml"),
            customs_dir: PathBuf::from("customs"),
            allowed_vendors: Vec::new(),
            order_ref_prefix: "PO".to_string(),
        }
    }
}

/// One configuration layer; absent fields leave the lower layer untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    native_currency: Option<CurrencyDefinition>,
    vendors_dir: Option<PathBuf>,
    guidelines_file: Option<PathBuf>,
    customs_dir: Option<PathBuf>,
    allowed_vendors: Option<Vec<String>>,
    order_ref_prefix: Option<String>,
}

impl Config {
    /// Load the layered configuration for a project
    pub fn load(project: Option<&Project>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user_path) = Self::user_config_path() {
            config.apply_file(&user_path)?;
        }
        if let Some(project) = project {
            config.apply_file(&project.config_path())?;
        }
        if let Ok(prefix) = std::env::var(ENV_ORDER_REF_PREFIX) {
            if !prefix.trim().is_empty() {
                config.order_ref_prefix = prefix.trim().to_string();
            }
        }
        Ok(config)
    }

    /// Location of the per-user configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tsrc").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Ok(());
        }
        let layer: ConfigLayer = parse_yaml_file(path)?;
        self.apply(layer);
        Ok(())
    }

    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.native_currency {
            self.native_currency = v;
        }
        if let Some(v) = layer.vendors_dir {
            self.vendors_dir = v;
        }
        if let Some(v) = layer.guidelines_file {
            self.guidelines_file = v;
        }
        if let Some(v) = layer.customs_dir {
            self.customs_dir = v;
        }
        if let Some(v) = layer.allowed_vendors {
            self.allowed_vendors = v;
        }
        if let Some(v) = layer.order_ref_prefix {
            self.order_ref_prefix = v;
        }
    }

    /// Vendors directory resolved against the project root
    pub fn vendors_path(&self, project: &Project) -> PathBuf {
        project.root().join(&self.vendors_dir)
    }

    /// Guidelines file resolved against the project root
    pub fn guidelines_path(&self, project: &Project) -> PathBuf {
        project.root().join(&self.guidelines_file)
    }

    /// HS code table resolved against the project root
    pub fn hs_codes_path(&self, project: &Project) -> PathBuf {
        project.root().join(&self.customs_dir).join("hs_codes.yaml")
    }

    /// A fresh, unique order reference
    pub fn generate_order_ref(&self) -> String {
        format!("{}-{}", self.order_ref_prefix, Ulid::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_project_layer_overrides_defaults() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        fs::write(
            project.config_path(),
            "native_currency:\n  code: INR\n  symbol: \"₹\"\nallowed_vendors: [acme]\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_file(&project.config_path()).unwrap();

        assert_eq!(config.native_currency.code, "INR");
        assert_eq!(config.allowed_vendors, vec!["acme".to_string()]);
        // Untouched fields keep their defaults
        assert_eq!(config.vendors_dir, PathBuf::from("vendors"));
        assert_eq!(config.vendors_path(&project), tmp.path().join("vendors"));
    }

    #[test]
    fn test_missing_layer_is_ignored() {
        let mut config = Config::default();
        config
            .apply_file(Path::new("/nonexistent/tsrc/config.yaml"))
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_layer_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "allowed_vendors: {not: [a list").unwrap();

        let mut config = Config::default();
        assert!(config.apply_file(&path).is_err());
    }

    #[test]
    fn test_generated_order_ref_uses_prefix() {
        let config = Config {
            order_ref_prefix: "BUILD".to_string(),
            ..Config::default()
        };
        let a = config.generate_order_ref();
        let b = config.generate_order_ref();
        assert!(a.starts_with("BUILD-"));
        assert_ne!(a, b);
    }
}
