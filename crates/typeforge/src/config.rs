// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kernel configuration.
//!
//! - **Constants**: defaults for subclass naming and environment keys.
//! - **[`KernelConfig`]**: settings read once when a
//!   [`TypeFactory`](crate::TypeFactory) is created. The dump directory
//!   can later be changed on the live
//!   [`SubclassFactory`](crate::SubclassFactory).
//!
//! # Example YAML
//!
//! ```yaml
//! # typeforge.yaml
//! subclass_package: app.subclasses
//! subclass_name_template: "{base}$App${n}"
//! dump_dir: /tmp/typeforge-classes
//! ```

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Package synthesized layout classes are defined in.
pub const DEFAULT_SUBCLASS_PACKAGE: &str = "typeforge.subclasses";

/// Name template for synthesized classes. `{base}` is the simple name of
/// the base class and `{n}` a counter per base name.
pub const DEFAULT_SUBCLASS_NAME_TEMPLATE: &str = "Derived${base}${n}";

/// Environment variable naming a directory to dump class bodies into.
pub const ENV_DUMP_DIR: &str = "TYPEFORGE_DUMP_DIR";

/// Environment variable overriding the subclass package.
pub const ENV_SUBCLASS_PACKAGE: &str = "TYPEFORGE_SUBCLASS_PACKAGE";

/// Settings for a type factory and its subclass factory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct KernelConfig {
    /// Dotted package prefix for synthesized classes.
    pub subclass_package: String,
    /// Template for the simple name of synthesized classes.
    pub subclass_name_template: String,
    /// Where to write each synthesized class body, if anywhere.
    pub dump_dir: Option<PathBuf>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            subclass_package: DEFAULT_SUBCLASS_PACKAGE.to_string(),
            subclass_name_template: DEFAULT_SUBCLASS_NAME_TEMPLATE.to_string(),
            dump_dir: None,
        }
    }
}

impl KernelConfig {
    /// Parse a YAML document; missing keys take their defaults.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file(path: &std::path::Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply `TYPEFORGE_DUMP_DIR` and `TYPEFORGE_SUBCLASS_PACKAGE` if set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DUMP_DIR).filter(|d| !d.is_empty()) {
            self.dump_dir = Some(PathBuf::from(dir));
        }
        if let Some(package) = lookup(ENV_SUBCLASS_PACKAGE).filter(|p| !p.is_empty()) {
            self.subclass_package = package;
        }
        self
    }

    /// Check the template can produce distinct names.
    pub fn validate(&self) -> Result<()> {
        for placeholder in ["{base}", "{n}"] {
            if !self.subclass_name_template.contains(placeholder) {
                return Err(Error::Config(format!(
                    "subclass_name_template '{}' lacks {}",
                    self.subclass_name_template, placeholder
                )));
            }
        }
        if self.subclass_package.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "subclass_package '{}' contains whitespace",
                self.subclass_package
            )));
        }
        Ok(())
    }

    /// Expand the name template.
    pub(crate) fn subclass_name(&self, base: &str, n: u32) -> String {
        self.subclass_name_template
            .replace("{base}", base)
            .replace("{n}", &n.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = KernelConfig::default();
        config.validate().unwrap();
        assert_eq!(config.subclass_name("object", 3), "Derived$object$3");
    }

    #[test]
    fn test_template_without_counter_rejected() {
        let config = KernelConfig {
            subclass_name_template: "Fixed{base}".into(),
            ..KernelConfig::default()
        };
        match config.validate() {
            Err(Error::Config(msg)) => assert!(msg.contains("{n}")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [(ENV_DUMP_DIR, "/tmp/classes"), (ENV_SUBCLASS_PACKAGE, "app.gen")]
            .into_iter()
            .collect();
        let config = KernelConfig::default().with_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.dump_dir, Some(PathBuf::from("/tmp/classes")));
        assert_eq!(config.subclass_package, "app.gen");

        let untouched = KernelConfig::default().with_overrides_from(|_| Some(String::new()));
        assert_eq!(untouched, KernelConfig::default());
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_partial_document() {
        let config = KernelConfig::from_yaml_str("subclass_package: app.subclasses\n").unwrap();
        assert_eq!(config.subclass_package, "app.subclasses");
        assert_eq!(config.subclass_name_template, DEFAULT_SUBCLASS_NAME_TEMPLATE);
        assert!(config.dump_dir.is_none());
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_invalid_template() {
        let err = KernelConfig::from_yaml_str("subclass_name_template: \"{base}\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
