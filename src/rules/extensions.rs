//! Plugin and preset resolution.
//!
//! Plugins contribute rule definitions; presets contribute rule configs. Both are
//! referenced by strings in the config and resolved through an [`ExtensionLoader`].
//!
//! The default [`FileExtensionLoader`] understands two kinds of reference:
//!
//! - names registered in its in-process catalog, which is how Rust code ships
//!   rule sets (`loader.register_plugin("acme", PluginExport::List(rules))`);
//! - paths (`./rules/branch.toml`, `/abs/path.toml`, `file://...`) to TOML files,
//!   resolved against the loader's base directory.
//!
//! A plugin file declares pattern rules:
//!
//! ```toml
//! [[rules]]
//! id = "no-wip"
//! type = "banned-pattern"
//! pattern = "(?i)wip"
//! regex = true
//! message = "Branch names must not include \"wip\"."
//! ```

use super::factory::{self, FactoryError};
use super::{RuleDefinition, RuleRegistry};
use crate::cli::toml_config::{parse_preset_table, preset_rules, TomlPluginFile, TomlRule};
use crate::config::{RuleConfig, RuleConfigMap, RuleSeverity};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Rule extension \"{reference}\" could not be read from {}: {source}", .path.display())]
    Read {
        reference: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Rule extension \"{reference}\" is not valid TOML: {source}")]
    Parse {
        reference: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Rule extension \"{0}\" could not be resolved: it is neither a path nor a registered name.")]
    Unresolved(String),
    #[error(
        "Rule plugin \"{0}\" must export a list of rule definitions, a rule registry, or a table with a \"rules\" field."
    )]
    InvalidExport(String),
    #[error("Rule plugin \"{reference}\" has an invalid rule entry at index {index}: {reason}")]
    InvalidRuleEntry {
        reference: String,
        index: usize,
        reason: String,
    },
    #[error("Rule plugin \"{reference}\" rule at index {index} could not be built: {source}")]
    Factory {
        reference: String,
        index: usize,
        #[source]
        source: FactoryError,
    },
    #[error("Rule preset \"{0}\" must provide a \"rules\" table mapping rule ids to configurations.")]
    InvalidPreset(String),
    #[error("Rule preset \"{reference}\" has an invalid config for rule \"{rule_id}\": {source}")]
    InvalidPresetEntry {
        reference: String,
        rule_id: String,
        #[source]
        source: toml::de::Error,
    },
}

/// What a plugin reference resolves to.
#[derive(Debug, Clone)]
pub enum PluginExport {
    /// A plain list of rule definitions.
    List(Vec<RuleDefinition>),
    /// A whole registry; its entries are taken in order.
    Registry(RuleRegistry),
    /// A container carrying its rules in a `rules` field.
    Wrapped { rules: Vec<RuleDefinition> },
}

impl PluginExport {
    pub fn into_definitions(self) -> Vec<RuleDefinition> {
        match self {
            PluginExport::List(rules) => rules,
            PluginExport::Registry(registry) => registry.into_iter().collect(),
            PluginExport::Wrapped { rules } => rules,
        }
    }
}

/// Capability used to turn plugin and preset references into rules and configs.
pub trait ExtensionLoader {
    fn load_rules(&self, source: &str) -> Result<PluginExport, ExtensionError>;
    fn load_preset(&self, source: &str) -> Result<RuleConfigMap, ExtensionError>;
}

/// Presets that ship with the crate.
pub fn builtin_preset(name: &str) -> Option<RuleConfigMap> {
    match name {
        "recommended" => {
            let mut rules = RuleConfigMap::new();
            for id in ["structure", "branchType", "descriptionLength", "descriptionStyle"] {
                rules.insert(id.to_string(), RuleConfig::Severity(RuleSeverity::Required));
            }
            Some(rules)
        }
        _ => None,
    }
}

/// Resolve a path-like reference against `base_dir`. Bare names return `None`.
pub fn resolve_source_path(source: &str, base_dir: &Path) -> Option<PathBuf> {
    if let Some(stripped) = source.strip_prefix("file://") {
        return Some(PathBuf::from(stripped));
    }

    if source.starts_with('.') || source.starts_with('/') || source.starts_with('\\') {
        let path = Path::new(source);
        return Some(if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        });
    }

    None
}

/// Loads extensions from an in-process catalog and from TOML files on disk.
#[derive(Debug, Clone, Default)]
pub struct FileExtensionLoader {
    base_dir: PathBuf,
    plugins: HashMap<String, PluginExport>,
    presets: HashMap<String, RuleConfigMap>,
}

impl FileExtensionLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Make `export` available under `name`.
    pub fn register_plugin(&mut self, name: impl Into<String>, export: PluginExport) {
        self.plugins.insert(name.into(), export);
    }

    /// Make a preset available under `name`.
    pub fn register_preset(&mut self, name: impl Into<String>, rules: RuleConfigMap) {
        self.presets.insert(name.into(), rules);
    }

    fn read_table(&self, source: &str, path: &Path) -> Result<toml::Table, ExtensionError> {
        let text = fs::read_to_string(path).map_err(|e| ExtensionError::Read {
            reference: source.to_string(),
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&text).map_err(|e| ExtensionError::Parse {
            reference: source.to_string(),
            source: e,
        })
    }
}

impl ExtensionLoader for FileExtensionLoader {
    fn load_rules(&self, source: &str) -> Result<PluginExport, ExtensionError> {
        if let Some(export) = self.plugins.get(source) {
            return Ok(export.clone());
        }

        let path = resolve_source_path(source, &self.base_dir)
            .ok_or_else(|| ExtensionError::Unresolved(source.to_string()))?;
        let table = self.read_table(source, &path)?;
        let file: TomlPluginFile = toml::Value::Table(table)
            .try_into()
            .map_err(|_| ExtensionError::InvalidExport(source.to_string()))?;

        let mut rules = Vec::with_capacity(file.rules.len());
        for (index, entry) in file.rules.into_iter().enumerate() {
            let toml_rule: TomlRule = entry.try_into().map_err(|e: toml::de::Error| {
                ExtensionError::InvalidRuleEntry {
                    reference: source.to_string(),
                    index,
                    reason: e.message().to_string(),
                }
            })?;
            let rule = factory::build_rule(&toml_rule.rule_type, &toml_rule.to_rule_spec()).map_err(|e| {
                ExtensionError::Factory {
                    reference: source.to_string(),
                    index,
                    source: e,
                }
            })?;
            rules.push(rule);
        }

        debug!(plugin = source, path = %path.display(), rules = rules.len(), "loaded plugin file");
        Ok(PluginExport::Wrapped { rules })
    }

    fn load_preset(&self, source: &str) -> Result<RuleConfigMap, ExtensionError> {
        if let Some(rules) = self.presets.get(source) {
            return Ok(rules.clone());
        }

        let path = resolve_source_path(source, &self.base_dir)
            .ok_or_else(|| ExtensionError::Unresolved(source.to_string()))?;
        let table = self.read_table(source, &path)?;
        let candidate = parse_preset_table(table).ok_or_else(|| ExtensionError::InvalidPreset(source.to_string()))?;

        preset_rules(candidate).map_err(|(rule_id, e)| ExtensionError::InvalidPresetEntry {
            reference: source.to_string(),
            rule_id,
            source: e,
        })
    }
}

/// Load every plugin in `sources`, in order. Empty references are skipped.
pub fn load_rule_definition_sets(
    sources: &[String],
    loader: &dyn ExtensionLoader,
) -> Result<Vec<RuleDefinition>, ExtensionError> {
    let mut definitions = Vec::new();
    for source in sources.iter().filter(|s| !s.is_empty()) {
        let rules = loader.load_rules(source)?.into_definitions();
        info!(plugin = %source, rules = rules.len(), "loaded rule plugin");
        definitions.extend(rules);
    }
    Ok(definitions)
}

/// Merge presets left to right; later presets override earlier ones.
pub fn load_rule_preset_configs(
    sources: &[String],
    loader: &dyn ExtensionLoader,
) -> Result<RuleConfigMap, ExtensionError> {
    let mut merged = RuleConfigMap::new();
    for source in sources.iter().filter(|s| !s.is_empty()) {
        let rules = match builtin_preset(source) {
            Some(rules) => rules,
            None => loader.load_preset(source)?,
        };
        debug!(preset = %source, rules = rules.len(), "applied rule preset");
        merged.extend(rules);
    }
    Ok(merged)
}
