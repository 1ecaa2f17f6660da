//! A reusable validator that resolves plugins and presets once and lints many names.

use crate::cli::toml_config::load_config_with_meta;
use crate::config::{BranchConfig, ConfigPatch, RuleConfigMap};
use crate::error::Result;
use crate::lint::lint_branch_name;
use crate::rules::core::core_rule_registry;
use crate::rules::extensions::{
    load_rule_definition_sets, load_rule_preset_configs, FileExtensionLoader, PluginExport,
};
use crate::rules::{RuleExecution, RuleRegistry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Shown when violations carry no suggestions of their own.
pub const GENERIC_SUGGESTIONS: [&str; 3] = [
    "Try using one of the configured branch types",
    "Ensure description follows the configured style",
    "Check maximum description length",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchValidatorOptions {
    /// Directory used to find the config file and to resolve relative extensions.
    pub cwd: Option<PathBuf>,
    /// Config file the current config came from.
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// All violation messages joined with `"; "`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<RuleExecution>,
}

/// Effective config and registry after plugins and presets are applied.
#[derive(Debug)]
struct Environment {
    config: BranchConfig,
    registry: RuleRegistry,
}

/// Lints branch names against a config, its presets and its plugins.
///
/// Plugins and presets are loaded on the first [`validate`](Self::validate) and
/// reused until the config changes.
#[derive(Debug)]
pub struct BranchValidator {
    config: BranchConfig,
    options: BranchValidatorOptions,
    loader: FileExtensionLoader,
    environment: Mutex<Option<Arc<Environment>>>,
}

impl Default for BranchValidator {
    fn default() -> Self {
        Self::new(BranchConfig::default(), BranchValidatorOptions::default())
    }
}

impl BranchValidator {
    pub fn new(config: BranchConfig, options: BranchValidatorOptions) -> Self {
        Self {
            config,
            options,
            loader: FileExtensionLoader::default(),
            environment: Mutex::new(None),
        }
    }

    /// Make an in-process rule set available to `plugins = ["<name>"]`.
    pub fn register_plugin(&mut self, name: impl Into<String>, export: PluginExport) {
        self.loader.register_plugin(name, export);
        self.reset_environment();
    }

    /// Make an in-process preset available to `presets = ["<name>"]`.
    pub fn register_preset(&mut self, name: impl Into<String>, rules: RuleConfigMap) {
        self.loader.register_preset(name, rules);
        self.reset_environment();
    }

    pub fn options(&self) -> &BranchValidatorOptions {
        &self.options
    }

    pub fn validate(&self, branch_name: &str) -> Result<ValidationResult> {
        let environment = self.environment()?;
        let lint = lint_branch_name(branch_name, &environment.config, Some(&environment.registry))?;

        if lint.errors.is_empty() {
            return Ok(ValidationResult {
                valid: lint.is_valid,
                message: None,
                suggestions: None,
                violations: lint.violations,
            });
        }

        let mut suggestions: Vec<String> = lint
            .violations
            .iter()
            .flat_map(|v| v.suggestions.iter().cloned())
            .collect();
        if suggestions.is_empty() {
            suggestions = GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        }

        Ok(ValidationResult {
            valid: lint.is_valid,
            message: Some(lint.errors.join("; ")),
            suggestions: Some(suggestions),
            violations: lint.violations,
        })
    }

    /// Core rules plus every loaded plugin rule, in registration order.
    pub fn rule_registry(&self) -> Result<RuleRegistry> {
        Ok(self.environment()?.registry.clone())
    }

    /// Replace the config with whatever is found on disk (or the defaults).
    pub fn load_config_from_file(&mut self) {
        let cwd = self.cwd();
        let result = load_config_with_meta(&cwd);
        self.config = result.config;
        if let Some(path) = result.filepath {
            self.options.config_path = Some(path);
        }
        self.reset_environment();
    }

    /// The config rules see: authored config plus resolved presets once loaded.
    pub fn get_config(&self) -> BranchConfig {
        match self.lock_environment().as_ref() {
            Some(environment) => environment.config.clone(),
            None => self.config.clone(),
        }
    }

    pub fn update_config(&mut self, patch: ConfigPatch) {
        self.config.merge(patch);
        self.reset_environment();
    }

    fn cwd(&self) -> PathBuf {
        self.options
            .cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn base_dir(&self) -> PathBuf {
        match self.options.config_path.as_deref().and_then(Path::parent) {
            Some(dir) => dir.to_path_buf(),
            None => self.cwd(),
        }
    }

    fn lock_environment(&self) -> MutexGuard<'_, Option<Arc<Environment>>> {
        self.environment.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reset_environment(&mut self) {
        *self.lock_environment() = None;
    }

    /// Build the environment on first use. The lock is held while building so
    /// concurrent callers wait for the same result.
    fn environment(&self) -> Result<Arc<Environment>> {
        let mut slot = self.lock_environment();
        if let Some(environment) = slot.as_ref() {
            return Ok(Arc::clone(environment));
        }

        let environment = Arc::new(self.build_environment()?);
        *slot = Some(Arc::clone(&environment));
        Ok(environment)
    }

    fn build_environment(&self) -> Result<Environment> {
        let base_dir = self.base_dir();
        let loader = self.loader.clone().with_base_dir(&base_dir);

        let plugins = load_rule_definition_sets(&self.config.plugins, &loader)?;
        let mut rules = load_rule_preset_configs(&self.config.presets, &loader)?;
        rules.extend(self.config.rules.clone());

        let mut registry = core_rule_registry();
        for definition in plugins {
            registry.register(definition)?;
        }

        let config = BranchConfig {
            rules,
            ..self.config.clone()
        };

        info!(base_dir = %base_dir.display(), rules = registry.len(), "built validation environment");
        debug!(ids = ?registry.ids(), "registered rules");
        Ok(Environment { config, registry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BranchTypeOption, RuleConfig, RuleSeverity};
    use crate::error::BranchwrightError;
    use crate::rules::{define_rule, RuleError, RuleIssue, RuleManifest, RuleMeta};

    fn no_wip() -> PluginExport {
        PluginExport::List(vec![define_rule(
            RuleManifest::new("no-wip", RuleMeta::new("No WIP"), RuleSeverity::Required),
            |ctx, _| {
                ctx.branch_name()
                    .to_lowercase()
                    .contains("wip")
                    .then(|| RuleIssue::new("Branch names must not include \"wip\".").with_suggestion("Drop \"wip\""))
            },
        )])
    }

    fn validator() -> BranchValidator {
        BranchValidator::new(
            BranchConfig {
                branch_types: vec![
                    BranchTypeOption::new("feat", "Feature"),
                    BranchTypeOption::new("fix", "Fix"),
                ],
                ..Default::default()
            },
            BranchValidatorOptions::default(),
        )
    }

    #[test]
    fn valid_names_have_no_message() {
        let result = validator().validate("feat/add-login").unwrap();
        assert!(result.valid);
        assert_eq!(result.message, None);
        assert_eq!(result.suggestions, None);
    }

    #[test]
    fn messages_are_joined_and_generic_hints_fill_in() {
        let result = validator().validate("bogus/Bad_Style").unwrap();
        assert!(!result.valid);
        let message = result.message.unwrap();
        assert!(message.starts_with("Invalid branch type \"bogus\""));
        assert!(message.contains("; Description \"Bad_Style\""));
        // The style rule suggested a fix, so no generic hints.
        assert_eq!(result.suggestions.unwrap(), vec!["Try \"bad-style\"".to_string()]);

        let result = validator().validate("bogus/fine").unwrap();
        assert_eq!(
            result.suggestions.unwrap(),
            GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn registered_plugins_join_the_core_rules() {
        let mut validator = validator();
        validator.register_plugin("no-wip", no_wip());
        validator.update_config(ConfigPatch {
            plugins: Some(vec!["no-wip".into()]),
            ..Default::default()
        });

        let result = validator.validate("feat/wip-login").unwrap();
        assert!(!result.valid);
        assert_eq!(result.violations[0].rule_id, "no-wip");
        assert_eq!(result.suggestions.unwrap(), vec!["Drop \"wip\"".to_string()]);
    }

    #[test]
    fn plugin_ids_may_not_shadow_core_rules() {
        let mut validator = validator();
        let clash = define_rule(
            RuleManifest::new("structure", RuleMeta::new("mine"), RuleSeverity::Required),
            |_, _| None,
        );
        validator.register_plugin("clash", PluginExport::List(vec![clash]));
        validator.update_config(ConfigPatch {
            plugins: Some(vec!["clash".into()]),
            ..Default::default()
        });

        let err = validator.validate("feat/x").unwrap_err();
        assert!(matches!(
            err,
            BranchwrightError::Rule(RuleError::DuplicateRuleId(ref id)) if id == "structure"
        ));
    }

    #[test]
    fn update_config_rebuilds_the_environment() {
        let mut validator = validator();
        assert!(!validator.validate("chore/tidy").unwrap().valid);

        validator.update_config(ConfigPatch {
            branch_types: Some(vec![BranchTypeOption::new("chore", "Chore")]),
            ..Default::default()
        });
        assert!(validator.validate("chore/tidy").unwrap().valid);
        assert_eq!(validator.get_config().branch_type_names(), vec!["chore"]);
    }

    #[test]
    fn presets_resolve_under_explicit_rules() {
        let mut validator = validator();
        let mut preset = RuleConfigMap::new();
        preset.insert("descriptionStyle".into(), RuleConfig::Severity(RuleSeverity::Off));
        preset.insert("branchType".into(), RuleConfig::Severity(RuleSeverity::Off));
        validator.register_preset("relaxed", preset);

        let mut explicit = RuleConfigMap::new();
        explicit.insert("branchType".into(), RuleConfig::Toggle(true));
        validator.update_config(ConfigPatch {
            presets: Some(vec!["recommended".into(), "relaxed".into()]),
            rules: Some(explicit),
            ..Default::default()
        });

        let result = validator.validate("bogus/Any_Style").unwrap();
        let ids: Vec<_> = result.violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["branchType"]);

        let effective = validator.get_config();
        assert_eq!(effective.rules["descriptionStyle"], RuleConfig::Severity(RuleSeverity::Off));
        assert_eq!(effective.rules["structure"], RuleConfig::Severity(RuleSeverity::Required));
    }

    #[test]
    fn unknown_plugin_is_an_error() {
        let mut validator = validator();
        validator.update_config(ConfigPatch {
            plugins: Some(vec!["nowhere".into()]),
            ..Default::default()
        });
        assert!(matches!(validator.validate("feat/x"), Err(BranchwrightError::Extension(_))));
    }

    #[test]
    fn loads_config_from_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("branchwright.toml"), "maxDescriptionLength = 5\n").unwrap();

        let mut validator = BranchValidator::new(
            BranchConfig::default(),
            BranchValidatorOptions {
                cwd: Some(dir.path().to_path_buf()),
                config_path: None,
            },
        );
        validator.load_config_from_file();

        assert_eq!(validator.options().config_path, Some(dir.path().join("branchwright.toml")));
        assert_eq!(validator.get_config().max_description_length, 5);
        assert!(!validator.validate("feat/too-long").unwrap().valid);
    }
}
