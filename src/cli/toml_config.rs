use crate::config::{BranchConfig, RuleConfigMap, RuleSeverity};
use crate::rules::extensions::{load_rule_preset_configs, ExtensionError, FileExtensionLoader};
use crate::rules::factory::{PatternRuleSpec, PatternTarget};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// File names searched, in order, in the working directory.
pub const CONFIG_FILE_NAMES: &[&str] = &["branchwright.toml", ".branchwright.toml"];

/// Starter config written by `brw init`.
pub const INIT_TEMPLATE: &str = r#"# Branch naming rules for this repository.
maxDescriptionLength = 24
descriptionStyle = "kebab-case"
ignoredBranches = ["main", "master", "next", "dev", "develop", "release/*"]
template = "{{type}}/{{desc}}"
presets = ["recommended"]
plugins = []

[[branchTypes]]
name = "feat"
label = "Feature"

[[branchTypes]]
name = "fix"
label = "Bug Fix"

[[branchTypes]]
name = "chore"
label = "Chore"

[rules]
# ticketId = ["optional", { prefix = "PROJ-" }]
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to resolve presets: {0}")]
    Preset(#[from] ExtensionError),
}

/// A loaded configuration and the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadConfigResult {
    pub config: BranchConfig,
    pub filepath: Option<PathBuf>,
}

/// Return the first config file present in `dir`.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Parse a config file and fold its presets under its explicit rules.
pub fn read_config_file(path: &Path) -> Result<BranchConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: BranchConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if config.branch_types.is_empty() {
        config.branch_types = BranchConfig::default().branch_types;
    }

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let loader = FileExtensionLoader::new(base_dir);
    let mut rules = load_rule_preset_configs(&config.presets, &loader)?;
    rules.extend(std::mem::take(&mut config.rules));
    config.rules = rules;

    Ok(config)
}

/// Find and load the config for `cwd`. Problems are logged and defaults used instead.
pub fn load_config_with_meta(cwd: &Path) -> LoadConfigResult {
    let Some(path) = find_config_file(cwd) else {
        debug!(dir = %cwd.display(), "no config file found, using defaults");
        return LoadConfigResult {
            config: BranchConfig::default(),
            filepath: None,
        };
    };

    match read_config_file(&path) {
        Ok(config) => {
            debug!(path = %path.display(), "loaded config");
            LoadConfigResult {
                config,
                filepath: Some(path),
            }
        }
        Err(e) => {
            warn!("Failed to load branchwright configuration, falling back to defaults: {}", e);
            LoadConfigResult {
                config: BranchConfig::default(),
                filepath: None,
            }
        }
    }
}

pub fn load_config(cwd: &Path) -> BranchConfig {
    load_config_with_meta(cwd).config
}

/// A plugin file: a list of `[[rules]]` tables.
#[derive(Debug, Deserialize)]
pub struct TomlPluginFile {
    pub rules: Vec<toml::Value>,
}

/// A single `[[rules]]` entry of a plugin file.
#[derive(Debug, Deserialize)]
pub struct TomlRule {
    pub id: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub severity: Option<RuleSeverity>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub target: PatternTarget,
    pub pattern: Option<String>,
    #[serde(default)]
    pub regex: bool,
    pub message: Option<String>,
    pub suggest: Option<String>,
}

impl TomlRule {
    /// Convert to the input `factory::build_rule` takes.
    pub fn to_rule_spec(&self) -> PatternRuleSpec {
        PatternRuleSpec {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            severity: self.severity,
            target: self.target,
            pattern: self.pattern.clone(),
            regex: self.regex,
            message: self.message.clone(),
            suggest: self.suggest.clone(),
        }
    }
}

/// A preset file: either a `[rules]` table or rule ids at the top level.
pub fn parse_preset_table(table: toml::Table) -> Option<toml::Table> {
    match table.get("rules") {
        Some(toml::Value::Table(rules)) => Some(rules.clone()),
        Some(_) => None,
        None => Some(table),
    }
}

/// Convert a preset table into rule configs, reporting the first bad entry.
pub fn preset_rules(table: toml::Table) -> Result<RuleConfigMap, (String, toml::de::Error)> {
    let mut rules = RuleConfigMap::new();
    for (rule_id, value) in table {
        let config = value.try_into().map_err(|e| (rule_id.clone(), e))?;
        rules.insert(rule_id, config);
    }
    Ok(rules)
}
