use crate::style::DescriptionStyle;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity level for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// The rule is skipped entirely.
    Off,
    /// Violations are reported but callers may choose not to block on them.
    Optional,
    /// Violations block.
    Required,
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSeverity::Off => write!(f, "off"),
            RuleSeverity::Optional => write!(f, "optional"),
            RuleSeverity::Required => write!(f, "required"),
        }
    }
}

impl std::str::FromStr for RuleSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(RuleSeverity::Off),
            "optional" => Ok(RuleSeverity::Optional),
            "required" => Ok(RuleSeverity::Required),
            _ => Err(format!("invalid severity: '{}'", s)),
        }
    }
}

/// Canonical form every [`RuleConfig`] reduces to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRuleConfig {
    pub severity: RuleSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<toml::Value>,
}

impl NormalizedRuleConfig {
    pub fn new(severity: RuleSeverity) -> Self {
        Self {
            severity,
            options: None,
        }
    }

    pub fn with_options(severity: RuleSeverity, options: toml::Value) -> Self {
        Self {
            severity,
            options: Some(options),
        }
    }
}

/// Per-rule configuration as authored.
///
/// ```toml
/// [rules]
/// structure = true
/// branchType = "required"
/// ticketId = ["required", { prefix = "PROJ-" }]
/// descriptionStyle = { severity = "optional" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleConfig {
    Toggle(bool),
    Severity(RuleSeverity),
    Tuple(RuleSeverity, Option<toml::Value>),
    Full(NormalizedRuleConfig),
}

impl From<RuleSeverity> for RuleConfig {
    fn from(severity: RuleSeverity) -> Self {
        RuleConfig::Severity(severity)
    }
}

impl From<bool> for RuleConfig {
    fn from(enabled: bool) -> Self {
        RuleConfig::Toggle(enabled)
    }
}

impl From<NormalizedRuleConfig> for RuleConfig {
    fn from(config: NormalizedRuleConfig) -> Self {
        RuleConfig::Full(config)
    }
}

/// Rule id to authored configuration.
pub type RuleConfigMap = BTreeMap<String, RuleConfig>;

/// Legacy ticket prompt mode, superseded by `rules.ticketId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketIdPromptMode {
    Required,
    Optional,
    Skip,
}

/// A configured branch type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTypeOption {
    /// Identifier used in branch names, e.g. `feat`.
    pub name: String,
    /// Human-readable label.
    pub label: String,
}

impl BranchTypeOption {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Pattern matched against full branch names to skip linting.
///
/// Written as `"/.../"` it is a regular expression, otherwise a glob where
/// `*` matches any run of characters (slashes included) and `?` one character.
/// Every other character, brackets and braces included, matches itself.
#[derive(Clone)]
pub enum BranchIgnorePattern {
    Glob { source: String, matcher: Regex },
    Regex(Regex),
}

impl BranchIgnorePattern {
    pub fn glob(pattern: &str) -> Result<Self, regex::Error> {
        let body = regex::escape(pattern).replace(r"\*", ".*").replace(r"\?", ".");
        let matcher = Regex::new(&format!("^{}$", body))?;
        Ok(BranchIgnorePattern::Glob {
            source: pattern.to_string(),
            matcher,
        })
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(BranchIgnorePattern::Regex(Regex::new(pattern)?))
    }

    pub fn matches(&self, branch_name: &str) -> bool {
        match self {
            BranchIgnorePattern::Glob { matcher, .. } => matcher.is_match(branch_name),
            BranchIgnorePattern::Regex(re) => re.is_match(branch_name),
        }
    }

    pub fn as_config_string(&self) -> String {
        match self {
            BranchIgnorePattern::Glob { source, .. } => source.clone(),
            BranchIgnorePattern::Regex(re) => format!("/{}/", re.as_str()),
        }
    }
}

impl fmt::Debug for BranchIgnorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchIgnorePattern::Glob { source, .. } => f.debug_tuple("Glob").field(source).finish(),
            BranchIgnorePattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
        }
    }
}

impl PartialEq for BranchIgnorePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_config_string() == other.as_config_string()
    }
}

impl TryFrom<String> for BranchIgnorePattern {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() >= 2 && value.starts_with('/') && value.ends_with('/') {
            let inner = &value[1..value.len() - 1];
            return BranchIgnorePattern::regex(inner)
                .map_err(|e| format!("invalid ignore regex '{}': {}", value, e));
        }
        BranchIgnorePattern::glob(&value).map_err(|e| format!("invalid ignore glob '{}': {}", value, e))
    }
}

impl Serialize for BranchIgnorePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_config_string())
    }
}

impl<'de> Deserialize<'de> for BranchIgnorePattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BranchIgnorePattern::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// The effective configuration every lint and build operation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BranchConfig {
    pub branch_types: Vec<BranchTypeOption>,
    #[serde(deserialize_with = "positive_length")]
    pub max_description_length: usize,
    pub ignored_branches: Vec<BranchIgnorePattern>,
    pub description_style: DescriptionStyle,
    /// Name template with `{{type}}`, `{{ticket}}` and `{{desc}}` placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub plugins: Vec<String>,
    pub presets: Vec<String>,
    pub rules: RuleConfigMap,
    /// Deprecated: use `rules.ticketId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id_prompt: Option<TicketIdPromptMode>,
    /// Deprecated: use the `prefix` option of `rules.ticketId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id_prefix: Option<String>,
}

fn positive_length<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let length = usize::deserialize(deserializer)?;
    if length == 0 {
        return Err(serde::de::Error::custom("maxDescriptionLength must be a positive integer"));
    }
    Ok(length)
}

fn optional_positive_length<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    positive_length(deserializer).map(Some)
}

pub const DEFAULT_IGNORED_BRANCHES: &[&str] = &["main", "master", "next", "dev", "develop", "release/*"];

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            branch_types: vec![
                BranchTypeOption::new("feat", "Feature"),
                BranchTypeOption::new("fix", "Bug Fix"),
                BranchTypeOption::new("chore", "Chore"),
            ],
            max_description_length: 24,
            ignored_branches: DEFAULT_IGNORED_BRANCHES
                .iter()
                .filter_map(|p| BranchIgnorePattern::glob(p).ok())
                .collect(),
            description_style: DescriptionStyle::KebabCase,
            template: Some("{{type}}/{{desc}}".to_string()),
            plugins: Vec::new(),
            presets: vec!["recommended".to_string()],
            rules: RuleConfigMap::new(),
            ticket_id_prompt: Some(TicketIdPromptMode::Optional),
            ticket_id_prefix: None,
        }
    }
}

impl BranchConfig {
    pub fn branch_type_names(&self) -> Vec<&str> {
        self.branch_types.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn find_branch_type(&self, name: &str) -> Option<&BranchTypeOption> {
        self.branch_types.iter().find(|t| t.name == name)
    }

    pub fn is_ignored(&self, branch_name: &str) -> bool {
        self.ignored_branches.iter().any(|p| p.matches(branch_name))
    }

    /// Apply a partial update. Lists are replaced, the rules map is merged key by key.
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(branch_types) = patch.branch_types {
            self.branch_types = branch_types;
        }
        if let Some(max) = patch.max_description_length {
            self.max_description_length = max;
        }
        if let Some(ignored) = patch.ignored_branches {
            self.ignored_branches = ignored;
        }
        if let Some(style) = patch.description_style {
            self.description_style = style;
        }
        if let Some(template) = patch.template {
            self.template = Some(template);
        }
        if let Some(plugins) = patch.plugins {
            self.plugins = plugins;
        }
        if let Some(presets) = patch.presets {
            self.presets = presets;
        }
        if let Some(rules) = patch.rules {
            self.rules.extend(rules);
        }
        if let Some(prompt) = patch.ticket_id_prompt {
            self.ticket_id_prompt = Some(prompt);
        }
        if let Some(prefix) = patch.ticket_id_prefix {
            self.ticket_id_prefix = Some(prefix);
        }
    }
}

/// Partial configuration used for incremental updates.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    pub branch_types: Option<Vec<BranchTypeOption>>,
    #[serde(deserialize_with = "optional_positive_length")]
    pub max_description_length: Option<usize>,
    pub ignored_branches: Option<Vec<BranchIgnorePattern>>,
    pub description_style: Option<DescriptionStyle>,
    pub template: Option<String>,
    pub plugins: Option<Vec<String>>,
    pub presets: Option<Vec<String>>,
    pub rules: Option<RuleConfigMap>,
    pub ticket_id_prompt: Option<TicketIdPromptMode>,
    pub ticket_id_prefix: Option<String>,
}
