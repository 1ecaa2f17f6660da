pub mod context;
pub mod core;
pub mod evaluate;
pub mod extensions;
pub mod factory;
pub mod normalize;
pub mod registry;
pub mod ticket;

use crate::config::{BranchConfig, RuleConfig, RuleSeverity};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use context::{create_rule_context, RuleContext, RuleContextInput};
pub use evaluate::{evaluate_rule, evaluate_rules, prepare_rule_options, resolve_rule_config};
pub use normalize::{get_ticket_id_rule, normalize_rule_config};
pub use registry::{create_registry, RuleRegistry};

/// Failures that make a validation environment untrustworthy.
///
/// These abort the whole evaluation; violations are data and never show up here.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("Rule with id \"{0}\" is already registered.")]
    DuplicateRuleId(String),
    #[error("Rule {path} must be JSON-serializable. Unsupported value type: {kind}")]
    OptionsNotSerializable { path: String, kind: &'static str },
    #[error("Rule \"{rule_id}\" returned an invalid message.")]
    InvalidMessage { rule_id: String },
    #[error("Rule \"{rule_id}\" suggestion at index {index} must be a non-empty string.")]
    InvalidSuggestion { rule_id: String, index: usize },
}

/// Descriptive metadata shown in reports and docs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

impl RuleMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_docs_url(mut self, docs_url: impl Into<String>) -> Self {
        self.docs_url = Some(docs_url.into());
        self
    }
}

/// Computes a fallback config from the whole branch config when `rules.<id>` is absent.
pub type DeriveConfigFn = fn(&BranchConfig) -> Option<RuleConfig>;

/// Static identity and defaults of a rule.
#[derive(Debug, Clone)]
pub struct RuleManifest {
    pub id: String,
    pub meta: RuleMeta,
    pub default_severity: RuleSeverity,
    pub default_options: Option<toml::Value>,
    pub derive_config: Option<DeriveConfigFn>,
}

impl RuleManifest {
    pub fn new(id: impl Into<String>, meta: RuleMeta, default_severity: RuleSeverity) -> Self {
        Self {
            id: id.into(),
            meta,
            default_severity,
            default_options: None,
            derive_config: None,
        }
    }

    #[must_use]
    pub fn with_default_options(mut self, options: toml::Value) -> Self {
        self.default_options = Some(options);
        self
    }

    #[must_use]
    pub fn with_derive_config(mut self, derive: DeriveConfigFn) -> Self {
        self.derive_config = Some(derive);
        self
    }
}

/// A rule's raw finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    pub message: String,
    pub suggestions: Vec<String>,
    /// Overrides the resolved rule severity for this finding.
    pub severity: Option<RuleSeverity>,
}

impl RuleIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
            severity: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: RuleSeverity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// A finding stamped with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleExecution {
    pub rule_id: String,
    pub severity: RuleSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Checks one rule against a branch.
///
/// `options` is a private JSON snapshot of the resolved rule options.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, context: &RuleContext, options: Option<&serde_json::Value>) -> Option<RuleIssue>;
}

impl<F> RuleEvaluator for F
where
    F: Fn(&RuleContext, Option<&serde_json::Value>) -> Option<RuleIssue> + Send + Sync,
{
    fn evaluate(&self, context: &RuleContext, options: Option<&serde_json::Value>) -> Option<RuleIssue> {
        self(context, options)
    }
}

/// A manifest paired with its evaluator.
#[derive(Clone)]
pub struct RuleDefinition {
    pub manifest: RuleManifest,
    pub evaluator: Arc<dyn RuleEvaluator>,
}

impl RuleDefinition {
    pub fn new(manifest: RuleManifest, evaluator: Arc<dyn RuleEvaluator>) -> Self {
        Self { manifest, evaluator }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

/// Build a rule definition from a manifest and an evaluator function.
///
/// ```
/// use branchwright::config::RuleSeverity;
/// use branchwright::rules::{define_rule, RuleIssue, RuleManifest, RuleMeta};
///
/// let no_wip = define_rule(
///     RuleManifest::new("no-wip", RuleMeta::new("Disallow WIP branches"), RuleSeverity::Required),
///     |ctx, _| {
///         ctx.branch_name()
///             .to_lowercase()
///             .contains("wip")
///             .then(|| RuleIssue::new("Branch names must not include \"wip\"."))
///     },
/// );
/// assert_eq!(no_wip.id(), "no-wip");
/// ```
pub fn define_rule<F>(manifest: RuleManifest, evaluate: F) -> RuleDefinition
where
    F: Fn(&RuleContext, Option<&serde_json::Value>) -> Option<RuleIssue> + Send + Sync + 'static,
{
    RuleDefinition::new(manifest, Arc::new(evaluate))
}
