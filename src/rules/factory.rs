use super::{RuleContext, RuleDefinition, RuleEvaluator, RuleIssue, RuleManifest, RuleMeta};
use crate::config::RuleSeverity;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("unknown rule type: '{0}'")]
    UnknownRuleType(String),
    #[error("rule '{0}' is missing required field '{1}'")]
    MissingField(String, &'static str),
    #[error("rule '{0}' has an invalid regex: {1}")]
    InvalidRegex(String, #[source] regex::Error),
}

/// Which part of the branch name a pattern rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternTarget {
    #[default]
    Branch,
    Type,
    Ticket,
    Description,
}

impl PatternTarget {
    fn select<'a>(&self, ctx: &'a RuleContext) -> Option<&'a str> {
        match self {
            PatternTarget::Branch => Some(ctx.branch_name()),
            PatternTarget::Type => ctx.branch_type_segment(),
            PatternTarget::Ticket => ctx.ticket_segment(),
            PatternTarget::Description => ctx.description_segment(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PatternTarget::Branch => "Branch name",
            PatternTarget::Type => "Branch type",
            PatternTarget::Ticket => "Ticket ID",
            PatternTarget::Description => "Description",
        }
    }
}

/// Declarative description of a pattern rule, as read from a plugin file.
#[derive(Debug, Clone, Default)]
pub struct PatternRuleSpec {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<RuleSeverity>,
    pub target: PatternTarget,
    pub pattern: Option<String>,
    /// Treat `pattern` as a regex instead of a literal substring.
    pub regex: bool,
    pub message: Option<String>,
    pub suggest: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternMode {
    /// Flag names where the pattern occurs.
    Banned,
    /// Flag names where the pattern is absent.
    Required,
}

/// Evaluator for a declarative pattern rule.
#[derive(Debug)]
struct PatternRule {
    mode: PatternMode,
    target: PatternTarget,
    pattern: String,
    compiled_regex: Option<Regex>,
    message: Option<String>,
    suggest: Option<String>,
}

impl PatternRule {
    fn new(mode: PatternMode, spec: &PatternRuleSpec) -> Result<Self, FactoryError> {
        let pattern = spec
            .pattern
            .as_ref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| FactoryError::MissingField(spec.id.clone(), "pattern"))?
            .clone();

        let compiled_regex = if spec.regex {
            let re = Regex::new(&pattern).map_err(|e| FactoryError::InvalidRegex(spec.id.clone(), e))?;
            Some(re)
        } else {
            None
        };

        Ok(Self {
            mode,
            target: spec.target,
            pattern,
            compiled_regex,
            message: spec.message.clone().filter(|m| !m.trim().is_empty()),
            suggest: spec.suggest.clone().filter(|s| !s.trim().is_empty()),
        })
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self.compiled_regex {
            Some(ref re) => re.is_match(haystack),
            None => haystack.contains(self.pattern.as_str()),
        }
    }

    fn default_message(&self, value: &str) -> String {
        match self.mode {
            PatternMode::Banned => format!(
                "{} \"{}\" must not match \"{}\".",
                self.target.label(),
                value,
                self.pattern
            ),
            PatternMode::Required => format!(
                "{} \"{}\" must match \"{}\".",
                self.target.label(),
                value,
                self.pattern
            ),
        }
    }
}

impl RuleEvaluator for PatternRule {
    fn evaluate(&self, ctx: &RuleContext, _options: Option<&serde_json::Value>) -> Option<RuleIssue> {
        let value = self.target.select(ctx)?;

        let violated = match self.mode {
            PatternMode::Banned => self.is_match(value),
            PatternMode::Required => !self.is_match(value),
        };
        if !violated {
            return None;
        }

        let message = self.message.clone().unwrap_or_else(|| self.default_message(value));
        let issue = RuleIssue::new(message);
        Some(match self.suggest {
            Some(ref suggest) => issue.with_suggestion(suggest.clone()),
            None => issue,
        })
    }
}

/// Build a rule definition from a type string and a declarative spec.
pub fn build_rule(rule_type: &str, spec: &PatternRuleSpec) -> Result<RuleDefinition, FactoryError> {
    if spec.id.trim().is_empty() {
        return Err(FactoryError::MissingField(spec.id.clone(), "id"));
    }

    let mode = match rule_type {
        "banned-pattern" => PatternMode::Banned,
        "required-pattern" => PatternMode::Required,
        _ => return Err(FactoryError::UnknownRuleType(rule_type.to_string())),
    };
    let evaluator = PatternRule::new(mode, spec)?;

    let mut meta = RuleMeta::new(spec.title.clone().unwrap_or_else(|| spec.id.clone()));
    meta.description = spec.description.clone();

    let manifest = RuleManifest::new(
        spec.id.clone(),
        meta,
        spec.severity.unwrap_or(RuleSeverity::Required),
    );
    Ok(RuleDefinition::new(manifest, Arc::new(evaluator)))
}
