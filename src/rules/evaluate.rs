use super::context::{create_rule_context, RuleContext, RuleContextInput};
use super::normalize::normalize_rule_config;
use super::{RuleDefinition, RuleError, RuleExecution, RuleRegistry};
use crate::config::{BranchConfig, NormalizedRuleConfig, RuleSeverity};
use serde_json::{Map, Number, Value};
use tracing::debug;

/// Run every registered rule against `branch_name`.
///
/// Violations come back in registration order. A misbehaving rule aborts the
/// whole pass with an error; no partial results are returned.
pub fn evaluate_rules(
    branch_name: &str,
    config: &BranchConfig,
    registry: &RuleRegistry,
) -> Result<Vec<RuleExecution>, RuleError> {
    let context = create_rule_context(RuleContextInput::parse(branch_name, config));

    let mut results = Vec::new();
    for definition in registry.entries() {
        let resolved = resolve_rule_config(config, definition);
        if let Some(execution) = evaluate_rule(definition, &context, &resolved)? {
            results.push(execution);
        }
    }

    debug!(
        branch = branch_name,
        rules = registry.len(),
        violations = results.len(),
        "evaluated branch rules"
    );
    Ok(results)
}

/// Effective config for one rule: explicit `rules.<id>`, then the manifest's
/// derived config, then the manifest defaults.
pub fn resolve_rule_config(config: &BranchConfig, rule: &RuleDefinition) -> NormalizedRuleConfig {
    let manifest = &rule.manifest;

    if let Some(custom) = config.rules.get(&manifest.id) {
        return normalize_rule_config(custom);
    }

    if let Some(derived) = manifest.derive_config.and_then(|derive| derive(config)) {
        return normalize_rule_config(&derived);
    }

    NormalizedRuleConfig {
        severity: manifest.default_severity,
        options: manifest.default_options.clone(),
    }
}

/// Evaluate a single rule with an already resolved config.
pub fn evaluate_rule(
    definition: &RuleDefinition,
    context: &RuleContext,
    config: &NormalizedRuleConfig,
) -> Result<Option<RuleExecution>, RuleError> {
    if config.severity == RuleSeverity::Off {
        return Ok(None);
    }

    let options = prepare_rule_options(config.options.as_ref())?;
    let Some(issue) = definition.evaluator.evaluate(context, options.as_ref()) else {
        return Ok(None);
    };

    let rule_id = definition.id();
    if issue.message.trim().is_empty() {
        return Err(RuleError::InvalidMessage {
            rule_id: rule_id.to_string(),
        });
    }

    if let Some(index) = issue.suggestions.iter().position(|s| s.trim().is_empty()) {
        return Err(RuleError::InvalidSuggestion {
            rule_id: rule_id.to_string(),
            index,
        });
    }

    Ok(Some(RuleExecution {
        rule_id: rule_id.to_string(),
        severity: issue.severity.unwrap_or(config.severity),
        message: issue.message,
        suggestions: issue.suggestions,
    }))
}

/// Snapshot rule options as plain JSON.
///
/// Anything TOML can hold that JSON cannot (datetimes, NaN or infinite floats)
/// is rejected, so every evaluator gets a detached copy of plain data.
pub fn prepare_rule_options(options: Option<&toml::Value>) -> Result<Option<Value>, RuleError> {
    options.map(|value| to_json(value, "options")).transpose()
}

fn to_json(value: &toml::Value, path: &str) -> Result<Value, RuleError> {
    match value {
        toml::Value::String(s) => Ok(Value::String(s.clone())),
        toml::Value::Integer(i) => Ok(Value::Number((*i).into())),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
            RuleError::OptionsNotSerializable {
                path: path.to_string(),
                kind: "non-finite float",
            }
        }),
        toml::Value::Datetime(_) => Err(RuleError::OptionsNotSerializable {
            path: path.to_string(),
            kind: "datetime",
        }),
        toml::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| to_json(item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        toml::Value::Table(table) => {
            let mut map = Map::new();
            for (key, entry) in table {
                map.insert(key.clone(), to_json(entry, &format!("{}.{}", path, key))?);
            }
            Ok(Value::Object(map))
        }
    }
}
