use crate::config::{BranchConfig, NormalizedRuleConfig, RuleConfig, RuleSeverity, TicketIdPromptMode};

/// Reduce any authored rule config to `{severity, options?}`.
pub fn normalize_rule_config(config: &RuleConfig) -> NormalizedRuleConfig {
    match config {
        RuleConfig::Toggle(true) => NormalizedRuleConfig::new(RuleSeverity::Required),
        RuleConfig::Toggle(false) => NormalizedRuleConfig::new(RuleSeverity::Off),
        RuleConfig::Severity(severity) => NormalizedRuleConfig::new(*severity),
        RuleConfig::Tuple(severity, options) => NormalizedRuleConfig {
            severity: *severity,
            options: options.clone(),
        },
        RuleConfig::Full(normalized) => normalized.clone(),
    }
}

/// Map the deprecated ticket fields onto a rule config.
pub(crate) fn legacy_ticket_id_config(config: &BranchConfig) -> RuleConfig {
    let severity = match config.ticket_id_prompt.unwrap_or(TicketIdPromptMode::Optional) {
        TicketIdPromptMode::Skip => RuleSeverity::Off,
        TicketIdPromptMode::Optional => RuleSeverity::Optional,
        TicketIdPromptMode::Required => RuleSeverity::Required,
    };

    match config.ticket_id_prefix.as_deref().filter(|p| !p.is_empty()) {
        Some(prefix) => {
            let mut options = toml::Table::new();
            options.insert("prefix".into(), toml::Value::String(prefix.to_string()));
            RuleConfig::Tuple(severity, Some(toml::Value::Table(options)))
        }
        None => RuleConfig::Severity(severity),
    }
}

/// Effective ticket rule settings: `rules.ticketId` wins over the legacy fields.
pub fn get_ticket_id_rule(config: &BranchConfig) -> NormalizedRuleConfig {
    match config.rules.get("ticketId") {
        Some(explicit) => normalize_rule_config(explicit),
        None => normalize_rule_config(&legacy_ticket_id_config(config)),
    }
}
