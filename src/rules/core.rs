//! The built-in rule set.

use super::evaluate::resolve_rule_config;
use super::normalize::legacy_ticket_id_config;
use super::ticket::{extract_ticket_from_description, rebuild_description_with_ticket};
use super::{define_rule, RuleContext, RuleDefinition, RuleIssue, RuleManifest, RuleMeta, RuleRegistry};
use crate::config::{BranchConfig, RuleConfig, RuleSeverity};
use crate::style::{apply_description_style, is_description_style_valid};
use serde_json::Value;

const DOCS_URL: &str = "https://github.com/branchwright/branchwright";

fn check_structure(ctx: &RuleContext, _: Option<&Value>) -> Option<RuleIssue> {
    if ctx.segments().len() < 2 {
        return Some(RuleIssue::new(
            "Branch name must follow the format: type/description or type/ticket-id/description",
        ));
    }

    if ctx.branch_type_segment().is_none() {
        return Some(RuleIssue::new("Branch name must start with a valid branch type segment."));
    }

    None
}

fn check_branch_type(ctx: &RuleContext, _: Option<&Value>) -> Option<RuleIssue> {
    let branch_type = ctx.branch_type_segment()?;
    let valid = ctx.config().branch_type_names();

    if valid.contains(&branch_type) {
        return None;
    }

    Some(RuleIssue::new(format!(
        "Invalid branch type \"{}\". Valid types: {}",
        branch_type,
        valid.join(", ")
    )))
}

fn check_description_length(ctx: &RuleContext, _: Option<&Value>) -> Option<RuleIssue> {
    let description = ctx.description_segment()?;
    let limit = ctx.config().max_description_length;

    if description.chars().count() <= limit {
        return None;
    }

    Some(RuleIssue::new(format!(
        "Description \"{}\" exceeds maximum length of {} characters",
        description, limit
    )))
}

fn check_description_style(ctx: &RuleContext, _: Option<&Value>) -> Option<RuleIssue> {
    let description = ctx.description_segment()?;
    let config = ctx.config();

    let ticket_rule = resolve_rule_config(config, &ticket_id_rule());
    let ticket = extract_ticket_from_description(description, &ticket_rule);
    let body = ticket.as_ref().map_or(description, |info| info.rest.as_str());

    if body.is_empty() || is_description_style_valid(body, config.description_style) {
        return None;
    }

    let style = config.description_style;
    let corrected = rebuild_description_with_ticket(&apply_description_style(body, style), ticket.as_ref());

    Some(
        RuleIssue::new(format!(
            "Description \"{}\" does not match required style \"{}\".",
            description, style
        ))
        .with_suggestion(format!("Try \"{}\"", corrected)),
    )
}

fn check_ticket_id(ctx: &RuleContext, options: Option<&Value>) -> Option<RuleIssue> {
    let ticket = ctx.ticket_segment()?;
    let prefix = options?.get("prefix")?.as_str().filter(|p| !p.is_empty())?;

    if ticket.starts_with(prefix) {
        return None;
    }

    Some(RuleIssue::new(format!(
        "Ticket ID \"{}\" must start with \"{}\"",
        ticket, prefix
    )))
}

fn derive_ticket_id_config(config: &BranchConfig) -> Option<RuleConfig> {
    Some(legacy_ticket_id_config(config))
}

pub fn structure_rule() -> RuleDefinition {
    define_rule(
        RuleManifest::new(
            "structure",
            RuleMeta::new("Branch structure")
                .with_description("Branch names must include a type and description separated by a slash.")
                .with_docs_url(format!("{}#branch-structure", DOCS_URL)),
            RuleSeverity::Required,
        ),
        check_structure,
    )
}

pub fn branch_type_rule() -> RuleDefinition {
    define_rule(
        RuleManifest::new(
            "branchType",
            RuleMeta::new("Branch type")
                .with_description("Branch type must match one of the configured types.")
                .with_docs_url(format!("{}#branch-types", DOCS_URL)),
            RuleSeverity::Required,
        ),
        check_branch_type,
    )
}

pub fn description_length_rule() -> RuleDefinition {
    define_rule(
        RuleManifest::new(
            "descriptionLength",
            RuleMeta::new("Description length")
                .with_description("Descriptions should not exceed the configured maximum length."),
            RuleSeverity::Required,
        ),
        check_description_length,
    )
}

pub fn description_style_rule() -> RuleDefinition {
    define_rule(
        RuleManifest::new(
            "descriptionStyle",
            RuleMeta::new("Description style")
                .with_description("Descriptions must follow the configured casing style."),
            RuleSeverity::Required,
        ),
        check_description_style,
    )
}

/// Ticket prefix rule. Without an explicit `rules.ticketId` its config is
/// derived from the legacy `ticketIdPrompt` / `ticketIdPrefix` fields.
pub fn ticket_id_rule() -> RuleDefinition {
    define_rule(
        RuleManifest::new(
            "ticketId",
            RuleMeta::new("Ticket ID").with_description("Validates the presence and prefix of ticket identifiers."),
            RuleSeverity::Optional,
        )
        .with_derive_config(derive_ticket_id_config),
        check_ticket_id,
    )
}

/// The built-in rules in evaluation order.
pub fn core_rules() -> Vec<RuleDefinition> {
    vec![
        structure_rule(),
        branch_type_rule(),
        description_length_rule(),
        description_style_rule(),
        ticket_id_rule(),
    ]
}

/// A fresh registry holding only the built-in rules.
pub fn core_rule_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    for rule in core_rules() {
        if let Err(e) = registry.register(rule) {
            unreachable!("built-in rule ids are unique: {}", e);
        }
    }
    registry
}
