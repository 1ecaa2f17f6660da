//! Building branch names from parts, and cleaning up user-typed descriptions.

use crate::config::BranchConfig;
use crate::rules::core::ticket_id_rule;
use crate::rules::resolve_rule_config;
use crate::rules::ticket::{extract_ticket_from_description, rebuild_description_with_ticket};
use crate::style::apply_description_style;
use regex::Regex;
use std::sync::OnceLock;

/// Values substituted into a name template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatePlaceholders<'a> {
    pub branch_type: &'a str,
    pub ticket: Option<&'a str>,
    pub desc: &'a str,
}

/// Join the parts of a branch name.
///
/// With a template, placeholders are substituted; without one the name is
/// `type/description` or `type/ticket/description`.
pub fn build_branch_name(
    branch_type: &str,
    description: &str,
    ticket_id: Option<&str>,
    template: Option<&str>,
) -> String {
    let ticket_id = ticket_id.filter(|t| !t.is_empty());

    let Some(template) = template.filter(|t| !t.is_empty()) else {
        let mut parts = vec![branch_type];
        parts.extend(ticket_id);
        parts.push(description);
        return parts.join("/");
    };

    build_branch_name_from_template(
        template,
        &TemplatePlaceholders {
            branch_type,
            ticket: ticket_id,
            desc: description,
        },
    )
}

/// Substitute `{{type}}`, `{{ticket}}` and `{{desc}}`, then tidy up what empty
/// placeholders leave behind: repeated slashes, slashes at either end, and
/// hyphens stranded next to a slash.
pub fn build_branch_name_from_template(template: &str, placeholders: &TemplatePlaceholders<'_>) -> String {
    static SLASHES: OnceLock<Regex> = OnceLock::new();
    static EDGE_SLASH: OnceLock<Regex> = OnceLock::new();

    let result = template
        .replace("{{type}}", placeholders.branch_type)
        .replace("{{ticket}}", placeholders.ticket.unwrap_or(""))
        .replace("{{desc}}", placeholders.desc);

    let slashes = SLASHES.get_or_init(|| Regex::new("/+").expect("valid regex"));
    let edge_slash = EDGE_SLASH.get_or_init(|| Regex::new("^/|/$").expect("valid regex"));

    let result = slashes.replace_all(&result, "/");
    let result = edge_slash.replace_all(&result, "");
    result.replace("/-", "/").replace("-/", "/")
}

/// A description as typed by a user, after style correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDescription {
    /// Styled description, with any embedded ticket kept where it was typed.
    pub description: String,
    pub has_ticket: bool,
    /// Set when the input cannot be used; callers re-prompt or abort.
    pub ticket_error: Option<String>,
}

/// Split off an embedded ticket, apply the configured style to the rest and
/// check the length limit.
///
/// Problems come back in `ticket_error` rather than as an `Err`, so an
/// interactive caller can simply ask again.
pub fn parse_user_description(input: &str, config: &BranchConfig) -> ParsedDescription {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ParsedDescription {
            description: String::new(),
            has_ticket: false,
            ticket_error: Some("Description cannot be empty.".to_string()),
        };
    }

    let ticket_rule = resolve_rule_config(config, &ticket_id_rule());
    let ticket = extract_ticket_from_description(trimmed, &ticket_rule);
    let has_ticket = ticket.is_some();
    let body = ticket.as_ref().map_or(trimmed, |info| info.rest.as_str());

    if body.trim().is_empty() {
        return ParsedDescription {
            description: rebuild_description_with_ticket("", ticket.as_ref()),
            has_ticket,
            ticket_error: Some("Description cannot be empty.".to_string()),
        };
    }

    let styled = apply_description_style(body, config.description_style);
    let ticket_error = (styled.chars().count() > config.max_description_length).then(|| {
        format!(
            "Description exceeds maximum length of {} characters.",
            config.max_description_length
        )
    });

    ParsedDescription {
        description: rebuild_description_with_ticket(&styled, ticket.as_ref()),
        has_ticket,
        ticket_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuleConfig, RuleSeverity, TicketIdPromptMode};
    use crate::style::DescriptionStyle;

    fn placeholders<'a>(branch_type: &'a str, ticket: Option<&'a str>, desc: &'a str) -> TemplatePlaceholders<'a> {
        TemplatePlaceholders { branch_type, ticket, desc }
    }

    #[test]
    fn template_replaces_basic_placeholders() {
        let name = build_branch_name_from_template("{{type}}/{{desc}}", &placeholders("feature", None, "add-user-auth"));
        assert_eq!(name, "feature/add-user-auth");
    }

    #[test]
    fn template_replaces_ticket() {
        let name = build_branch_name_from_template(
            "{{type}}/{{ticket}}-{{desc}}",
            &placeholders("bugfix", Some("JIRA-123"), "fix-login-bug"),
        );
        assert_eq!(name, "bugfix/JIRA-123-fix-login-bug");
    }

    #[test]
    fn missing_ticket_leaves_no_orphan_hyphen() {
        let name = build_branch_name_from_template(
            "{{type}}/{{ticket}}-{{desc}}",
            &placeholders("feature", None, "new-feature"),
        );
        assert_eq!(name, "feature/new-feature");
    }

    #[test]
    fn missing_ticket_leaves_no_empty_segment() {
        let name = build_branch_name_from_template(
            "{{type}}/{{ticket}}/{{desc}}",
            &placeholders("chore", None, "update-deps"),
        );
        assert_eq!(name, "chore/update-deps");
    }

    #[test]
    fn literal_text_in_template_survives() {
        let name = build_branch_name_from_template(
            "{{type}}/{{ticket}}-{{desc}}-v2",
            &placeholders("feature", Some("ABC-456"), "user-dashboard"),
        );
        assert_eq!(name, "feature/ABC-456-user-dashboard-v2");
    }

    #[test]
    fn build_uses_template_when_given() {
        let name = build_branch_name(
            "feature",
            "add-authentication",
            Some("PROJ-789"),
            Some("{{type}}/{{ticket}}-{{desc}}"),
        );
        assert_eq!(name, "feature/PROJ-789-add-authentication");
        assert_eq!(
            build_branch_name("chore", "update-dependencies", None, Some("{{type}}/{{desc}}")),
            "chore/update-dependencies"
        );
    }

    #[test]
    fn build_without_template_joins_with_slashes() {
        assert_eq!(
            build_branch_name("bugfix", "fix-critical-bug", Some("BUG-001"), None),
            "bugfix/BUG-001/fix-critical-bug"
        );
        assert_eq!(build_branch_name("feat", "x", Some(""), None), "feat/x");
    }

    fn config() -> BranchConfig {
        BranchConfig {
            max_description_length: 20,
            ticket_id_prompt: Some(TicketIdPromptMode::Optional),
            ..Default::default()
        }
    }

    #[test]
    fn description_is_styled() {
        let parsed = parse_user_description("  Add User Login ", &config());
        assert_eq!(parsed.description, "add-user-login");
        assert!(!parsed.has_ticket);
        assert_eq!(parsed.ticket_error, None);

        let mut snake = config();
        snake.description_style = DescriptionStyle::SnakeCase;
        assert_eq!(parse_user_description("addUserLogin", &snake).description, "add_user_login");
    }

    #[test]
    fn embedded_ticket_keeps_its_position() {
        let parsed = parse_user_description("PROJ-42 Add Login", &config());
        assert!(parsed.has_ticket);
        assert_eq!(parsed.description, "PROJ-42 add-login");

        let parsed = parse_user_description("Add Login_PROJ-42", &config());
        assert_eq!(parsed.description, "add-login_PROJ-42");
    }

    #[test]
    fn ticket_alone_is_an_empty_description() {
        let parsed = parse_user_description("PROJ-42", &config());
        assert!(parsed.has_ticket);
        assert_eq!(parsed.description, "PROJ-42");
        assert_eq!(parsed.ticket_error.as_deref(), Some("Description cannot be empty."));
    }

    #[test]
    fn blank_input_is_rejected() {
        let parsed = parse_user_description("   ", &config());
        assert_eq!(parsed.description, "");
        assert_eq!(parsed.ticket_error.as_deref(), Some("Description cannot be empty."));
    }

    #[test]
    fn length_is_checked_after_styling() {
        let parsed = parse_user_description("a very long description indeed", &config());
        assert_eq!(parsed.description, "a-very-long-description-indeed");
        assert_eq!(
            parsed.ticket_error.as_deref(),
            Some("Description exceeds maximum length of 20 characters.")
        );
    }

    #[test]
    fn ticket_detection_follows_the_ticket_rule() {
        let mut config = config();
        config.rules.insert("ticketId".into(), RuleConfig::Severity(RuleSeverity::Off));
        let parsed = parse_user_description("PROJ-42 fix", &config);
        assert!(!parsed.has_ticket);
        assert_eq!(parsed.description, "proj-42-fix");
    }
}
