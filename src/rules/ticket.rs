use crate::config::{NormalizedRuleConfig, RuleSeverity};
use regex::Regex;

/// Where an embedded ticket ID sits inside a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPosition {
    Leading,
    Trailing,
}

/// A ticket ID found inside a description segment, plus the text around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketInfo {
    pub ticket: String,
    pub separator: String,
    /// The description body with ticket and separator removed.
    pub rest: String,
    pub position: TicketPosition,
}

/// The `prefix` option of a ticket rule config, if set and non-empty.
pub fn ticket_prefix(rule: &NormalizedRuleConfig) -> Option<&str> {
    rule.options
        .as_ref()
        .and_then(|options| options.get("prefix"))
        .and_then(|prefix| prefix.as_str())
        .filter(|prefix| !prefix.is_empty())
}

/// Regex source for a ticket ID: `<prefix>\d+`, or `[A-Z]+-\d+` without a prefix.
pub fn build_ticket_id_pattern(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!(r"{}\d+", regex::escape(prefix)),
        None => r"[A-Z]+-\d+".to_string(),
    }
}

/// Find a ticket ID at the start or end of `description`.
///
/// Returns `None` when the ticket rule is off or nothing matches, in which case
/// the whole description is plain body text.
pub fn extract_ticket_from_description(
    description: &str,
    ticket_rule: &NormalizedRuleConfig,
) -> Option<TicketInfo> {
    if ticket_rule.severity == RuleSeverity::Off {
        return None;
    }

    let ticket_pattern = build_ticket_id_pattern(ticket_prefix(ticket_rule));

    let leading = Regex::new(&format!(r"^({})([-_\s]+)?(.+)?$", ticket_pattern)).ok()?;
    if let Some(caps) = leading.captures(description) {
        return Some(TicketInfo {
            ticket: caps[1].to_string(),
            separator: caps.get(2).map_or("", |m| m.as_str()).to_string(),
            rest: caps.get(3).map_or("", |m| m.as_str()).to_string(),
            position: TicketPosition::Leading,
        });
    }

    let trailing = Regex::new(&format!(r"^(.+?)([-_\s]+)({})$", ticket_pattern)).ok()?;
    trailing.captures(description).map(|caps| TicketInfo {
        ticket: caps[3].to_string(),
        separator: caps[2].to_string(),
        rest: caps[1].to_string(),
        position: TicketPosition::Trailing,
    })
}

/// Put the ticket and its separator back on the side it was taken from.
pub fn rebuild_description_with_ticket(body: &str, ticket: Option<&TicketInfo>) -> String {
    let Some(info) = ticket else {
        return body.to_string();
    };

    if body.is_empty() {
        return info.ticket.clone();
    }

    match info.position {
        TicketPosition::Leading => format!("{}{}{}", info.ticket, info.separator, body),
        TicketPosition::Trailing => format!("{}{}{}", body, info.separator, info.ticket),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(severity: RuleSeverity, prefix: Option<&str>) -> NormalizedRuleConfig {
        match prefix {
            Some(prefix) => {
                let mut table = toml::Table::new();
                table.insert("prefix".into(), toml::Value::String(prefix.into()));
                NormalizedRuleConfig::with_options(severity, toml::Value::Table(table))
            }
            None => NormalizedRuleConfig::new(severity),
        }
    }

    #[test]
    fn leading_ticket_with_separator() {
        let info = extract_ticket_from_description("PROJ-123-add-login", &rule(RuleSeverity::Optional, None)).unwrap();
        assert_eq!(info.ticket, "PROJ-123");
        assert_eq!(info.separator, "-");
        assert_eq!(info.rest, "add-login");
        assert_eq!(info.position, TicketPosition::Leading);
    }

    #[test]
    fn trailing_ticket() {
        let info = extract_ticket_from_description("Add_Login_PROJ-7", &rule(RuleSeverity::Optional, None)).unwrap();
        assert_eq!(info.ticket, "PROJ-7");
        assert_eq!(info.separator, "_");
        assert_eq!(info.rest, "Add_Login");
        assert_eq!(info.position, TicketPosition::Trailing);
    }

    #[test]
    fn ticket_alone() {
        let info = extract_ticket_from_description("ABC-1", &rule(RuleSeverity::Required, None)).unwrap();
        assert_eq!(info.ticket, "ABC-1");
        assert_eq!(info.rest, "");
        assert_eq!(rebuild_description_with_ticket("", Some(&info)), "ABC-1");
    }

    #[test]
    fn prefix_restricts_matches() {
        let strict = rule(RuleSeverity::Optional, Some("NPXR-"));
        assert!(extract_ticket_from_description("PROJ-12-thing", &strict).is_none());
        let info = extract_ticket_from_description("NPXR-12 thing", &strict).unwrap();
        assert_eq!(info.ticket, "NPXR-12");
        assert_eq!(info.separator, " ");
    }

    #[test]
    fn prefix_is_escaped() {
        let dotted = rule(RuleSeverity::Optional, Some("A.B-"));
        assert!(extract_ticket_from_description("AXB-1-x", &dotted).is_none());
        assert!(extract_ticket_from_description("A.B-1-x", &dotted).is_some());
    }

    #[test]
    fn off_rule_never_extracts() {
        assert!(extract_ticket_from_description("PROJ-1-x", &rule(RuleSeverity::Off, None)).is_none());
    }

    #[test]
    fn plain_descriptions_have_no_ticket() {
        assert!(extract_ticket_from_description("add-login", &rule(RuleSeverity::Optional, None)).is_none());
    }

    #[test]
    fn rebuild_keeps_position() {
        let leading = extract_ticket_from_description("PROJ-1_Fix_It", &rule(RuleSeverity::Optional, None)).unwrap();
        assert_eq!(rebuild_description_with_ticket("fix-it", Some(&leading)), "PROJ-1_fix-it");

        let trailing = extract_ticket_from_description("Fix It PROJ-1", &rule(RuleSeverity::Optional, None)).unwrap();
        assert_eq!(rebuild_description_with_ticket("fix-it", Some(&trailing)), "fix-it PROJ-1");

        assert_eq!(rebuild_description_with_ticket("fix-it", None), "fix-it");
    }
}
