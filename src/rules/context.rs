use crate::config::BranchConfig;
use std::sync::Arc;

/// Raw parts used to build a [`RuleContext`].
#[derive(Debug, Clone)]
pub struct RuleContextInput<'a> {
    pub branch_name: &'a str,
    pub segments: Vec<String>,
    pub branch_type_segment: Option<String>,
    pub ticket_segment: Option<String>,
    pub description_segment: Option<String>,
    pub config: &'a BranchConfig,
}

impl<'a> RuleContextInput<'a> {
    /// Split `branch_name` on `/` and pick out the type, ticket and description segments.
    ///
    /// A ticket segment is only recognised for exactly three segments
    /// (`type/ticket/description`); the description is the last segment whenever
    /// there are at least two.
    pub fn parse(branch_name: &'a str, config: &'a BranchConfig) -> Self {
        let segments: Vec<String> = branch_name.split('/').map(str::to_string).collect();

        let branch_type_segment = segments.first().cloned();
        let ticket_segment = if segments.len() == 3 {
            Some(segments[1].clone())
        } else {
            None
        };
        let description_segment = if segments.len() >= 2 {
            segments.last().cloned()
        } else {
            None
        };

        Self {
            branch_name,
            segments,
            branch_type_segment,
            ticket_segment,
            description_segment,
            config,
        }
    }
}

/// Read-only view of one branch name handed to every rule in an evaluation pass.
///
/// The context owns its own copy of the configuration, so nothing a rule sees can
/// change underneath a sibling rule or leak back into the caller's config.
#[derive(Debug, Clone)]
pub struct RuleContext {
    branch_name: String,
    segments: Vec<String>,
    branch_type_segment: Option<String>,
    ticket_segment: Option<String>,
    description_segment: Option<String>,
    config: Arc<BranchConfig>,
}

impl RuleContext {
    pub fn branch_name(&self) -> &str {
        &self.branch_name
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn branch_type_segment(&self) -> Option<&str> {
        self.branch_type_segment.as_deref()
    }

    pub fn ticket_segment(&self) -> Option<&str> {
        self.ticket_segment.as_deref()
    }

    pub fn description_segment(&self) -> Option<&str> {
        self.description_segment.as_deref()
    }

    pub fn config(&self) -> &BranchConfig {
        &self.config
    }
}

fn non_empty(segment: Option<String>) -> Option<String> {
    segment.filter(|s| !s.is_empty())
}

/// Freeze `input` into a context. Empty segments are treated as absent.
pub fn create_rule_context(input: RuleContextInput<'_>) -> RuleContext {
    RuleContext {
        branch_name: input.branch_name.to_string(),
        segments: input.segments,
        branch_type_segment: non_empty(input.branch_type_segment),
        ticket_segment: non_empty(input.ticket_segment),
        description_segment: non_empty(input.description_segment),
        config: Arc::new(input.config.clone()),
    }
}
