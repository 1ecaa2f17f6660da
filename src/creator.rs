//! Non-interactive branch creation: name the branch, check it, then hand it to git.

use crate::config::{BranchConfig, RuleSeverity};
use crate::error::Result as BranchwrightResult;
use crate::git::{GitBackend, GitError};
use crate::lint::lint_branch_name;
use crate::naming::{build_branch_name, parse_user_description};
use crate::rules::core::ticket_id_rule;
use crate::rules::resolve_rule_config;
use crate::rules::ticket::ticket_prefix;
use crate::rules::{RuleError, RuleRegistry};
use crate::validator::BranchValidator;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("Not in a git repository")]
    NotARepo,
    #[error("No branch types configured. Please update branchwright config.")]
    NoBranchTypes,
    #[error("Invalid branch type \"{name}\". Available types: {available}")]
    InvalidType { name: String, available: String },
    #[error("Ticket ID must start with \"{0}\"")]
    TicketPrefix(String),
    #[error("Ticket ID is required.")]
    TicketRequired,
    #[error("{0}")]
    Description(String),
    #[error("Generated branch name \"{name}\" is invalid: {message}")]
    InvalidName { name: String, message: String },
    #[error("Branch \"{0}\" already exists")]
    AlreadyExists(String),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Git(#[from] GitError),
}

/// What the caller wants created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub branch_type: String,
    pub description: String,
    pub ticket: Option<String>,
    /// Defaults to the current branch.
    pub base_branch: Option<String>,
    pub checkout: bool,
    pub push: bool,
    pub dry_run: bool,
}

impl CreateRequest {
    pub fn new(branch_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            branch_type: branch_type.into(),
            description: description.into(),
            ticket: None,
            base_branch: None,
            checkout: true,
            push: false,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = Some(ticket.into());
        self
    }

    #[must_use]
    pub fn with_base_branch(mut self, base: impl Into<String>) -> Self {
        self.base_branch = Some(base.into());
        self
    }
}

/// The resolved branch name and what will be done with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPlan {
    pub name: String,
    pub base_branch: String,
    pub checkout: bool,
    /// Remote to push to; `None` when no push was asked for or no remote exists.
    pub push_remote: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub plan: BranchPlan,
    pub dry_run: bool,
    pub pushed: bool,
    /// A failed push does not undo the branch; the reason ends up here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_error: Option<String>,
}

pub struct BranchCreator<G: GitBackend> {
    config: BranchConfig,
    /// Rules generated names are checked against; the core rules when unset.
    registry: Option<RuleRegistry>,
    git: G,
}

impl<G: GitBackend> BranchCreator<G> {
    pub fn new(config: BranchConfig, git: G) -> Self {
        Self {
            config,
            registry: None,
            git,
        }
    }

    /// A creator that checks names with everything `validator` resolved,
    /// so a created branch passes `validator.validate`.
    pub fn from_validator(validator: &BranchValidator, git: G) -> BranchwrightResult<Self> {
        let registry = validator.rule_registry()?;
        Ok(Self::new(validator.get_config(), git).with_registry(registry))
    }

    #[must_use]
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &BranchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: BranchConfig) {
        self.config = config;
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    /// Build the branch name for `request` without touching the repository.
    pub fn branch_name(&self, request: &CreateRequest) -> Result<String, CreateError> {
        let config = &self.config;
        if config.branch_types.is_empty() {
            return Err(CreateError::NoBranchTypes);
        }

        let branch_type = config.find_branch_type(&request.branch_type).ok_or_else(|| {
            CreateError::InvalidType {
                name: request.branch_type.clone(),
                available: config.branch_type_names().join(", "),
            }
        })?;

        let ticket_rule = resolve_rule_config(config, &ticket_id_rule());
        let ticket = request
            .ticket
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && ticket_rule.severity != RuleSeverity::Off);
        if let (Some(ticket), Some(prefix)) = (ticket, ticket_prefix(&ticket_rule)) {
            if !ticket.starts_with(prefix) {
                return Err(CreateError::TicketPrefix(prefix.to_string()));
            }
        }

        let parsed = parse_user_description(&request.description, config);
        if let Some(error) = parsed.ticket_error {
            return Err(CreateError::Description(error));
        }
        if ticket_rule.severity == RuleSeverity::Required && ticket.is_none() && !parsed.has_ticket {
            return Err(CreateError::TicketRequired);
        }

        let name = build_branch_name(&branch_type.name, &parsed.description, ticket, config.template.as_deref());

        let lint = lint_branch_name(&name, config, self.registry.as_ref())?;
        let blocking: Vec<&str> = lint
            .violations
            .iter()
            .filter(|v| v.severity == RuleSeverity::Required)
            .map(|v| v.message.as_str())
            .collect();
        if !blocking.is_empty() {
            return Err(CreateError::InvalidName {
                name,
                message: blocking.join("; "),
            });
        }
        for violation in lint.violations {
            warn!(rule = %violation.rule_id, "{}", violation.message);
        }

        Ok(name)
    }

    /// Resolve everything `create` would do, failing on the same conditions.
    pub fn plan(&self, request: &CreateRequest) -> Result<BranchPlan, CreateError> {
        if !self.git.is_repo() {
            return Err(CreateError::NotARepo);
        }

        let name = self.branch_name(request)?;
        let base_branch = match request.base_branch.as_deref().filter(|b| !b.is_empty()) {
            Some(base) => base.to_string(),
            None => self.git.current_branch()?,
        };

        if self.git.local_branches()?.contains(&name) {
            return Err(CreateError::AlreadyExists(name));
        }

        let push_remote = if request.push {
            self.git.remotes()?.into_iter().next()
        } else {
            None
        };

        Ok(BranchPlan {
            name,
            base_branch,
            checkout: request.checkout,
            push_remote,
        })
    }

    /// Create the branch from its base, then optionally push it.
    ///
    /// Dry runs stop after planning. Push failures are reported, not returned.
    pub fn create(&self, request: &CreateRequest) -> Result<CreateReport, CreateError> {
        let plan = self.plan(request)?;
        let mut report = CreateReport {
            plan,
            dry_run: request.dry_run,
            pushed: false,
            push_error: None,
        };
        if request.dry_run {
            return Ok(report);
        }

        let plan = &report.plan;
        self.git.checkout(&plan.base_branch)?;
        self.git.create_branch(&plan.name, plan.checkout)?;
        info!(branch = %plan.name, base = %plan.base_branch, checkout = plan.checkout, "created branch");

        if request.push {
            match plan.push_remote.as_deref() {
                None => warn!("No remote repositories configured, skipping push"),
                Some(remote) => match self.git.push(remote, &plan.name) {
                    Ok(()) => {
                        info!(remote, branch = %plan.name, "pushed branch");
                        report.pushed = true;
                    }
                    Err(e) => {
                        warn!("Failed to push branch: {}", e);
                        report.push_error = Some(e.to_string());
                    }
                },
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuleConfig, TicketIdPromptMode};
    use crate::git::{GitCall, MockGit};
    use crate::validator::BranchValidatorOptions;
    use std::fs;

    fn creator(git: MockGit) -> BranchCreator<MockGit> {
        BranchCreator::new(BranchConfig::default(), git)
    }

    fn with_prefix(prompt: TicketIdPromptMode, prefix: &str) -> BranchConfig {
        BranchConfig {
            ticket_id_prompt: Some(prompt),
            ticket_id_prefix: Some(prefix.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn names_follow_the_template() {
        let creator = creator(MockGit::new());
        let name = creator.branch_name(&CreateRequest::new("feat", "Add User Login")).unwrap();
        assert_eq!(name, "feat/add-user-login");
    }

    #[test]
    fn unknown_type_lists_available_types() {
        let err = creator(MockGit::new())
            .branch_name(&CreateRequest::new("feature", "x"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid branch type \"feature\". Available types: feat, fix, chore");
    }

    #[test]
    fn ticket_must_carry_the_prefix() {
        let creator = BranchCreator::new(with_prefix(TicketIdPromptMode::Optional, "PROJ-"), MockGit::new());
        let err = creator
            .branch_name(&CreateRequest::new("fix", "login").with_ticket("ABC-1"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Ticket ID must start with \"PROJ-\"");
    }

    #[test]
    fn ticket_lands_in_its_own_segment_without_template() {
        let mut config = with_prefix(TicketIdPromptMode::Optional, "PROJ-");
        config.template = None;
        let creator = BranchCreator::new(config, MockGit::new());
        let name = creator
            .branch_name(&CreateRequest::new("fix", "login bug").with_ticket("PROJ-7"))
            .unwrap();
        assert_eq!(name, "fix/PROJ-7/login-bug");
    }

    #[test]
    fn required_ticket_may_come_from_the_description() {
        let creator = BranchCreator::new(with_prefix(TicketIdPromptMode::Required, "PROJ-"), MockGit::new());
        let err = creator.branch_name(&CreateRequest::new("feat", "login")).unwrap_err();
        assert!(matches!(err, CreateError::TicketRequired));

        let name = creator.branch_name(&CreateRequest::new("feat", "PROJ-9-login")).unwrap();
        assert_eq!(name, "feat/PROJ-9-login");
    }

    #[test]
    fn ticket_flag_is_ignored_when_the_rule_is_off() {
        let mut config = BranchConfig::default();
        config.rules.insert("ticketId".into(), RuleConfig::Toggle(false));
        config.template = None;
        let creator = BranchCreator::new(config, MockGit::new());
        let name = creator
            .branch_name(&CreateRequest::new("chore", "deps").with_ticket("X-1"))
            .unwrap();
        assert_eq!(name, "chore/deps");
    }

    #[test]
    fn names_are_checked_against_plugin_rules() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("no-wip.toml"),
            r#"
            [[rules]]
            id = "no-wip"
            type = "banned-pattern"
            pattern = "wip"
            message = "Branch names must not include \"wip\"."
            "#,
        )
        .unwrap();
        fs::write(dir.path().join("branchwright.toml"), "plugins = [\"./no-wip.toml\"]\n").unwrap();

        let mut validator = BranchValidator::new(
            BranchConfig::default(),
            BranchValidatorOptions {
                cwd: Some(dir.path().to_path_buf()),
                config_path: None,
            },
        );
        validator.load_config_from_file();
        let creator = BranchCreator::from_validator(&validator, MockGit::new()).unwrap();

        let err = creator.branch_name(&CreateRequest::new("feat", "wip login")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Generated branch name \"feat/wip-login\" is invalid: Branch names must not include \"wip\"."
        );
        assert!(!validator.validate("feat/wip-login").unwrap().valid);

        let name = creator.branch_name(&CreateRequest::new("feat", "add login")).unwrap();
        assert!(validator.validate(&name).unwrap().valid);
    }

    #[test]
    fn description_errors_surface() {
        let err = creator(MockGit::new())
            .branch_name(&CreateRequest::new("feat", "this description is far too long"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Description exceeds maximum length of 24 characters.");
    }

    #[test]
    fn existing_branches_are_refused() {
        let git = MockGit::new().with_branches(&["main", "feat/login"]);
        let err = creator(git).create(&CreateRequest::new("feat", "login")).unwrap_err();
        assert_eq!(err.to_string(), "Branch \"feat/login\" already exists");
    }

    #[test]
    fn outside_a_repo_nothing_happens() {
        let err = creator(MockGit::new().not_a_repo())
            .create(&CreateRequest::new("feat", "login"))
            .unwrap_err();
        assert!(matches!(err, CreateError::NotARepo));
    }

    #[test]
    fn dry_run_plans_without_touching_git() {
        let creator = creator(MockGit::new().with_current_branch("develop"));
        let mut request = CreateRequest::new("feat", "login");
        request.dry_run = true;
        request.push = true;

        let report = creator.create(&request).unwrap();
        assert!(report.dry_run);
        assert_eq!(report.plan.base_branch, "develop");
        assert_eq!(report.plan.push_remote.as_deref(), Some("origin"));
        assert!(creator.git().calls().is_empty());
    }

    #[test]
    fn creates_from_base_then_pushes() {
        let creator = creator(MockGit::new().with_remotes(&["upstream", "origin"]));
        let mut request = CreateRequest::new("fix", "crash").with_base_branch("main");
        request.push = true;
        request.checkout = false;

        let report = creator.create(&request).unwrap();
        assert!(report.pushed);
        assert_eq!(
            creator.git().calls(),
            vec![
                GitCall::Checkout("main".into()),
                GitCall::CreateBranch {
                    name: "fix/crash".into(),
                    checkout: false
                },
                GitCall::Push {
                    remote: "upstream".into(),
                    branch: "fix/crash".into()
                },
            ]
        );
    }

    #[test]
    fn push_failures_do_not_fail_creation() {
        let creator = creator(MockGit::new().with_push_error("auth failed"));
        let mut request = CreateRequest::new("feat", "login");
        request.push = true;

        let report = creator.create(&request).unwrap();
        assert!(!report.pushed);
        assert_eq!(report.push_error.as_deref(), Some("git command failed: auth failed"));
    }

    #[test]
    fn push_without_remotes_is_skipped() {
        let creator = creator(MockGit::new().with_remotes(&[]));
        let mut request = CreateRequest::new("feat", "login");
        request.push = true;

        let report = creator.create(&request).unwrap();
        assert!(!report.pushed);
        assert_eq!(report.push_error, None);
        assert_eq!(creator.git().calls().len(), 2);
    }
}
