use crate::config::BranchConfig;
use crate::rules::core::core_rule_registry;
use crate::rules::{evaluate_rules, RuleError, RuleExecution, RuleRegistry};
use serde::Serialize;
use tracing::debug;

/// Outcome of linting one branch name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResult {
    pub is_valid: bool,
    /// Violation messages, in rule order.
    pub errors: Vec<String>,
    pub violations: Vec<RuleExecution>,
}

/// Lint `branch_name`.
///
/// Ignored branches pass without running any rule. Without a registry the
/// built-in rules are used.
pub fn lint_branch_name(
    branch_name: &str,
    config: &BranchConfig,
    registry: Option<&RuleRegistry>,
) -> Result<LintResult, RuleError> {
    if config.is_ignored(branch_name) {
        debug!(branch = branch_name, "branch is ignored");
        return Ok(LintResult {
            is_valid: true,
            ..Default::default()
        });
    }

    let violations = match registry {
        Some(registry) => evaluate_rules(branch_name, config, registry)?,
        None => evaluate_rules(branch_name, config, &core_rule_registry())?,
    };
    let errors = violations.iter().map(|v| v.message.clone()).collect();

    Ok(LintResult {
        is_valid: violations.is_empty(),
        errors,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BranchIgnorePattern, BranchTypeOption, RuleSeverity};
    use crate::rules::{create_registry, define_rule, RuleIssue, RuleManifest, RuleMeta};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn config() -> BranchConfig {
        BranchConfig {
            branch_types: vec![
                BranchTypeOption::new("feat", "Feature"),
                BranchTypeOption::new("fix", "Fix"),
                BranchTypeOption::new("chore", "Chore"),
            ],
            max_description_length: 30,
            ..Default::default()
        }
    }

    #[test]
    fn well_formed_names_pass() {
        for name in ["feat/new-feature", "fix/bug-fix", "chore/update-deps"] {
            let result = lint_branch_name(name, &config(), None).unwrap();
            assert!(result.is_valid, "{} should be valid: {:?}", name, result.errors);
            assert!(result.errors.is_empty());
        }
    }

    #[test]
    fn errors_mirror_violation_messages() {
        let result = lint_branch_name("invalid-branch", &config(), None).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), result.violations.len());
        assert_eq!(result.errors[0], result.violations[0].message);
    }

    #[test]
    fn ignored_branches_skip_every_rule() {
        let called = Arc::new(AtomicBool::new(false));
        let seen = called.clone();
        let rule = define_rule(
            RuleManifest::new("spy", RuleMeta::new("spy"), RuleSeverity::Required),
            move |_, _| {
                seen.store(true, Ordering::SeqCst);
                Some(RuleIssue::new("always fails"))
            },
        );
        let registry = create_registry([rule]).unwrap();

        for name in ["main", "master", "develop", "release/1.2.0"] {
            let result = lint_branch_name(name, &config(), Some(&registry)).unwrap();
            assert!(result.is_valid);
            assert!(result.violations.is_empty());
        }
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn regex_ignore_patterns_apply() {
        let mut config = config();
        config.ignored_branches = vec![BranchIgnorePattern::regex("^dependabot/").unwrap()];
        assert!(lint_branch_name("dependabot/npm/lodash-4", &config, None).unwrap().is_valid);
        assert!(!lint_branch_name("main", &config, None).unwrap().is_valid);
    }

    #[test]
    fn optional_violations_still_fail_the_lint() {
        let rule = define_rule(
            RuleManifest::new("hint", RuleMeta::new("hint"), RuleSeverity::Optional),
            |_, _| Some(RuleIssue::new("consider something")),
        );
        let registry = create_registry([rule]).unwrap();
        let result = lint_branch_name("feat/x", &config(), Some(&registry)).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.violations[0].severity, RuleSeverity::Optional);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = lint_branch_name("feat/ok", &config(), None).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isValid"], serde_json::Value::Bool(true));
    }
}
