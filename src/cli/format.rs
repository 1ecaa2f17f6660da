use crate::config::{BranchConfig, RuleSeverity};
use crate::creator::CreateReport;
use crate::validator::ValidationResult;
use serde_json::json;
use std::path::Path;

/// One linted branch and its result.
#[derive(Debug, Clone)]
pub struct BranchReport {
    pub branch: String,
    pub result: ValidationResult,
}

fn severity_label(severity: RuleSeverity) -> &'static str {
    match severity {
        RuleSeverity::Required => "\x1b[31merror\x1b[0m",
        RuleSeverity::Optional => "\x1b[33mwarn \x1b[0m",
        RuleSeverity::Off => "\x1b[90moff  \x1b[0m",
    }
}

/// Print lint results per branch with ANSI colors.
pub fn print_pretty(reports: &[BranchReport]) {
    for report in reports {
        if report.result.valid {
            println!("\x1b[32m✓\x1b[0m {}", report.branch);
            continue;
        }

        println!("\x1b[31m✗\x1b[0m \x1b[4m{}\x1b[0m", report.branch);
        for v in &report.result.violations {
            println!(
                "  {} \x1b[90m{:<20}\x1b[0m {}",
                severity_label(v.severity),
                v.rule_id,
                v.message
            );
        }

        if let Some(ref suggestions) = report.result.suggestions {
            println!("  \x1b[33mSuggestions:\x1b[0m");
            for suggestion in suggestions {
                println!("    \x1b[90m└─\x1b[0m \x1b[36m{}\x1b[0m", suggestion);
            }
        }
    }

    let invalid = reports.iter().filter(|r| !r.result.valid).count();
    println!();
    if invalid == 0 {
        println!(
            "\x1b[1m\x1b[32m✓ All {} branch name{} valid\x1b[0m",
            reports.len(),
            if reports.len() == 1 { " is" } else { "s are" }
        );
    } else {
        println!(
            "\x1b[1m\x1b[31m{} of {} branch name{} invalid\x1b[0m",
            invalid,
            reports.len(),
            if reports.len() == 1 { " is" } else { "s are" }
        );
    }
}

/// Print lint results as structured JSON.
pub fn print_json(reports: &[BranchReport]) {
    println!("{:#}", lint_json(reports));
}

fn lint_json(reports: &[BranchReport]) -> serde_json::Value {
    let branches: Vec<_> = reports
        .iter()
        .map(|r| {
            json!({
                "branch": r.branch,
                "valid": r.result.valid,
                "message": r.result.message,
                "suggestions": r.result.suggestions,
                "violations": r.result.violations,
            })
        })
        .collect();

    json!({
        "branches": branches,
        "summary": {
            "total": reports.len(),
            "valid": reports.iter().filter(|r| r.result.valid).count(),
            "invalid": reports.iter().filter(|r| !r.result.valid).count(),
        },
    })
}

pub fn print_create_report(report: &CreateReport) {
    let plan = &report.plan;
    if report.dry_run {
        println!("\x1b[34m[DRY RUN] Would create branch: {} from {}\x1b[0m", plan.name, plan.base_branch);
        if plan.checkout {
            println!("\x1b[34m[DRY RUN] Would checkout to: {}\x1b[0m", plan.name);
        }
        if let Some(ref remote) = plan.push_remote {
            println!("\x1b[34m[DRY RUN] Would push to: {}/{}\x1b[0m", remote, plan.name);
        }
        return;
    }

    if plan.checkout {
        println!("\x1b[32m✓\x1b[0m Created and switched to branch: {}", plan.name);
    } else {
        println!("\x1b[32m✓\x1b[0m Created branch: {}", plan.name);
    }

    match (&plan.push_remote, report.pushed) {
        (Some(remote), true) => println!("\x1b[32m✓\x1b[0m Pushed branch to {}/{}", remote, plan.name),
        (Some(_), false) => println!(
            "\x1b[31m✗\x1b[0m Failed to push branch: {}",
            report.push_error.as_deref().unwrap_or("unknown error")
        ),
        (None, _) => {}
    }
}

pub fn print_config(config: &BranchConfig, filepath: Option<&Path>) {
    match filepath {
        Some(path) => println!("\x1b[34mLoaded configuration ({}):\x1b[0m", path.display()),
        None => println!("\x1b[34mUsing default configuration:\x1b[0m"),
    }
    match serde_json::to_value(config) {
        Ok(value) => println!("{:#}", value),
        Err(e) => eprintln!("\x1b[31merror\x1b[0m: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{BranchValidator, BranchValidatorOptions};

    #[test]
    fn json_summary_counts_branches() {
        let validator = BranchValidator::new(BranchConfig::default(), BranchValidatorOptions::default());
        let reports: Vec<_> = ["feat/ok", "nope", "main"]
            .iter()
            .map(|b| BranchReport {
                branch: b.to_string(),
                result: validator.validate(b).unwrap(),
            })
            .collect();

        let value = lint_json(&reports);
        assert_eq!(value["summary"]["total"], 3);
        assert_eq!(value["summary"]["invalid"], 1);
        assert_eq!(value["branches"][1]["violations"][0]["ruleId"], "structure");
        assert_eq!(value["branches"][1]["violations"][0]["severity"], "required");
    }
}
