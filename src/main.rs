use branchwright::cli::format::{self, BranchReport};
use branchwright::cli::toml_config::{self, CONFIG_FILE_NAMES, INIT_TEMPLATE};
use branchwright::cli::{Cli, Commands, OutputFormat};
use branchwright::creator::{BranchCreator, CreateRequest};
use branchwright::error::Result;
use branchwright::git::{CommandGit, GitBackend};
use branchwright::validator::{BranchValidator, BranchValidatorOptions};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("branchwright=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match run(cli.command, &cwd) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("\x1b[31merror\x1b[0m: {}", e);
            process::exit(2);
        }
    }
}

fn run(command: Commands, cwd: &Path) -> Result<i32> {
    match command {
        Commands::Lint { names, all, format: output_format } => lint(names, all, output_format, cwd),
        Commands::Create {
            branch_type,
            description,
            ticket,
            base,
            no_checkout,
            push,
            dry_run,
        } => {
            let validator = load_validator(cwd);
            let creator = BranchCreator::from_validator(&validator, CommandGit::new(cwd))?;
            let request = CreateRequest {
                branch_type,
                description,
                ticket,
                base_branch: base,
                checkout: !no_checkout,
                push,
                dry_run,
            };

            let report = creator.create(&request)?;
            println!("\x1b[32mGenerated branch name: {}\x1b[0m", report.plan.name);
            format::print_create_report(&report);
            Ok(0)
        }
        Commands::Config => {
            let loaded = toml_config::load_config_with_meta(cwd);
            format::print_config(&loaded.config, loaded.filepath.as_deref());
            Ok(0)
        }
        Commands::Init { force } => {
            if let Some(existing) = toml_config::find_config_file(cwd) {
                if !force {
                    println!("\x1b[33mConfiguration file {} already exists\x1b[0m", existing.display());
                    return Ok(0);
                }
            }
            let path = cwd.join(CONFIG_FILE_NAMES[0]);
            std::fs::write(&path, INIT_TEMPLATE)?;
            println!("\x1b[32m✓\x1b[0m Created {}", path.display());
            Ok(0)
        }
    }
}

/// Validator for the config found in `cwd`, plugins resolved on first use.
fn load_validator(cwd: &Path) -> BranchValidator {
    let mut validator = BranchValidator::new(
        Default::default(),
        BranchValidatorOptions {
            cwd: Some(cwd.to_path_buf()),
            config_path: None,
        },
    );
    validator.load_config_from_file();
    validator
}

fn lint(names: Vec<String>, all: bool, output_format: OutputFormat, cwd: &Path) -> Result<i32> {
    let validator = load_validator(cwd);
    let git = CommandGit::new(cwd);
    let names = if all {
        git.local_branches()?
    } else if names.is_empty() {
        vec![git.current_branch()?]
    } else {
        names
    };

    let mut reports = Vec::with_capacity(names.len());
    for branch in names {
        let result = validator.validate(&branch)?;
        reports.push(BranchReport { branch, result });
    }

    match output_format {
        OutputFormat::Pretty => format::print_pretty(&reports),
        OutputFormat::Json => format::print_json(&reports),
    }

    let has_errors = reports.iter().any(|r| !r.result.valid);
    Ok(if has_errors { 1 } else { 0 })
}
