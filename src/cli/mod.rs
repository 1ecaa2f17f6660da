pub mod format;
pub mod toml_config;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "brw",
    version,
    about = "Lint git branch names and create branches that follow the rules"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate branch names (defaults to the current branch)
    #[command(visible_alias = "l")]
    Lint {
        /// Branch names to validate
        names: Vec<String>,

        /// Validate every local branch
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Create a branch from a type and description
    #[command(visible_alias = "c")]
    Create {
        /// Branch type (feat, fix, chore, ...)
        #[arg(short = 't', long = "type")]
        branch_type: String,

        /// Branch description
        #[arg(short, long = "desc")]
        description: String,

        /// Ticket or issue ID
        #[arg(long)]
        ticket: Option<String>,

        /// Base branch to create from (defaults to the current branch)
        #[arg(short, long)]
        base: Option<String>,

        /// Don't switch to the new branch
        #[arg(short = 'n', long)]
        no_checkout: bool,

        /// Push the branch to the first remote
        #[arg(long)]
        push: bool,

        /// Show what would be done without creating anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the effective configuration
    Config,

    /// Write a starter branchwright.toml
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}
