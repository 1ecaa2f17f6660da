use crate::cli::toml_config::ConfigError;
use crate::creator::CreateError;
use crate::git::GitError;
use crate::rules::extensions::ExtensionError;
use crate::rules::RuleError;
use thiserror::Error;

/// Any failure surfaced by the library's entry points.
#[derive(Debug, Error)]
pub enum BranchwrightError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Extension(#[from] ExtensionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Create(#[from] CreateError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BranchwrightError> = std::result::Result<T, E>;
