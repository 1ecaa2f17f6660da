//! Branch name linting and construction.
//!
//! Names are checked by a registry of rules (five built in, more from plugins),
//! each configured with a severity and optional options. The same config drives
//! [`naming::build_branch_name`], so names built by the tool pass its own lint.
//!
//! ```
//! use branchwright::config::BranchConfig;
//! use branchwright::lint::lint_branch_name;
//!
//! let config = BranchConfig::default();
//! assert!(lint_branch_name("feat/add-login", &config, None).unwrap().is_valid);
//! assert!(!lint_branch_name("add-login", &config, None).unwrap().is_valid);
//! ```

pub mod cli;
pub mod config;
pub mod creator;
pub mod error;
pub mod git;
pub mod lint;
pub mod naming;
pub mod rules;
pub mod style;
pub mod validator;
