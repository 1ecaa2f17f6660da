use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GitError {
    #[error("git is not installed or not in PATH")]
    GitNotFound,
    #[error("not inside a git repository")]
    NotARepo,
    #[error("git command failed: {0}")]
    CommandFailed(String),
}

/// The git operations the linter and the branch creator need.
pub trait GitBackend {
    fn is_repo(&self) -> bool;

    /// Name of the checked-out branch (`HEAD` when detached).
    fn current_branch(&self) -> Result<String, GitError>;

    fn local_branches(&self) -> Result<Vec<String>, GitError>;

    /// Remote names in the order git lists them.
    fn remotes(&self) -> Result<Vec<String>, GitError>;

    fn checkout(&self, branch: &str) -> Result<(), GitError>;

    /// Create `name` from the current HEAD, switching to it when `checkout` is set.
    fn create_branch(&self, name: &str, checkout: bool) -> Result<(), GitError>;

    /// Push `branch` to `remote` and set it as upstream.
    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError>;
}

/// Runs the `git` binary in a working directory.
#[derive(Debug, Clone)]
pub struct CommandGit {
    repo_dir: PathBuf,
}

impl CommandGit {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        debug!(dir = %self.repo_dir.display(), ?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|_| GitError::GitNotFound)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }
            return Err(GitError::CommandFailed(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl GitBackend for CommandGit {
    fn is_repo(&self) -> bool {
        self.run(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out.trim() == "true")
            .unwrap_or(false)
    }

    fn current_branch(&self) -> Result<String, GitError> {
        Ok(self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?.trim().to_string())
    }

    fn local_branches(&self) -> Result<Vec<String>, GitError> {
        let out = self.run(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(non_empty_lines(&out).into_iter().filter(|b| b != "HEAD").collect())
    }

    fn remotes(&self) -> Result<Vec<String>, GitError> {
        Ok(non_empty_lines(&self.run(&["remote"])?))
    }

    fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["checkout", branch]).map(|_| ())
    }

    fn create_branch(&self, name: &str, checkout: bool) -> Result<(), GitError> {
        if checkout {
            self.run(&["checkout", "-b", name]).map(|_| ())
        } else {
            self.run(&["branch", name]).map(|_| ())
        }
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["push", "--set-upstream", remote, branch]).map(|_| ())
    }
}

/// A call recorded by [`MockGit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Checkout(String),
    CreateBranch { name: String, checkout: bool },
    Push { remote: String, branch: String },
}

/// In-memory [`GitBackend`] for tests. Mutating calls are recorded, not executed.
#[derive(Debug)]
pub struct MockGit {
    is_repo: bool,
    current_branch: String,
    branches: Vec<String>,
    remotes: Vec<String>,
    push_error: Option<String>,
    calls: Mutex<Vec<GitCall>>,
}

impl Default for MockGit {
    fn default() -> Self {
        Self {
            is_repo: true,
            current_branch: "main".to_string(),
            branches: vec!["main".to_string()],
            remotes: vec!["origin".to_string()],
            push_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockGit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn not_a_repo(mut self) -> Self {
        self.is_repo = false;
        self
    }

    #[must_use]
    pub fn with_current_branch(mut self, branch: &str) -> Self {
        self.current_branch = branch.to_string();
        self
    }

    #[must_use]
    pub fn with_branches(mut self, branches: &[&str]) -> Self {
        self.branches = branches.iter().map(|b| b.to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_remotes(mut self, remotes: &[&str]) -> Self {
        self.remotes = remotes.iter().map(|r| r.to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_push_error(mut self, error: &str) -> Self {
        self.push_error = Some(error.to_string());
        self
    }

    /// Mutating calls made so far, in order.
    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: GitCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl GitBackend for MockGit {
    fn is_repo(&self) -> bool {
        self.is_repo
    }

    fn current_branch(&self) -> Result<String, GitError> {
        if !self.is_repo {
            return Err(GitError::NotARepo);
        }
        Ok(self.current_branch.clone())
    }

    fn local_branches(&self) -> Result<Vec<String>, GitError> {
        if !self.is_repo {
            return Err(GitError::NotARepo);
        }
        Ok(self.branches.clone())
    }

    fn remotes(&self) -> Result<Vec<String>, GitError> {
        Ok(self.remotes.clone())
    }

    fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.record(GitCall::Checkout(branch.to_string()));
        Ok(())
    }

    fn create_branch(&self, name: &str, checkout: bool) -> Result<(), GitError> {
        self.record(GitCall::CreateBranch {
            name: name.to_string(),
            checkout,
        });
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.record(GitCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        match self.push_error {
            Some(ref e) => Err(GitError::CommandFailed(e.clone())),
            None => Ok(()),
        }
    }
}
