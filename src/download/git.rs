use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::scratch::Scratch;
use super::{replace_dir, DefaultFetcher};
use crate::contract::{GitClient, GitOutcome, HttpClient};
use crate::error::{FetchError, GitStep};

/// Steps that bring an existing working copy to the remote tip, in order.
pub const UPDATE_STEPS: [GitStep; 4] = [
    GitStep::SetUrl,
    GitStep::Fetch,
    GitStep::Reset,
    GitStep::Clean,
];

fn update_args(step: GitStep, repo_url: &str) -> Vec<String> {
    let args = match step {
        GitStep::SetUrl => vec!["remote", "set-url", "origin", repo_url],
        GitStep::Fetch => vec!["fetch", "origin"],
        GitStep::Reset => vec!["reset", "--hard", "origin/HEAD"],
        GitStep::Clean => vec!["clean", "-fd"],
        GitStep::Clone => Vec::new(),
    };
    args.into_iter().map(String::from).collect()
}

/// The `git` binary on `PATH`, never allowed to prompt for credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitClient for SystemGit {
    fn run(&self, cwd: Option<PathBuf>, args: Vec<String>) -> io::Result<GitOutcome> {
        let mut command = Command::new("git");
        if let Some(dir) = &cwd {
            command.current_dir(dir);
        }
        let status = command
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .status()?;
        Ok(GitOutcome {
            success: status.success(),
            status: status.to_string(),
        })
    }
}

impl<H: HttpClient, G: GitClient> DefaultFetcher<H, G> {
    pub(crate) fn checkout_repo(
        &self,
        full_name: &str,
        repo_url: &str,
        version: &str,
    ) -> Result<(), FetchError> {
        let target = self.layout.target_dir(full_name);

        if target.join(".git").is_dir() {
            info!(full_name, repo_url, "Updating existing git repository");
            for step in UPDATE_STEPS {
                self.run_git(step, Some(target.clone()), update_args(step, repo_url))?;
            }
        } else {
            info!(full_name, repo_url, "Cloning git repository");
            let clone_dir = self.layout.scratch_dir(full_name);
            let _scratch = Scratch::claim(vec![clone_dir.clone()])
                .map_err(|e| FetchError::io(&clone_dir, e))?;
            if let Some(parent) = clone_dir.parent() {
                fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
            }
            let args = vec![
                "clone".to_string(),
                repo_url.to_string(),
                clone_dir.to_string_lossy().into_owned(),
            ];
            self.run_git(GitStep::Clone, None, args)?;
            replace_dir(&clone_dir, &target)?;
        }

        info!(full_name, version, "Checked out git repository");
        Ok(())
    }

    fn run_git(
        &self,
        step: GitStep,
        cwd: Option<PathBuf>,
        args: Vec<String>,
    ) -> Result<(), FetchError> {
        debug!(%step, ?args, "Running git");
        match self.git.run(cwd, args) {
            Ok(outcome) if outcome.success => Ok(()),
            Ok(outcome) => Err(FetchError::Checkout {
                step,
                detail: outcome.status,
            }),
            Err(e) => Err(FetchError::Checkout {
                step,
                detail: format!("failed to launch git: {e}"),
            }),
        }
    }
}
