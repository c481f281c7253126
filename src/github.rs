//! Thin facades over the `git` and `gh` command line tools.

use crate::config::ConfigSource;
use crate::constants::{keys, BOT_EMAIL, BOT_NAME, COMMIT_MESSAGE};
use crate::error::{Result, SweepError};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

const OUTPUT_DELIMITER: &str = "IMG_SWEEP_EOF";

#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Configure the committer identity and check out `branch`.
    async fn prepare(&self, branch: &str) -> Result<()>;

    /// Paths touched by the pull request, repository-relative.
    async fn changed_files(&self, pull_request: u64) -> Result<Vec<String>>;

    /// Stage everything, commit and push to `branch`.
    async fn commit_and_push(&self, branch: &str) -> Result<()>;
}

#[async_trait]
pub trait ReportPublisher: Send + Sync {
    async fn publish(&self, pull_request: u64, markdown: &str) -> Result<()>;
}

/// Runs `git` and `gh` in the repository root.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    token: String,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            token: token.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        run("git", args, &self.root, &[]).await
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn prepare(&self, branch: &str) -> Result<()> {
        self.git(&["config", "user.name", BOT_NAME]).await?;
        self.git(&["config", "user.email", BOT_EMAIL]).await?;
        self.git(&["fetch", "origin", branch]).await?;
        self.git(&["checkout", branch]).await?;
        info!("Checked out {}", branch);
        Ok(())
    }

    async fn changed_files(&self, pull_request: u64) -> Result<Vec<String>> {
        let number = pull_request.to_string();
        let stdout = run(
            "gh",
            &["pr", "diff", &number, "--name-only"],
            &self.root,
            &[("GH_TOKEN", &self.token)],
        )
        .await?;
        Ok(parse_file_list(&stdout))
    }

    async fn commit_and_push(&self, branch: &str) -> Result<()> {
        self.git(&["add", "."]).await?;
        info!("Committing changes");
        self.git(&["commit", "-m", COMMIT_MESSAGE]).await?;
        info!("Pushing changes to {}", branch);
        let refspec = format!("HEAD:{}", branch);
        self.git(&["push", "origin", &refspec]).await?;
        Ok(())
    }
}

/// Posts reports as pull request comments through `gh`.
#[derive(Debug, Clone)]
pub struct GhCli {
    root: PathBuf,
    token: String,
}

impl GhCli {
    pub fn new(root: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl ReportPublisher for GhCli {
    async fn publish(&self, pull_request: u64, markdown: &str) -> Result<()> {
        // Comment bodies can be far larger than a command line allows.
        let mut body = tempfile::NamedTempFile::new()?;
        body.write_all(markdown.as_bytes())?;
        body.flush()?;

        let number = pull_request.to_string();
        let body_path = body.path().to_string_lossy().into_owned();
        info!("Creating new comment on #{}", pull_request);
        run(
            "gh",
            &["pr", "comment", &number, "--body-file", &body_path],
            &self.root,
            &[("GH_TOKEN", &self.token)],
        )
        .await?;
        Ok(())
    }
}

async fn run(program: &str, args: &[&str], cwd: &Path, envs: &[(&str, &str)]) -> Result<String> {
    debug!("Running {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(envs.iter().copied())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SweepError::CommandFailed {
            program: program.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_file_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Link to the workflow run, used when the report is too large for a
/// comment. `None` outside of GitHub Actions.
pub fn full_report_url(source: &dyn ConfigSource) -> Option<String> {
    let server = source.get(keys::SERVER_URL)?;
    let repository = source.get(keys::REPOSITORY)?;
    let run_id = source.get(keys::RUN_ID)?;
    Some(format!(
        "{}/{}/actions/runs/{}",
        server.trim_end_matches('/'),
        repository,
        run_id
    ))
}

/// Append a multiline `name` output to the file named by `GITHUB_OUTPUT`.
pub async fn write_action_output(path: &Path, name: &str, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let entry = format!(
        "{name}<<{delim}\n{value}\n{delim}\n",
        name = name,
        delim = OUTPUT_DELIMITER,
        value = value
    );
    file.write_all(entry.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
