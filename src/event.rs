use crate::config::ConfigSource;
use crate::constants::keys;
use crate::error::{Result, SweepError};
use std::fmt;

/// What triggered the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Optimize the files changed by a pull request and push to its branch.
    PullRequest { number: u64, branch: String },
    /// Optimize the whole repository.
    Sweep { trigger: SweepTrigger },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepTrigger {
    WorkflowDispatch,
    Schedule,
    /// Any other event name; still swept, never published.
    Other(String),
}

impl fmt::Display for SweepTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepTrigger::WorkflowDispatch => write!(f, "workflow_dispatch"),
            SweepTrigger::Schedule => write!(f, "schedule"),
            SweepTrigger::Other(name) => write!(f, "{}", name),
        }
    }
}

impl RunEvent {
    /// Classify the run from the CI environment.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let event_name = source.get(keys::EVENT_NAME).unwrap_or_default();

        match event_name.as_str() {
            "pull_request" | "pull_request_target" => {
                let branch = source
                    .get(keys::HEAD_REF)
                    .map(|b| b.trim().to_string())
                    .filter(|b| !b.is_empty())
                    .ok_or(SweepError::MissingBranch)?;
                let git_ref = source.get(keys::REF).unwrap_or_default();
                let number = pull_request_number(&git_ref)
                    .ok_or(SweepError::MissingPullRequest(git_ref))?;
                Ok(RunEvent::PullRequest { number, branch })
            }
            "workflow_dispatch" => Ok(RunEvent::Sweep {
                trigger: SweepTrigger::WorkflowDispatch,
            }),
            "schedule" => Ok(RunEvent::Sweep {
                trigger: SweepTrigger::Schedule,
            }),
            other => Ok(RunEvent::Sweep {
                trigger: SweepTrigger::Other(other.to_string()),
            }),
        }
    }

    pub fn is_pull_request(&self) -> bool {
        matches!(self, RunEvent::PullRequest { .. })
    }
}

/// `refs/pull/<n>/merge` or `refs/pull/<n>/head`.
fn pull_request_number(git_ref: &str) -> Option<u64> {
    git_ref
        .strip_prefix("refs/pull/")?
        .split('/')
        .next()?
        .parse()
        .ok()
}
