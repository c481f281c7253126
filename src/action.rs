//! End-to-end CI run: resolve the event, collect candidates, optimize,
//! report, and publish on pull requests.

use crate::classify::{discover_files, IgnoreSet};
use crate::config::{ConfigSource, Settings};
use crate::constants::keys;
use crate::error::{Result, SweepError};
use crate::event::RunEvent;
use crate::github::{full_report_url, write_action_output, ReportPublisher, SourceControl};
use crate::pipeline::{Pipeline, RunSummary};
use crate::report::{generate_report, Report};
use std::path::PathBuf;
use tracing::info;

/// Everything a CI run needs from its environment, resolved up front so
/// that configuration errors surface before any file is touched.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub settings: Settings,
    pub event: RunEvent,
    pub full_report_url: String,
    pub output_path: Option<PathBuf>,
}

impl ActionContext {
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let settings = Settings::from_source(source);
        let event = RunEvent::from_source(source)?;
        if event.is_pull_request() && settings.token.is_none() {
            return Err(SweepError::MissingToken);
        }

        Ok(Self {
            settings,
            event,
            full_report_url: full_report_url(source).unwrap_or_default(),
            output_path: source
                .get(keys::OUTPUT)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

#[derive(Debug, Default)]
pub struct ActionOutcome {
    pub summary: RunSummary,
    pub report: Option<Report>,
    pub published: bool,
}

pub async fn run_action(
    context: &ActionContext,
    pipeline: &Pipeline,
    source_control: &dyn SourceControl,
    publisher: &dyn ReportPublisher,
) -> Result<ActionOutcome> {
    let ignore = IgnoreSet::new(&pipeline.policy().ignore_paths);

    let files = match &context.event {
        RunEvent::PullRequest { number, branch } => {
            info!("Running pull request #{} on {}", number, branch);
            source_control.prepare(branch).await?;
            ignore.filter(source_control.changed_files(*number).await?)
        }
        RunEvent::Sweep { trigger } => {
            info!("Running full sweep ({})", trigger);
            discover_files(pipeline.root(), &ignore)?
        }
    };

    let summary = pipeline.run(&files).await?;
    let Some(report) = generate_report(&summary.results, &context.full_report_url) else {
        info!("No images optimized");
        return Ok(ActionOutcome {
            summary,
            ..ActionOutcome::default()
        });
    };

    if let Some(path) = &context.output_path {
        write_action_output(path, "markdown_report", &report.markdown).await?;
    }

    let mut published = false;
    if let RunEvent::PullRequest { number, branch } = &context.event {
        source_control.commit_and_push(branch).await?;
        publisher.publish(*number, &report.markdown).await?;
        published = true;
    }

    Ok(ActionOutcome {
        summary,
        report: Some(report),
        published,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecRequest, ImageCodec};
    use crate::config::Policy;
    use crate::error::CodecError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct HalvingCodec;

    impl ImageCodec for HalvingCodec {
        fn encode(
            &self,
            _request: &CodecRequest,
            input: &[u8],
        ) -> std::result::Result<Vec<u8>, CodecError> {
            Ok(input[..input.len() / 2].to_vec())
        }
    }

    #[derive(Default)]
    struct FakeGit {
        files: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SourceControl for FakeGit {
        async fn prepare(&self, branch: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("prepare {}", branch));
            Ok(())
        }

        async fn changed_files(&self, pull_request: u64) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push(format!("diff {}", pull_request));
            Ok(self.files.clone())
        }

        async fn commit_and_push(&self, branch: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("push {}", branch));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeComments {
        posted: Mutex<Vec<(u64, String)>>,
    }

    #[async_trait]
    impl ReportPublisher for FakeComments {
        async fn publish(&self, pull_request: u64, markdown: &str) -> Result<()> {
            self.posted
                .lock()
                .unwrap()
                .push((pull_request, markdown.to_string()));
            Ok(())
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn pr_env(extra: &[(&str, &str)]) -> HashMap<String, String> {
        let mut source = env(&[
            (keys::EVENT_NAME, "pull_request"),
            (keys::HEAD_REF, "feature"),
            (keys::REF, "refs/pull/7/merge"),
        ]);
        source.extend(env(extra));
        source
    }

    #[test]
    fn test_pull_request_requires_token() {
        let err = ActionContext::from_source(&pr_env(&[])).unwrap_err();
        assert!(matches!(err, SweepError::MissingToken));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_sweep_does_not_require_token() {
        let context =
            ActionContext::from_source(&env(&[(keys::EVENT_NAME, "workflow_dispatch")])).unwrap();
        assert!(!context.event.is_pull_request());
        assert!(context.output_path.is_none());
    }

    #[tokio::test]
    async fn test_pull_request_run_commits_and_comments() {
        let repo = tempfile::TempDir::new().unwrap();
        std::fs::write(repo.path().join("a.png"), vec![1u8; 1000]).unwrap();
        std::fs::write(repo.path().join("skip.png"), vec![1u8; 1000]).unwrap();

        let output = repo.path().join("gh-output");
        let output_str = output.to_string_lossy().into_owned();
        let source = pr_env(&[
            (keys::GITHUB_TOKEN, "token"),
            (keys::IGNORE_PATHS, "skip.png"),
            (keys::OUTPUT, &output_str),
        ]);
        let context = ActionContext::from_source(&source).unwrap();
        let pipeline = Pipeline::new(
            repo.path(),
            Policy::from_source(&source),
            Arc::new(HalvingCodec),
        );
        let git = FakeGit {
            files: vec!["a.png".to_string(), "skip.png".to_string(), "README.md".to_string()],
            ..FakeGit::default()
        };
        let comments = FakeComments::default();

        let outcome = run_action(&context, &pipeline, &git, &comments).await.unwrap();

        assert!(outcome.published);
        assert_eq!(outcome.summary.candidates, vec!["a.png"]);
        assert_eq!(
            *git.calls.lock().unwrap(),
            vec!["prepare feature", "diff 7", "push feature"]
        );
        let posted = comments.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, 7);
        assert!(posted[0].1.contains("| a.png |"));
        assert_eq!(std::fs::metadata(repo.path().join("skip.png")).unwrap().len(), 1000);
        assert!(std::fs::read_to_string(&output)
            .unwrap()
            .starts_with("markdown_report<<"));
    }

    #[tokio::test]
    async fn test_sweep_without_results_takes_no_action() {
        let repo = tempfile::TempDir::new().unwrap();
        std::fs::write(repo.path().join("notes.txt"), b"text").unwrap();

        let context =
            ActionContext::from_source(&env(&[(keys::EVENT_NAME, "schedule")])).unwrap();
        let pipeline = Pipeline::new(repo.path(), Policy::default(), Arc::new(HalvingCodec));
        let git = FakeGit::default();
        let comments = FakeComments::default();

        let outcome = run_action(&context, &pipeline, &git, &comments).await.unwrap();

        assert!(outcome.report.is_none());
        assert!(!outcome.published);
        assert!(git.calls.lock().unwrap().is_empty());
        assert!(comments.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_discovers_and_reports_without_publishing() {
        let repo = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(repo.path().join("img")).unwrap();
        std::fs::write(repo.path().join("img/logo.svg"), vec![b' '; 400]).unwrap();

        let context =
            ActionContext::from_source(&env(&[(keys::EVENT_NAME, "workflow_dispatch")])).unwrap();
        let pipeline = Pipeline::new(repo.path(), Policy::default(), Arc::new(HalvingCodec));
        let git = FakeGit::default();
        let comments = FakeComments::default();

        let outcome = run_action(&context, &pipeline, &git, &comments).await.unwrap();

        assert!(!outcome.published);
        let report = outcome.report.unwrap();
        assert!(report.markdown.contains("img/logo.svg"));
        assert!(git.calls.lock().unwrap().is_empty());
    }
}
