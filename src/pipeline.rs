use crate::classify::{classify, Classification};
use crate::codec::ImageCodec;
use crate::config::Policy;
use crate::error::{Result, SweepError};
use crate::evaluate::{evaluate, OptimizationResult};
use crate::processor::{FormatProcessor, ProcessOutcome};
use crate::staging::{plan, record_baseline, Collision, StagingArea, StagingPlan};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What one run changed in the working tree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    /// Files the classifier selected, in input order.
    pub candidates: Vec<String>,
    /// Significant results, copied back to the working tree.
    pub results: Vec<OptimizationResult>,
    /// Originals deleted in favour of their WebP export.
    pub removed: Vec<String>,
    pub collisions: Vec<Collision>,
}

impl RunSummary {
    pub fn has_changes(&self) -> bool {
        !self.results.is_empty() || !self.removed.is_empty()
    }
}

/// classify → stage → plan → baseline → process → evaluate → persist.
pub struct Pipeline {
    root: PathBuf,
    policy: Policy,
    codec: Arc<dyn ImageCodec>,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>, policy: Policy, codec: Arc<dyn ImageCodec>) -> Self {
        Self {
            root: root.into(),
            policy,
            codec,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Classify `files` and predict every output without touching the
    /// working tree.
    pub fn plan(&self, files: &[String]) -> (Classification, StagingPlan) {
        let classification = classify(files, &self.policy);
        let staging_plan = plan(&classification.to_process, &self.policy, |name| {
            self.root.join(name).exists()
        });
        (classification, staging_plan)
    }

    /// Optimize `files` (repository-relative paths) and persist the
    /// significant changes under the root.
    pub async fn run(&self, files: &[String]) -> Result<RunSummary> {
        if !self.root.is_dir() {
            return Err(SweepError::RootNotFound(self.root.clone()));
        }

        let classification = classify(files, &self.policy);
        if classification.is_empty() {
            info!("No images to optimize");
            return Ok(RunSummary::default());
        }

        let staging = StagingArea::create(&self.root)?;
        let staged = staging.stage(&classification.to_process).await;
        info!("Optimizing {} images", staged.len());

        let staging_plan = plan(&staged, &self.policy, |name| self.root.join(name).exists());
        let ledger = record_baseline(&staging_plan, staging.path()).await?;

        let ProcessOutcome { removed, .. } =
            FormatProcessor::new(Arc::clone(&self.codec), &self.policy, staging.path())
                .process(&staging_plan)
                .await;

        let results = evaluate(ledger, staging.path()).await;
        if results.is_empty() && removed.is_empty() {
            info!("No images optimized");
        } else {
            staging.persist(&results, &removed).await?;
        }
        staging.close()?;

        Ok(RunSummary {
            candidates: classification.to_process,
            results,
            removed,
            collisions: staging_plan.collisions,
        })
    }
}
