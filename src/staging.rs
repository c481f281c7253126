//! Staging: the per-run scratch directory and the "before" baseline.
//!
//! Candidates are copied into a uniquely named directory under the
//! repository root. The plan predicts every file that may exist once
//! processing finishes, including export targets that have not been written
//! yet, and the ledger records a baseline size for each of them.

use crate::config::Policy;
use crate::constants::STAGING_DIR_PREFIX;
use crate::error::{Result, SweepError};
use crate::evaluate::OptimizationResult;
use crate::formats::{derived_name, ExportRule, ImageFormat};
use crate::utils::is_safe_relative;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};

/// One export a source file is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedExport {
    pub rule: ExportRule,
    pub file_name: String,
}

/// A candidate and everything it is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub source: String,
    pub format: ImageFormat,
    pub exports: Vec<PlannedExport>,
}

/// Two sources predicted the same output name. The first claim is kept and
/// the later export is dropped from the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub file_name: String,
    pub kept: String,
    pub skipped: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StagingPlan {
    pub files: Vec<PlannedFile>,
    pub collisions: Vec<Collision>,
}

impl StagingPlan {
    /// Every file name the plan expects to exist after processing.
    pub fn predicted_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().flat_map(|file| {
            std::iter::once(file.source.as_str())
                .chain(file.exports.iter().map(|export| export.file_name.as_str()))
        })
    }
}

/// Predict the outputs of every candidate under `policy`.
///
/// Candidates claim their own names first, then exports claim theirs in
/// candidate order. An export whose name is already claimed, or names a file
/// for which `exists` holds, is recorded as a [`Collision`] and left out of
/// the plan.
pub fn plan(candidates: &[String], policy: &Policy, exists: impl Fn(&str) -> bool) -> StagingPlan {
    let mut owners: HashMap<String, String> = candidates
        .iter()
        .map(|name| (name.clone(), name.clone()))
        .collect();
    let mut plan = StagingPlan::default();

    for source in candidates {
        let Some(format) = ImageFormat::from_path(source) else {
            continue;
        };

        let mut exports = Vec::new();
        for rule in policy.export_rules(format) {
            let file_name = derived_name(source, format, rule.target);
            if let Some(owner) = owners.get(&file_name) {
                warn!(
                    target_file = %file_name,
                    kept = %owner,
                    skipped = %source,
                    "Export target collides with another file, skipping {} export",
                    rule.target
                );
                plan.collisions.push(Collision {
                    file_name,
                    kept: owner.clone(),
                    skipped: source.clone(),
                });
                continue;
            }
            if exists(&file_name) {
                warn!(
                    target_file = %file_name,
                    skipped = %source,
                    "Export target already exists, skipping {} export",
                    rule.target
                );
                plan.collisions.push(Collision {
                    kept: file_name.clone(),
                    file_name,
                    skipped: source.clone(),
                });
                continue;
            }
            owners.insert(file_name.clone(), source.clone());
            exports.push(PlannedExport { rule, file_name });
        }

        plan.files.push(PlannedFile {
            source: source.clone(),
            format,
            exports,
        });
    }

    plan
}

/// Baseline and, later, measured state of one predicted file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntry {
    pub file_name: String,
    pub size_before: u64,
    pub size_after: Option<u64>,
    pub percentage_change: f64,
    pub significant: Option<bool>,
}

impl TrackedEntry {
    pub fn baseline(file_name: impl Into<String>, size_before: u64) -> Self {
        Self {
            file_name: file_name.into(),
            size_before,
            size_after: None,
            percentage_change: 0.0,
            significant: None,
        }
    }
}

/// Predicted file name → tracked entry, owned by a single run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ledger {
    entries: BTreeMap<String, TrackedEntry>,
}

impl Ledger {
    pub fn insert(&mut self, entry: TrackedEntry) {
        self.entries.insert(entry.file_name.clone(), entry);
    }

    pub fn get(&self, file_name: &str) -> Option<&TrackedEntry> {
        self.entries.get(file_name)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl IntoIterator for Ledger {
    type Item = TrackedEntry;
    type IntoIter = std::collections::btree_map::IntoValues<String, TrackedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Record a baseline for every planned file. Exports reuse their source's
/// size since they are transcodes of the same bytes.
pub async fn record_baseline(plan: &StagingPlan, staging_root: &Path) -> Result<Ledger> {
    let mut ledger = Ledger::default();

    for file in &plan.files {
        let size = fs::metadata(staging_root.join(&file.source)).await?.len();
        ledger.insert(TrackedEntry::baseline(&file.source, size));

        for export in &file.exports {
            ledger.insert(TrackedEntry::baseline(&export.file_name, size));
        }
    }

    debug!("Tracking {} predicted files", ledger.len());
    Ok(ledger)
}

/// Isolated per-run copy of the candidate files.
///
/// The directory is removed when the area is dropped or closed.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    dir: TempDir,
}

impl StagingArea {
    pub fn create(root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir_in(root)
            .map_err(|_| SweepError::StagingCreationFailed(root.to_path_buf()))?;
        debug!("Staging directory: {:?}", dir.path());
        Ok(Self {
            root: root.to_path_buf(),
            dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy candidates into the staging directory. Paths that would escape
    /// the repository or no longer exist are skipped, the rest are returned
    /// in order.
    pub async fn stage(&self, candidates: &[String]) -> Vec<String> {
        let mut staged = Vec::with_capacity(candidates.len());

        for name in candidates {
            if !is_safe_relative(name) {
                warn!(file = %name, "Skipping path outside the repository");
                continue;
            }
            match copy_into(&self.root.join(name), &self.path().join(name)).await {
                Ok(()) => staged.push(name.clone()),
                Err(e) => warn!(file = %name, "Skipping file that could not be staged: {}", e),
            }
        }

        staged
    }

    /// Copy significant results back over the working tree and delete
    /// originals that were replaced by an export.
    pub async fn persist(
        &self,
        results: &[OptimizationResult],
        removed: &[String],
    ) -> Result<()> {
        for result in results {
            debug!("Persisting {}", result.file_name);
            copy_into(
                &self.path().join(&result.file_name),
                &self.root.join(&result.file_name),
            )
            .await?;
        }

        for name in removed {
            debug!("Removing replaced original {}", name);
            match fs::remove_file(self.root.join(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

async fn copy_into(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(from, to).await?;
    Ok(())
}
