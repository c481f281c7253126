use crate::staging::{Ledger, TrackedEntry};
use crate::utils::{is_significant, percentage_change};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Measured outcome for one file, as handed to reporting and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub file_name: String,
    pub size_before: u64,
    pub size_after: u64,
    pub percentage_change: f64,
    pub significant: bool,
}

impl OptimizationResult {
    pub fn bytes_saved(&self) -> u64 {
        self.size_before.saturating_sub(self.size_after)
    }
}

impl TrackedEntry {
    /// Fill in the post-processing size. Consumes the entry so it can only
    /// be measured once.
    pub fn measure(self, size_after: u64) -> TrackedEntry {
        let change = percentage_change(self.size_before, size_after);
        TrackedEntry {
            size_after: Some(size_after),
            percentage_change: change,
            significant: Some(is_significant(self.size_before, size_after)),
            ..self
        }
    }
}

impl TryFrom<TrackedEntry> for OptimizationResult {
    type Error = TrackedEntry;

    /// Only measured entries convert.
    fn try_from(entry: TrackedEntry) -> Result<Self, Self::Error> {
        match (entry.size_after, entry.significant) {
            (Some(size_after), Some(significant)) => Ok(OptimizationResult {
                file_name: entry.file_name,
                size_before: entry.size_before,
                size_after,
                percentage_change: entry.percentage_change,
                significant,
            }),
            _ => Err(entry),
        }
    }
}

/// Measure every tracked file in `staging_root` and keep the significant
/// ones. Files that were never produced, or were removed, are dropped.
pub async fn evaluate(ledger: Ledger, staging_root: &Path) -> Vec<OptimizationResult> {
    let mut results = Vec::new();

    for entry in ledger {
        let size_after = match fs::metadata(staging_root.join(&entry.file_name)).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} was not produced, dropping", entry.file_name);
                continue;
            }
            Err(e) => {
                warn!(file = %entry.file_name, "Could not measure file: {}", e);
                continue;
            }
        };

        let measured = entry.measure(size_after);
        debug!(
            file = %measured.file_name,
            before = measured.size_before,
            after = size_after,
            "{:.2}%",
            measured.percentage_change
        );

        if let Ok(result) = OptimizationResult::try_from(measured) {
            if result.significant {
                results.push(result);
            }
        }
    }

    results
}
