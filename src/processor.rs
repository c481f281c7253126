//! The decision engine.
//!
//! For every planned file the processor runs, in order: each planned export,
//! then either the replace-original step or the in-place compression. Every
//! re-encode passes through the same significance gate; output that does not
//! shrink the file by more than 1% is discarded and nothing is written.
//! Codec failures are logged and only affect the operation that failed.

use crate::codec::{CodecRequest, ImageCodec};
use crate::config::Policy;
use crate::error::CodecError;
use crate::formats::{Encoding, ExportTarget};
use crate::staging::{PlannedExport, PlannedFile, StagingPlan};
use crate::utils::{create_progress_bar, is_significant, percentage_change};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Compress,
    Export(ExportTarget),
    DeleteOriginal,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Compress => write!(f, "compress"),
            Operation::Export(target) => write!(f, "export {}", target),
            Operation::DeleteOriginal => write!(f, "delete original"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    /// Output cleared the threshold and was written.
    Written { before: u64, after: u64 },
    /// Output did not clear the threshold; nothing was written.
    Insignificant { before: u64, after: u64 },
    /// The source was removed in favour of its export.
    Removed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub file_name: String,
    pub operation: Operation,
    pub status: OperationStatus,
}

/// What processing did, beyond the bytes left in the staging directory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub records: Vec<OperationRecord>,
    /// Originals replaced by an export, to be deleted from the working tree.
    pub removed: Vec<String>,
}

impl ProcessOutcome {
    pub fn failures(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, OperationStatus::Failed(_)))
            .count()
    }

    fn record(&mut self, file_name: &str, operation: Operation, status: OperationStatus) {
        self.records.push(OperationRecord {
            file_name: file_name.to_string(),
            operation,
            status,
        });
    }
}

pub struct FormatProcessor<'a> {
    codec: Arc<dyn ImageCodec>,
    policy: &'a Policy,
    staging_root: &'a Path,
}

impl<'a> FormatProcessor<'a> {
    pub fn new(codec: Arc<dyn ImageCodec>, policy: &'a Policy, staging_root: &'a Path) -> Self {
        Self {
            codec,
            policy,
            staging_root,
        }
    }

    /// Process every planned file, one at a time.
    pub async fn process(&self, plan: &StagingPlan) -> ProcessOutcome {
        let mut outcome = ProcessOutcome::default();
        let progress = create_progress_bar(plan.files.len() as u64, "Optimizing images");

        for file in &plan.files {
            progress.set_message(file.source.clone());
            self.process_file(file, &mut outcome).await;
            progress.inc(1);
        }

        progress.finish_and_clear();
        if outcome.failures() > 0 {
            warn!("{} operations failed", outcome.failures());
        }
        outcome
    }

    async fn process_file(&self, file: &PlannedFile, outcome: &mut ProcessOutcome) {
        let source_path = self.staging_root.join(&file.source);
        let source: Arc<[u8]> = match fs::read(&source_path).await {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                warn!(file = %file.source, "Could not read staged file: {}", e);
                outcome.record(
                    &file.source,
                    Operation::Compress,
                    OperationStatus::Failed(e.to_string()),
                );
                return;
            }
        };

        let mut webp_written = false;
        for export in &file.exports {
            let status = self.export(file, export, &source).await;
            if export.rule.target == ExportTarget::WebP
                && matches!(status, OperationStatus::Written { .. })
            {
                webp_written = true;
            }
            outcome.record(&file.source, Operation::Export(export.rule.target), status);
        }

        if self.policy.replaces_original(file.format) {
            if webp_written {
                let status = match fs::remove_file(&source_path).await {
                    Ok(()) => {
                        info!("Replaced {} with its WebP export", file.source);
                        outcome.removed.push(file.source.clone());
                        OperationStatus::Removed
                    }
                    Err(e) => {
                        warn!(file = %file.source, "Could not remove original: {}", e);
                        OperationStatus::Failed(e.to_string())
                    }
                };
                outcome.record(&file.source, Operation::DeleteOriginal, status);
            } else {
                info!(
                    "Left {} untouched: no WebP export was written to replace it",
                    file.source
                );
            }
            return;
        }

        if !self.policy.compresses(file.format) {
            return;
        }
        match file.format.profile().compress {
            Some(encoding) => {
                let status = self.compress(file, encoding, &source).await;
                outcome.record(&file.source, Operation::Compress, status);
            }
            None => debug!(file = %file.source, "No in-place encoder for {}", file.format),
        }
    }

    async fn export(
        &self,
        file: &PlannedFile,
        export: &PlannedExport,
        source: &Arc<[u8]>,
    ) -> OperationStatus {
        let request = CodecRequest {
            source: file.format,
            target: export.rule.target.format(),
            encoding: export.rule.encoding,
        };
        let target = self.staging_root.join(&export.file_name);
        self.run(&file.source, Operation::Export(export.rule.target), request, source, &target)
            .await
    }

    async fn compress(
        &self,
        file: &PlannedFile,
        encoding: Encoding,
        source: &Arc<[u8]>,
    ) -> OperationStatus {
        let request = CodecRequest {
            source: file.format,
            target: file.format,
            encoding,
        };
        let target = self.staging_root.join(&file.source);
        self.run(&file.source, Operation::Compress, request, source, &target)
            .await
    }

    /// Invoke the codec and write `target` only when the output is
    /// significantly smaller than the source.
    async fn run(
        &self,
        file_name: &str,
        operation: Operation,
        request: CodecRequest,
        source: &Arc<[u8]>,
        target: &Path,
    ) -> OperationStatus {
        let before = source.len() as u64;
        let encoded = match self.invoke(request, Arc::clone(source)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %file_name, operation = %operation, "Codec failed: {}", e);
                return OperationStatus::Failed(e.to_string());
            }
        };

        let after = encoded.len() as u64;
        debug!(
            file = %file_name,
            operation = %operation,
            before,
            after,
            "{:.2}%",
            percentage_change(before, after)
        );

        if !is_significant(before, after) {
            return OperationStatus::Insignificant { before, after };
        }

        match fs::write(target, &encoded).await {
            Ok(()) => OperationStatus::Written { before, after },
            Err(e) => {
                warn!(file = %file_name, operation = %operation, "Could not write output: {}", e);
                OperationStatus::Failed(e.to_string())
            }
        }
    }

    async fn invoke(&self, request: CodecRequest, input: Arc<[u8]>) -> Result<Vec<u8>, CodecError> {
        let codec = Arc::clone(&self.codec);
        tokio::task::spawn_blocking(move || codec.encode(&request, &input))
            .await
            .map_err(|e| CodecError::Worker(e.to_string()))?
    }
}
