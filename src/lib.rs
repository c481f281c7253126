pub mod action;
pub mod classify;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod evaluate;
pub mod event;
pub mod formats;
pub mod github;
pub mod logger;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod staging;
pub mod svg;
pub mod utils;

pub use classify::{classify, discover_files, Classification, IgnoreSet};
pub use codec::{CodecRequest, ImageCodec, NativeCodec};
pub use config::{ConfigSource, EnvSource, Policy, Settings};
pub use error::{CodecError, Result, SweepError};
pub use evaluate::{evaluate, OptimizationResult};
pub use formats::{derived_name, Encoding, ExportRule, ExportTarget, ImageFormat};
pub use pipeline::{Pipeline, RunSummary};
pub use processor::{FormatProcessor, ProcessOutcome};
pub use report::{generate_report, Report};
pub use staging::{plan, record_baseline, StagingArea, StagingPlan};
