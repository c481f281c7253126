use crate::config::Policy;
use crate::error::{Result, SweepError};
use crate::formats::ImageFormat;
use crate::constants::STAGING_DIR_PREFIX;
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Candidate files split by format, plus the ordered list that will actually
/// be processed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    pub buckets: BTreeMap<ImageFormat, Vec<String>>,
    pub to_process: Vec<String>,
}

impl Classification {
    pub fn count(&self, format: ImageFormat) -> usize {
        self.buckets.get(&format).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.to_process.is_empty()
    }
}

/// Partition `paths` by recognized suffix and keep the ones whose format is
/// enabled for compression. Input order is preserved and a path is never
/// listed twice.
pub fn classify(paths: &[String], policy: &Policy) -> Classification {
    let mut classification = Classification::default();
    let mut seen = HashSet::new();

    for path in paths {
        let Some(format) = ImageFormat::from_path(path) else {
            continue;
        };
        if !seen.insert(path.as_str()) {
            continue;
        }

        classification
            .buckets
            .entry(format)
            .or_default()
            .push(path.clone());

        if policy.compresses(format) {
            classification.to_process.push(path.clone());
        }
    }

    for format in ImageFormat::ALL {
        debug!("{} files: {}", format, classification.count(format));
    }

    classification
}

/// Compiled ignore globs. Patterns that fail to parse are skipped with a
/// warning.
#[derive(Debug, Default, Clone)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn new(raw: &[String]) -> Self {
        let patterns = raw
            .iter()
            .filter_map(|pattern| match Pattern::new(pattern) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    warn!(pattern = %pattern, "Ignoring invalid ignore pattern: {}", e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(path, options))
    }

    /// Drop ignored entries from an externally supplied file list.
    pub fn filter(&self, paths: Vec<String>) -> Vec<String> {
        paths
            .into_iter()
            .filter(|path| {
                let ignored = self.is_ignored(path);
                if ignored {
                    debug!("Ignored: {}", path);
                }
                !ignored
            })
            .collect()
    }
}

/// Walk `root` and return every file as a `/`-separated path relative to it,
/// minus ignored paths, VCS metadata and leftover staging directories.
pub fn discover_files(root: &Path, ignore: &IgnoreSet) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(SweepError::RootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter();

    for entry in walker.filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        e.depth() == 0 || (name != ".git" && !name.starts_with(STAGING_DIR_PREFIX))
    }) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if !ignore.is_ignored(&relative) {
            files.push(relative);
        }
    }

    debug!("Discovered {} files under {:?}", files.len(), root);
    Ok(files)
}
