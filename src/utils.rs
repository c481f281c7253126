//! Utility functions shared by the staging, processing and reporting stages.

use crate::constants::{
    PROGRESS_BAR_TEMPLATE, SIGNIFICANT_REDUCTION_PERCENT, SIZE_UNITS, SIZE_UNIT_BASE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Component, Path};

/// Format a byte count with base-1000 units, e.g. `"1.50 KB"`.
///
/// Zero and unknown sizes render as `"n/a"`.
pub fn format_size(bytes: Option<u64>) -> String {
    let bytes = match bytes {
        Some(bytes) if bytes > 0 => bytes,
        _ => return "n/a".to_string(),
    };

    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= SIZE_UNIT_BASE && unit_index < SIZE_UNITS.len() - 1 {
        size /= SIZE_UNIT_BASE;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.2} {}", size, SIZE_UNITS[unit_index])
    }
}

/// Signed percentage change from `before` to `after`; negative means the
/// file shrank.
pub fn percentage_change(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    ((after as f64 - before as f64) / before as f64) * 100.0
}

/// True when `after` is strictly more than 1% smaller than `before`.
///
/// Evaluated in integers so the -1% boundary is exact.
pub fn is_significant(before: u64, after: u64) -> bool {
    let before = before as u128;
    let after = after as u128;
    after * 100 < before * (100 - SIGNIFICANT_REDUCTION_PERCENT as u128)
}

/// A repository-relative path that cannot escape the directory it is joined
/// onto.
pub fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Progress bar with consistent styling. Hidden automatically when stderr is
/// not a terminal.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(message.to_string());
    pb
}
