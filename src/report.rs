use crate::constants::PR_BODY_CHAR_LIMIT;
use crate::evaluate::OptimizationResult;
use crate::utils::format_size;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Rendered views of one run's significant results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Markdown for the PR comment, never longer than the comment limit.
    pub markdown: String,
    /// Plain table for the job log.
    pub terminal: String,
    /// Whether `markdown` is the compact fallback.
    pub truncated: bool,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Filename")]
    file_name: String,
    #[tabled(rename = "Before")]
    before: String,
    #[tabled(rename = "After")]
    after: String,
    #[tabled(rename = "Difference")]
    difference: String,
}

impl From<&OptimizationResult> for ReportRow {
    fn from(item: &OptimizationResult) -> Self {
        Self {
            file_name: item.file_name.clone(),
            before: format_size(Some(item.size_before)),
            after: format_size(Some(item.size_after)),
            difference: format_percentage(item.percentage_change),
        }
    }
}

/// Build both reports. Returns `None` for an empty result set.
///
/// `full_report_url` is only used by the compact fallback, which replaces
/// the rich markdown when it would exceed [`PR_BODY_CHAR_LIMIT`].
pub fn generate_report(results: &[OptimizationResult], full_report_url: &str) -> Option<Report> {
    generate_report_with_limit(results, full_report_url, PR_BODY_CHAR_LIMIT)
}

pub fn generate_report_with_limit(
    results: &[OptimizationResult],
    full_report_url: &str,
    limit: usize,
) -> Option<Report> {
    if results.is_empty() {
        return None;
    }

    let mut sorted: Vec<&OptimizationResult> = results.iter().collect();
    sorted.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    let total_saved: u64 = sorted.iter().map(|item| item.bytes_saved()).sum();

    let rich = markdown_report(&sorted, total_saved);
    let (markdown, truncated) = if char_len(&rich) > limit {
        (short_markdown_report(sorted.len(), total_saved, full_report_url, limit), true)
    } else {
        (rich, false)
    };

    Some(Report {
        markdown,
        terminal: terminal_report(&sorted, total_saved),
        truncated,
    })
}

fn markdown_report(data: &[&OptimizationResult], total_saved: u64) -> String {
    let mut markdown = format!(
        "Optimized <b>{}</b> {}, saved <b>{}</b> in total.\n\n",
        data.len(),
        plural(data.len()),
        format_size(Some(total_saved))
    );
    markdown.push_str("| Filename | Before | After | Difference |\n");
    markdown.push_str("| ---- | ------ | ----- | ----------- |\n");
    for item in data {
        markdown.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            item.file_name,
            format_size(Some(item.size_before)),
            format_size(Some(item.size_after)),
            format_percentage(item.percentage_change)
        ));
    }
    markdown
}

fn short_markdown_report(count: usize, total_saved: u64, url: &str, limit: usize) -> String {
    let description = format!(
        "Optimized <b>{}</b> {}, saved <b>{}</b> in total.\n\n",
        count,
        plural(count),
        format_size(Some(total_saved))
    );
    if !url.is_empty() {
        let with_link = format!(
            "{}Report too large. View the full report [here]({}).",
            description, url
        );
        if char_len(&with_link) <= limit {
            return with_link;
        }
    }

    let without_link = format!("{}Report too large.", description);
    if char_len(&without_link) <= limit {
        return without_link;
    }
    description.chars().take(limit).collect()
}

fn terminal_report(data: &[&OptimizationResult], total_saved: u64) -> String {
    let rows: Vec<ReportRow> = data.iter().map(|item| ReportRow::from(*item)).collect();
    let table = Table::new(rows).with(Style::modern()).to_string();
    format!(
        "Optimized {} {}, saved {} in total\n{}",
        data.len(),
        plural(data.len()),
        format_size(Some(total_saved)),
        table
    )
}

fn format_percentage(change: f64) -> String {
    format!("{:.2}%", change)
}

fn plural(count: usize) -> &'static str {
    if count > 1 {
        "images"
    } else {
        "image"
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
