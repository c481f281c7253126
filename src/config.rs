use crate::constants::keys;
use crate::formats::{ExportRule, ExportTarget, ImageFormat};
use std::collections::HashMap;

/// A flat source of named string options.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads options from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Resolved optimization policy for one run.
///
/// Built once at startup and only ever shared by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub compress_svg: bool,
    pub compress_png: bool,
    pub compress_jpg: bool,
    pub compress_gif: bool,
    pub compress_webp: bool,
    pub compress_avif: bool,
    pub export_webp: bool,
    pub export_avif: bool,
    pub replace_original_after_export: bool,
    pub ignore_paths: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            compress_svg: true,
            compress_png: true,
            compress_jpg: true,
            compress_gif: true,
            compress_webp: true,
            compress_avif: true,
            export_webp: false,
            export_avif: false,
            replace_original_after_export: false,
            ignore_paths: Vec::new(),
        }
    }
}

impl Policy {
    /// Resolve the policy. Missing or malformed values fall back to defaults.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        Self {
            compress_svg: opt_out(source, keys::COMPRESS_SVG),
            compress_png: opt_out(source, keys::COMPRESS_PNG),
            compress_jpg: opt_out(source, keys::COMPRESS_JPG),
            compress_gif: opt_out(source, keys::COMPRESS_GIF),
            compress_webp: opt_out(source, keys::COMPRESS_WEBP),
            compress_avif: opt_out(source, keys::COMPRESS_AVIF),
            export_webp: opt_in(source, keys::EXPORT_WEBP),
            export_avif: opt_in(source, keys::EXPORT_AVIF),
            replace_original_after_export: opt_in(
                source,
                keys::REPLACE_ORIGINAL_AFTER_EXPORT_WEBP,
            ),
            ignore_paths: source
                .get(keys::IGNORE_PATHS)
                .map(|raw| {
                    raw.lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn compresses(&self, format: ImageFormat) -> bool {
        match format {
            ImageFormat::Svg => self.compress_svg,
            ImageFormat::Png => self.compress_png,
            ImageFormat::Jpeg => self.compress_jpg,
            ImageFormat::Gif => self.compress_gif,
            ImageFormat::WebP => self.compress_webp,
            ImageFormat::Avif => self.compress_avif,
        }
    }

    pub fn exports(&self, target: ExportTarget) -> bool {
        match target {
            ExportTarget::WebP => self.export_webp,
            ExportTarget::Avif => self.export_avif,
        }
    }

    /// Export rules that apply to `format` under this policy.
    ///
    /// Exports ride on the per-format processing path: a format whose
    /// compress flag is off is never processed, so it exports nothing.
    pub fn export_rules(&self, format: ImageFormat) -> Vec<ExportRule> {
        if !self.compresses(format) {
            return Vec::new();
        }
        format
            .profile()
            .exports
            .iter()
            .copied()
            .filter(|rule| self.exports(rule.target))
            .collect()
    }

    /// The original is dropped in favour of its WebP export, and is never
    /// compressed in place.
    pub fn replaces_original(&self, format: ImageFormat) -> bool {
        self.replace_original_after_export
            && self.export_webp
            && self.compresses(format)
            && format.profile().is_replaceable()
    }
}

/// Everything the run needs from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub policy: Policy,
    pub debug: bool,
    pub token: Option<String>,
}

impl Settings {
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        Self {
            policy: Policy::from_source(source),
            debug: opt_in(source, keys::DEBUG),
            token: source
                .get(keys::GITHUB_TOKEN)
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
        }
    }
}

fn opt_out(source: &dyn ConfigSource, key: &str) -> bool {
    source
        .get(key)
        .map_or(true, |value| value.trim() != "false")
}

fn opt_in(source: &dyn ConfigSource, key: &str) -> bool {
    source
        .get(key)
        .map_or(false, |value| value.trim() == "true")
}
