/// Maximum length of a PR comment body accepted by GitHub.
pub const PR_BODY_CHAR_LIMIT: usize = 65_536;

/// Size units use powers of 1000, not 1024.
pub const SIZE_UNIT_BASE: f64 = 1000.0;
pub const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// A change counts only when the file shrinks by strictly more than this.
pub const SIGNIFICANT_REDUCTION_PERCENT: u64 = 1;

pub const STAGING_DIR_PREFIX: &str = ".img-sweep-";

pub const JPEG_QUALITY: u8 = 80;
pub const AVIF_QUALITY: u8 = 70;
pub const AVIF_SPEED: u8 = 6;

pub const OXIPNG_PRESET: u8 = 4;
pub const LIBDEFLATER_LEVEL: u8 = 12;

pub const SVG_MAX_PASSES: usize = 10;

pub const COMMIT_MESSAGE: &str = "Optimized images";
pub const BOT_NAME: &str = "github-actions[bot]";
pub const BOT_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

pub const PROGRESS_BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Action inputs as exposed to the process environment.
pub mod keys {
    pub const COMPRESS_SVG: &str = "INPUT_COMPRESS-SVG";
    pub const COMPRESS_PNG: &str = "INPUT_COMPRESS-PNG";
    pub const COMPRESS_JPG: &str = "INPUT_COMPRESS-JPG";
    pub const COMPRESS_GIF: &str = "INPUT_COMPRESS-GIF";
    pub const COMPRESS_WEBP: &str = "INPUT_COMPRESS-WEBP";
    pub const COMPRESS_AVIF: &str = "INPUT_COMPRESS-AVIF";
    pub const EXPORT_WEBP: &str = "INPUT_EXPORT-WEBP";
    pub const EXPORT_AVIF: &str = "INPUT_EXPORT-AVIF";
    pub const REPLACE_ORIGINAL_AFTER_EXPORT_WEBP: &str = "INPUT_REPLACE-ORIGINAL-AFTER-EXPORT-WEBP";
    pub const IGNORE_PATHS: &str = "INPUT_IGNORE-PATHS";
    pub const DEBUG: &str = "INPUT_DEBUG";
    pub const GITHUB_TOKEN: &str = "INPUT_GITHUB-TOKEN";

    pub const EVENT_NAME: &str = "GITHUB_EVENT_NAME";
    pub const HEAD_REF: &str = "GITHUB_HEAD_REF";
    pub const REF: &str = "GITHUB_REF";
    pub const SERVER_URL: &str = "GITHUB_SERVER_URL";
    pub const REPOSITORY: &str = "GITHUB_REPOSITORY";
    pub const RUN_ID: &str = "GITHUB_RUN_ID";
    pub const OUTPUT: &str = "GITHUB_OUTPUT";
}
