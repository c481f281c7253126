use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GitHub token is required")]
    MissingToken,

    #[error("No branch name found")]
    MissingBranch,

    #[error("No pull request number found in ref: {0}")]
    MissingPullRequest(String),

    #[error("Repository root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Failed to create staging directory in {0}")]
    StagingCreationFailed(PathBuf),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("`{program}` failed: {stderr}")]
    CommandFailed { program: String, stderr: String },
}

impl SweepError {
    /// Configuration and discovery failures abort the run before any file is
    /// touched. Everything else is reported but stays local to its caller.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SweepError::MissingToken
                | SweepError::MissingBranch
                | SweepError::MissingPullRequest(_)
                | SweepError::RootNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;

/// Failure of a single codec invocation. Never escapes the processor.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("SVG is not valid UTF-8")]
    InvalidSvg,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Codec worker failed: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SweepError::MissingToken.is_fatal());
        assert!(SweepError::MissingBranch.is_fatal());
        assert!(SweepError::MissingPullRequest("refs/heads/main".to_string()).is_fatal());
        assert!(!SweepError::CommandFailed {
            program: "git".to_string(),
            stderr: "boom".to_string(),
        }
        .is_fatal());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(SweepError::MissingToken.to_string(), "GitHub token is required");
        assert_eq!(SweepError::MissingBranch.to_string(), "No branch name found");
        let err = CodecError::Unsupported("animated WebP output".to_string());
        assert_eq!(err.to_string(), "Unsupported operation: animated WebP output");
    }
}
