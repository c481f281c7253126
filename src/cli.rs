use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-sweep",
    about = "Optimize repository images and report only the changes that matter",
    long_about = "img-sweep compresses SVG, PNG, JPEG, GIF, WebP and AVIF files in place, \
                  optionally exports WebP/AVIF siblings, and keeps a change only when it \
                  shrinks the file by more than 1%. Options are read from INPUT_* environment \
                  variables, the same way a GitHub Action receives its inputs.",
    version,
    after_help = "EXAMPLES:\n  \
    img-sweep optimize assets/logo.svg assets/hero.png\n  \
    img-sweep optimize --root ./site --markdown report.md\n  \
    img-sweep plan --root ./site\n  \
    INPUT_EXPORT-WEBP=true img-sweep action"
)]
pub struct Args {
    #[arg(
        long,
        global = true,
        help = "Enable debug logging",
        long_help = "Log per-file decisions and sizes. Same as INPUT_DEBUG=true; \
                     RUST_LOG takes precedence over both."
    )]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Run as a CI job",
        long_about = "Classify the GitHub event, optimize the pull request's files (or the whole \
                      repository for dispatch/schedule runs), then commit, push and comment on \
                      pull requests."
    )]
    Action {
        #[arg(long, default_value = ".", help = "Repository root")]
        root: PathBuf,
    },

    #[command(
        about = "Optimize files and write the changes back",
        long_about = "Optimize the given repository-relative files, or every file under the root \
                      when none are given. Significant changes are written back; nothing is \
                      committed."
    )]
    Optimize {
        #[arg(help = "Repository-relative files to optimize (default: whole repository)")]
        files: Vec<String>,

        #[arg(long, default_value = ".", help = "Repository root")]
        root: PathBuf,

        #[arg(
            short = 'm',
            long,
            help = "Write the markdown report to this file",
            long_help = "Write the markdown report, bounded by the PR comment size limit, \
                         to this file."
        )]
        markdown: Option<PathBuf>,
    },

    #[command(
        about = "Show what would be optimized without touching files",
        long_about = "Print the classified candidates and every file the run expects to produce, \
                      including export targets and detected name collisions."
    )]
    Plan {
        #[arg(help = "Repository-relative files to plan (default: whole repository)")]
        files: Vec<String>,

        #[arg(long, default_value = ".", help = "Repository root")]
        root: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_optimize() {
        let args = Args::parse_from([
            "img-sweep",
            "optimize",
            "a.png",
            "b.svg",
            "--root",
            "site",
            "--debug",
        ]);
        assert!(args.debug);
        match args.command {
            Commands::Optimize {
                files,
                root,
                markdown,
            } => {
                assert_eq!(files, vec!["a.png", "b.svg"]);
                assert_eq!(root, PathBuf::from("site"));
                assert!(markdown.is_none());
            }
            _ => panic!("expected optimize"),
        }
    }
}
