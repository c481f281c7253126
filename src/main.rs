use anyhow::{Context, Result};
use clap::Parser;
use img_sweep::action::{run_action, ActionContext};
use img_sweep::classify::{discover_files, IgnoreSet};
use img_sweep::cli::{Args, Commands};
use img_sweep::codec::NativeCodec;
use img_sweep::config::{EnvSource, Settings};
use img_sweep::formats::ImageFormat;
use img_sweep::github::{full_report_url, GhCli, GitCli};
use img_sweep::logger;
use img_sweep::pipeline::Pipeline;
use img_sweep::report::generate_report;
use img_sweep::utils::format_size;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_source(&EnvSource);
    logger::init(args.debug || settings.debug);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match args.command {
        Commands::Action { root } => runtime.block_on(action(root)),
        Commands::Optimize {
            files,
            root,
            markdown,
        } => runtime.block_on(optimize(settings, root, files, markdown)),
        Commands::Plan { files, root } => plan(settings, &root, files),
    }
}

async fn action(root: PathBuf) -> Result<()> {
    let context = ActionContext::from_source(&EnvSource).context("Invalid action configuration")?;
    let token = context.settings.token.clone().unwrap_or_default();
    let pipeline = Pipeline::new(
        &root,
        context.settings.policy.clone(),
        Arc::new(NativeCodec),
    );

    let outcome = match run_action(
        &context,
        &pipeline,
        &GitCli::new(&root, token.clone()),
        &GhCli::new(&root, token),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) if e.is_fatal() => {
            return Err(anyhow::Error::new(e).context("Run aborted before optimizing"))
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(report) = outcome.report {
        println!("{}", report.terminal);
    }
    Ok(())
}

async fn optimize(
    settings: Settings,
    root: PathBuf,
    files: Vec<String>,
    markdown: Option<PathBuf>,
) -> Result<()> {
    let files = collect_files(&settings, &root, files)?;
    let pipeline = Pipeline::new(&root, settings.policy, Arc::new(NativeCodec));
    let summary = pipeline.run(&files).await?;

    let url = full_report_url(&EnvSource).unwrap_or_default();
    let Some(report) = generate_report(&summary.results, &url) else {
        info!("No images optimized");
        return Ok(());
    };

    println!("{}", report.terminal);
    if let Some(path) = markdown {
        std::fs::write(&path, &report.markdown)
            .with_context(|| format!("Failed to write markdown report to {:?}", path))?;
    }
    Ok(())
}

fn plan(settings: Settings, root: &Path, files: Vec<String>) -> Result<()> {
    let files = collect_files(&settings, root, files)?;
    let pipeline = Pipeline::new(root, settings.policy, Arc::new(NativeCodec));
    let (classification, staging_plan) = pipeline.plan(&files);

    println!("Candidates:");
    for format in ImageFormat::ALL {
        println!("  {:<5} {}", format.to_string(), classification.count(format));
    }

    println!("Predicted files:");
    for file in &staging_plan.files {
        let size = std::fs::metadata(root.join(&file.source)).ok().map(|m| m.len());
        println!("  {} ({})", file.source, format_size(size));
        for export in &file.exports {
            println!("    -> {} [{}]", export.file_name, export.rule.target);
        }
    }

    for collision in &staging_plan.collisions {
        if collision.kept == collision.file_name {
            println!(
                "Collision: {} already exists, export from {} skipped",
                collision.file_name, collision.skipped
            );
        } else {
            println!(
                "Collision: {} is claimed by {}, export from {} skipped",
                collision.file_name, collision.kept, collision.skipped
            );
        }
    }
    Ok(())
}

fn collect_files(settings: &Settings, root: &Path, files: Vec<String>) -> Result<Vec<String>> {
    let ignore = IgnoreSet::new(&settings.policy.ignore_paths);
    if files.is_empty() {
        return discover_files(root, &ignore)
            .with_context(|| format!("Failed to scan {:?}", root));
    }
    Ok(ignore.filter(files))
}
