///
/// This module implements the CLI interface for cdn-catalog: command parsing,
/// argument validation and the programmatic entrypoint used by `main` and tests.
///
/// All pipeline logic (download, streaming transform, versioning) lives in the
/// [`cdn-catalog-core`] crate; this module only wires configuration into it.
///
/// ## How To Use
/// - Command line: `cdn-catalog build --config catalog.yaml`
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`cdn-catalog-core`]: ../../cdn-catalog-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use cdn_catalog_core::catalog::{write_catalog, write_catalog_to};
use cdn_catalog_core::download::HttpFetcher;
use cdn_catalog_core::pipeline::{build_catalog, BuildOutcome};
use cdn_catalog_core::transform::{transform_file, TransformOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for cdn-catalog: build compact, build-numbered package catalogs.
#[derive(Parser)]
#[clap(
    name = "cdn-catalog",
    version,
    about = "Reduce a remote package metadata feed into a compact, versioned catalog"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the upstream feed (if changed) and publish the next catalog build
    Build {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Transform a local copy of the feed without touching build state
    Transform {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Raw upstream document to read
        #[clap(long)]
        input: PathBuf,
        /// Where to write the catalog (stdout when omitted)
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Build { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "build", "Starting catalog build");
            let fetcher = HttpFetcher::new();
            match build_catalog(&config, &fetcher).await {
                Ok(BuildOutcome::Built(report)) => {
                    tracing::info!(command = "build", ?report, "Catalog build complete");
                    println!(
                        "Build {} written to {} ({} libraries, {:.2} KB)",
                        report.build,
                        report.catalog_path.display(),
                        report.records,
                        report.bytes as f64 / 1024.0
                    );
                    Ok(())
                }
                Ok(BuildOutcome::Skipped { current_build }) => {
                    tracing::info!(command = "build", current_build, "Upstream unchanged, build skipped");
                    println!("Upstream unchanged, current build is still {current_build}");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "build", error = %e, "Catalog build failed");
                    Err(anyhow::Error::new(e).context("Catalog build failed"))
                }
            }
        }
        Commands::Transform {
            config,
            input,
            output,
        } => {
            let config = load_config(config)?;
            let catalog = transform_file(&input, &TransformOptions::from(&config))
                .with_context(|| format!("Failed to transform {:?}", input))?;
            match output {
                Some(path) => {
                    let bytes = write_catalog(&path, &catalog)
                        .with_context(|| format!("Failed to write catalog to {:?}", path))?;
                    tracing::info!(command = "transform", path = %path.display(), bytes, "Catalog written");
                }
                None => write_catalog_to(std::io::stdout().lock(), &catalog)
                    .context("Failed to write catalog to stdout")?,
            }
            Ok(())
        }
    }
}
