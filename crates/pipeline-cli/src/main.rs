//! Video Pipeline CLI - assemble and inspect registered inference pipelines

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use video_pipeline_common::{DatasetMetadata, VideoItemMetadata};
use video_pipeline_core::PipelineRegistry;
use video_pipeline_faster_rcnn as faster_rcnn;

#[derive(Parser)]
#[command(
    name = "video-pipeline",
    version,
    about = "Assemble and inspect video-analytics inference pipelines",
    after_help = "EXAMPLES:\n  \
                  # List registered pipelines\n  \
                  video-pipeline pipelines\n\n  \
                  # Assemble against a dataset manifest and print the summary\n  \
                  video-pipeline describe faster_rcnn_proposals --dataset traffic.yaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered pipelines
    Pipelines,

    /// Assemble a pipeline against a dataset manifest and print a summary
    Describe {
        /// Registered pipeline name
        name: String,

        /// Dataset manifest (YAML: name, columns, items)
        #[arg(long)]
        dataset: PathBuf,
    },
}

/// Dataset manifest consumed by `describe`.
#[derive(Debug, Deserialize)]
struct DatasetManifest {
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    items: Vec<VideoItemMetadata>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting global tracing subscriber")?;

    let mut registry = PipelineRegistry::new();
    faster_rcnn::register(&mut registry);

    match cli.command {
        Commands::Pipelines => {
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Describe { name, dataset } => describe(&registry, &name, &dataset),
    }
}

fn describe(registry: &PipelineRegistry, name: &str, manifest_path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("reading dataset manifest {}", manifest_path.display()))?;
    let manifest: DatasetManifest = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing dataset manifest {}", manifest_path.display()))?;

    let dataset = DatasetMetadata::new(manifest.name, manifest.columns);
    let description = registry.assemble(name, &dataset, &manifest.items)?;

    let stages: Vec<serde_json::Value> = description
        .stage_factories
        .iter()
        .map(|factory| {
            serde_json::json!({
                "stage": factory.name(),
                "kind": factory.kind(),
                "device": factory.device(),
            })
        })
        .collect();

    let summary = serde_json::json!({
        "pipeline": name,
        "input_columns": description.input_columns,
        "sampling": description.sampling,
        "stages": stages,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
