use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use aipack::ignore::parse_exclude_patterns;
use aipack::logging::init_logging;
use aipack::{pack, MediaTypeOverrides, PackMode, PackOptions, SpecKind};

/// Package an AI model source into a content-addressable OCI artifact layout.
#[derive(Parser)]
#[command(name = "aipack", version, about)]
struct Cli {
    /// Source reference: local path, file://, http(s)://, hf://org/repo,
    /// or huggingface://org/repo[@revision]/path
    source: String,

    /// Output directory for the OCI layout
    #[arg(short, long)]
    output: PathBuf,

    /// Layer packaging mode: raw, tar, tar+gzip, or tar+zstd
    #[arg(long, default_value = "raw")]
    mode: String,

    /// Artifact spec: modelpack or generic
    #[arg(long, default_value = "modelpack")]
    spec: String,

    /// Human-friendly name used for the index title and ref annotations
    #[arg(long)]
    name: Option<String>,

    /// Override the manifest artifactType
    #[arg(long)]
    artifact_type: Option<String>,

    /// Override the manifest config media type
    #[arg(long)]
    mt_manifest_config: Option<String>,

    /// Override the weights layer media type
    #[arg(long)]
    mt_weights: Option<String>,

    /// Override the config layer media type
    #[arg(long)]
    mt_config: Option<String>,

    /// Override the docs layer media type
    #[arg(long)]
    mt_docs: Option<String>,

    /// Glob patterns to exclude, quoted and space-separated
    /// (e.g. --exclude "'original/*' '*.bin'")
    #[arg(long)]
    exclude: Option<String>,

    /// Token for huggingface:// downloads
    #[arg(long, env = "HUGGING_FACE_HUB_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.json_logs) {
        eprintln!("failed to initialize logging: {e}");
    }

    let mode: PackMode = cli.mode.parse()?;
    let spec: SpecKind = cli.spec.parse()?;

    let opts = PackOptions {
        source: cli.source,
        output_dir: cli.output,
        mode,
        spec,
        name: cli.name,
        artifact_type: cli.artifact_type,
        media_types: MediaTypeOverrides {
            manifest_config: cli.mt_manifest_config,
            weights: cli.mt_weights,
            config: cli.mt_config,
            docs: cli.mt_docs,
        },
        hf_token: cli.hf_token,
        exclude: cli
            .exclude
            .as_deref()
            .map(parse_exclude_patterns)
            .unwrap_or_default(),
    };

    let summary = pack(&opts)?;

    println!("✅ OCI layout written to: {}", summary.layout_path.display());
    println!(
        "   manifest {} ({} layers, {} blob bytes)",
        summary.manifest_digest, summary.layer_count, summary.blob_bytes
    );
    Ok(())
}
