use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use appcaster::{AppcastUpdater, ReleaseInput};

#[derive(Parser, Debug)]
#[command(name = "appcaster", about = "Update a Sparkle appcast XML with a new release")]
struct Args {
    /// Application name
    #[arg(long)]
    name: String,

    /// Version number (e.g., 1.0)
    #[arg(long)]
    version: String,

    /// File size in bytes
    #[arg(long)]
    size: String,

    /// Path to DMG file
    #[arg(long)]
    dmg: PathBuf,

    /// Sparkle EdDSA signature
    #[arg(long)]
    signature: String,

    /// Release notes in HTML format
    #[arg(long)]
    notes: String,

    /// Output appcast.xml path
    #[arg(long, default_value = "appcast.xml")]
    output: PathBuf,

    /// Base URL for downloads
    #[arg(long)]
    base_url: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let release = ReleaseInput {
        name: args.name,
        version: args.version,
        artifact_path: args.dmg,
        release_notes: args.notes,
        file_size: args.size,
        signature: args.signature,
    };

    let updater = AppcastUpdater::new(args.output, &args.base_url);
    updater
        .add_release(&release)
        .with_context(|| format!("failed to update appcast for {}", release.name))?;

    tracing::info!(app = %release.name, version = %release.version, "appcast update completed");
    Ok(())
}
