//! Command-line entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lessonboard_app::{
    AppConfig, BoardSession, ExportOverrides, export_session, output_path, session_bounds,
};
use lessonboard_core::shapes::SerializableColor;
use lessonboard_render::{ExportFormat, ExportScope};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export Lessonboard whiteboards to images")]
struct Cli {
    /// JSON configuration file (engine, export defaults, viewport size)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterize a saved board session
    Export {
        /// Session file to export
        session: PathBuf,
        /// Write the image here instead of printing base64 to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Export every stroke and card instead of the visible viewport
        #[arg(long)]
        full: bool,
        /// Image format: png or jpeg
        #[arg(long)]
        format: Option<ExportFormat>,
        /// JPEG quality (1-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
        /// Output pixel density
        #[arg(long)]
        multiplier: Option<f64>,
        /// Solid background color, e.g. "#ffffff"
        #[arg(long, value_parser = parse_color)]
        background: Option<SerializableColor>,
        /// Largest image edge in pixels; bigger exports fail
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_dimension: Option<u32>,
        /// Print a data: URL instead of bare base64
        #[arg(long)]
        data_url: bool,
    },
    /// Print the padded content bounds of a saved board session as JSON
    Bounds {
        /// Session file to measure
        session: PathBuf,
    },
}

fn parse_color(value: &str) -> Result<SerializableColor, String> {
    SerializableColor::from_hex(value).ok_or_else(|| format!("invalid color '{value}'"))
}

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Starting Lessonboard {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Export {
            session,
            output,
            full,
            format,
            quality,
            multiplier,
            background,
            max_dimension,
            data_url,
        } => {
            let overrides = ExportOverrides {
                scope: full.then_some(ExportScope::FullContent),
                format,
                quality,
                multiplier,
                background,
                max_dimension,
            };
            let request = overrides.apply(&config.export);
            let exported = export_session(&config, BoardSession::load(&session)?, &request)?;

            match output {
                Some(path) => {
                    let path = output_path(&path, exported.bitmap.format);
                    std::fs::write(&path, &exported.bitmap.bytes)
                        .with_context(|| format!("write image {}", path.display()))?;
                    log::info!(
                        "Wrote {}x{} image to {}",
                        exported.bitmap.width,
                        exported.bitmap.height,
                        path.display()
                    );
                }
                None if data_url => println!("{}", exported.data_url()),
                None => println!("{}", exported.base64()),
            }
        }
        Command::Bounds { session } => {
            let bounds = session_bounds(&config, BoardSession::load(&session)?)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&bounds).context("serialize bounds")?
            );
        }
    }

    Ok(())
}
