//! `neural-style` CLI - Repaint an image in the style of an artwork.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neural_style::model::download::fetch_artifact;
use neural_style::{codec, Config, StyleId, StyleTransfer};

/// Apply a pretrained fast neural style to an image.
#[derive(Parser, Debug)]
#[command(name = "neural-style")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path.
    #[arg(value_name = "INPUT", required_unless_present = "list_styles")]
    input: Option<PathBuf>,

    /// Output image path (224x224).
    #[arg(value_name = "OUTPUT", required_unless_present = "list_styles")]
    output: Option<PathBuf>,

    /// Style to apply.
    #[arg(short, long, default_value = "mosaic", value_parser = parse_style)]
    style: StyleId,

    /// Directory holding the `<style>-9.onnx` models.
    #[arg(long, value_name = "DIR")]
    models_dir: Option<PathBuf>,

    /// Download the model first if it is missing.
    #[arg(long)]
    fetch: bool,

    /// Intra-op thread count for ONNX Runtime.
    #[arg(long, value_name = "INT")]
    threads: Option<usize>,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Print the available styles and exit.
    #[arg(long)]
    list_styles: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_style(s: &str) -> std::result::Result<StyleId, String> {
    s.parse().map_err(|err: neural_style::Error| err.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("neural_style={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if args.list_styles {
        for style in StyleId::ALL {
            println!("{:<14} {}", style.name(), style.label());
        }
        return ExitCode::SUCCESS;
    }

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        anyhow::bail!("INPUT and OUTPUT are required");
    };

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let defaults = Config::default();
    let config = Config {
        models_dir: args.models_dir.clone().unwrap_or(defaults.models_dir),
        intra_threads: args.threads,
        output_quality: args.quality,
        ..defaults
    };
    config.validate().context("Invalid configuration")?;

    // Blocking download, before the runtime exists
    if args.fetch {
        fetch_artifact(args.style, &config.models_dir).context("Failed to fetch model")?;
    }

    let image = codec::load_image(input).context("Failed to load input image")?;
    let pipeline = StyleTransfer::from_config(&config).context("Failed to initialize pipeline")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let outcome = runtime
        .block_on(pipeline.transfer_style(image, args.style))
        .context("Failed to apply style")?;

    codec::save_image(&outcome.image, output, config.output_quality)
        .context("Failed to save output image")?;

    println!(
        "Applied {} to {} -> {} ({}x{}) in {:.3}s",
        args.style.label(),
        input.display(),
        output.display(),
        outcome.width,
        outcome.height,
        outcome.inference_time.as_secs_f64()
    );

    Ok(())
}
