//! docgen - fill an ODT template from a JSON values file
//!
//! ```text
//! docgen invoice.odt --values invoice.json --output invoice.odt
//! docgen invoice.odt --values invoice.json --output invoice.pdf --pdf
//! ```
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=docgen=debug`.

use anyhow::Context;
use clap::Parser;
use docgen::{values_from_file, EngineSettings, Template};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Compile an ODT template
#[derive(Parser, Debug)]
#[command(name = "docgen", version, about, long_about = None)]
struct Cli {
    /// Template file (.odt or .ott)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    template: PathBuf,

    /// JSON file with the values to fill in
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    values: PathBuf,

    /// Where to write the result
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    output: PathBuf,

    /// Convert the compiled document to PDF
    #[arg(long)]
    pdf: bool,

    /// Settings file (JSON); defaults apply when it is missing
    #[arg(short, long, default_value = "docgen.json", value_hint = clap::ValueHint::FilePath)]
    settings: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let settings = EngineSettings::load(&cli.settings)
        .with_context(|| format!("Failed to load settings from {}", cli.settings.display()))?;
    let values = values_from_file(&cli.values)
        .with_context(|| format!("Failed to read values from {}", cli.values.display()))?;

    let template = Template::new(settings);
    let compiled = template
        .compile(&cli.template, &values)
        .with_context(|| format!("Failed to compile {}", cli.template.display()))?;

    if cli.pdf {
        template
            .to_pdf(&compiled, &cli.output)
            .context("PDF conversion failed")?;
    } else {
        compiled.save_to(&cli.output)?;
    }

    tracing::info!("Wrote {}", cli.output.display());
    Ok(())
}
