use std::path::PathBuf;

use clap::Parser;
use tracing::info;

mod config;
mod error;
mod ingestion;
mod materialize;
mod ollama;
mod pipeline;
mod translation;

use crate::config::StaticConfig;
use crate::error::{PipelineError, format_error_chain};
use crate::ingestion::pdf::PdfiumBackend;
use crate::ollama::OllamaClient;
use crate::pipeline::LocalizationPipeline;
use crate::pipeline::progress::ProgressEvent;

/// Turn a design-export PDF into easy_localization resource files.
#[derive(Parser, Debug)]
#[command(name = "locforge", author, version, about)]
struct Args {
    /// Input PDF
    input: PathBuf,

    /// Output directory for the generated resource files
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("error: {}", format_error_chain(e.as_ref()));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = StaticConfig::load()?;

    info!(
        model = %config.ollama.model,
        backend = %config.ollama.base_url,
        "Starting locforge v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pdf_bytes = std::fs::read(&args.input)?;
    info!(path = %args.input.display(), bytes = pdf_bytes.len(), "PDF read");

    let documents = PdfiumBackend::new().map_err(PipelineError::from)?;
    let translator = OllamaClient::new(config.ollama.clone()).map_err(|e| e.into_fatal())?;

    let pipeline = LocalizationPipeline::new(&documents, &translator, &config.pipeline);

    let mut on_progress = |event: ProgressEvent| {
        info!(percentage = event.percentage, "{}", event.message);
    };
    let files = pipeline.run(pdf_bytes, &mut on_progress).await?;

    let out_dir = args.out_dir.unwrap_or(config.output.lang_dir);
    std::fs::create_dir_all(&out_dir)?;
    for file in &files {
        let path = out_dir.join(file.filename);
        std::fs::write(&path, &file.content)?;
        info!(path = %path.display(), bytes = file.content.len(), "Resource file written");
    }

    info!(files = files.len(), dir = %out_dir.display(), "Localization resources ready");

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format().with_target(false).compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("locforge=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
