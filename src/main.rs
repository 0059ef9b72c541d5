//! OCR Extractor command line
//!
//! Extracts text from images and writes it to a Word document.
//!
//! ```text
//! ocr-extractor <output.docx> <image>...
//! ```
//!
//! The batch summary is printed to stdout as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context};
use tokio::{signal, sync::watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocr_extractor::{ExtractionPipeline, ImageInput, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ocr_extractor=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let output = match args.next() {
        Some(path) => PathBuf::from(path),
        None => bail!("usage: ocr-extractor <output.docx> <image>..."),
    };
    let image_paths: Vec<PathBuf> = args.map(PathBuf::from).collect();
    if image_paths.is_empty() {
        bail!("no input images given");
    }

    let mut config = PipelineConfig::from_env().context("invalid configuration")?;
    config.document.generated_at = Some(chrono::Utc::now());

    tracing::info!("Starting OCR Extractor v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("OCR provider: {:?}", config.ocr.provider);

    let mut images = Vec::with_capacity(image_paths.len());
    for path in &image_paths {
        let image = ImageInput::from_path(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        images.push(image);
    }

    let pipeline = ExtractionPipeline::from_config(&config)?;
    pipeline
        .initialize()
        .await
        .context("failed to initialize OCR engine")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, cancelling batch...");
            let _ = cancel_tx.send(true);
        }
    });

    let batch = pipeline.run_batch_with_cancel(images, cancel_rx).await?;
    let document = pipeline.serialize(&batch)?;
    pipeline.shutdown();

    tokio::fs::write(&output, document.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!("Wrote {} ({} bytes)", output.display(), document.len());

    let summary = batch.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !summary.is_complete() {
        tracing::warn!("{} image(s) could not be recognized", summary.failed.len());
    }

    Ok(())
}
