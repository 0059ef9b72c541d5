//! Extraction pipeline
//!
//! Validates a batch of uploaded images, recognizes each one through the
//! shared OCR handle and renders the results into a Word document.
//!
//! Error policy:
//! - unsupported or undecodable uploads abort the batch before any OCR call
//! - OCR failures are recorded on the affected result and the batch goes on
//! - document serialization failures are terminal

use std::sync::Arc;

use futures::StreamExt;
use image::DynamicImage;
use tokio::sync::watch;

use super::types::{
    ExportedDocument, ExtractionBatch, ExtractionOutcome, ExtractionResult, NO_TEXT_PLACEHOLDER,
};
use crate::config::PipelineConfig;
use crate::docx::{DocumentOptions, DocumentWriter, DocxWriter, Section};
use crate::error::{PipelineError, Result};
use crate::input::{decode_batch, decode_owned, ImageInput};
use crate::ocr::{OcrError, OcrHandle};

/// Default number of images recognized at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Batch OCR pipeline
pub struct ExtractionPipeline {
    ocr: Arc<OcrHandle>,
    writer: Arc<dyn DocumentWriter>,
    number_headings: bool,
    max_concurrency: usize,
}

impl ExtractionPipeline {
    /// Create a pipeline around an OCR handle, writing default `.docx` output
    pub fn new(ocr: Arc<OcrHandle>) -> Self {
        Self {
            ocr,
            writer: Arc::new(DocxWriter::default()),
            number_headings: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Create a pipeline with the engine and document options from configuration
    pub fn from_config(config: &PipelineConfig) -> std::result::Result<Self, OcrError> {
        let ocr = Arc::new(OcrHandle::from_config(&config.ocr)?);
        Ok(Self::new(ocr)
            .with_document_options(config.document.clone())
            .with_max_concurrency(config.max_concurrency))
    }

    /// Replace the document writer
    pub fn with_writer(mut self, writer: Arc<dyn DocumentWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Use a `.docx` writer with the given options
    pub fn with_document_options(mut self, options: DocumentOptions) -> Self {
        self.number_headings = options.number_headings;
        self.writer = Arc::new(DocxWriter::new(options));
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn ocr(&self) -> &Arc<OcrHandle> {
        &self.ocr
    }

    /// Initialize the OCR handle
    pub async fn initialize(&self) -> std::result::Result<(), OcrError> {
        self.ocr.initialize().await
    }

    /// Shut the OCR handle down
    pub fn shutdown(&self) {
        self.ocr.shutdown();
    }

    /// Check that every image is a supported, decodable raster
    ///
    /// Returns the inputs unchanged on success.
    pub async fn validate_inputs(&self, images: Vec<ImageInput>) -> Result<Vec<ImageInput>> {
        let decoded = decode_batch(images).await?;
        Ok(decoded.into_iter().map(|(input, _)| input).collect())
    }

    /// Recognize the text of a single image
    ///
    /// Never fails: decode and OCR problems become a failed result.
    pub async fn extract_text(&self, image: ImageInput) -> ExtractionResult {
        let (input, decoded) = decode_owned(image, 0).await;
        match decoded {
            Ok(raster) => self.recognize_decoded(0, input.display_name, raster).await,
            Err(e) => {
                let reason = match e {
                    PipelineError::CorruptImage { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::warn!("Could not decode {}: {}", input.display_name, reason);
                ExtractionResult::failed(input.display_name, reason)
            }
        }
    }

    /// Validate and recognize a batch, preserving input order
    pub async fn run_batch(&self, images: Vec<ImageInput>) -> Result<ExtractionBatch> {
        let total = images.len();
        tracing::info!(
            "Starting OCR batch: {} images, concurrency {}",
            total,
            self.max_concurrency
        );

        let decoded = decode_batch(images).await?;

        // `buffered` yields in submission order regardless of completion order
        let results: Vec<ExtractionResult> = futures::stream::iter(decoded.into_iter().enumerate())
            .map(|(index, (input, raster))| self.recognize_decoded(index, input.display_name, raster))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let batch = ExtractionBatch::new(results);
        let summary = batch.summary();
        tracing::info!(
            "OCR batch finished: {} images, {} recognized, {} empty, {} failed",
            summary.total,
            summary.recognized,
            summary.empty,
            summary.failed.len()
        );
        Ok(batch)
    }

    /// Like `run_batch`, aborting when `cancel` turns true
    ///
    /// A cancelled run produces no batch; in-flight recognitions are dropped.
    pub async fn run_batch_with_cancel(
        &self,
        images: Vec<ImageInput>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<ExtractionBatch> {
        if *cancel.borrow_and_update() {
            return Err(PipelineError::Cancelled);
        }

        tokio::select! {
            result = self.run_batch(images) => result,
            _ = cancelled(&mut cancel) => {
                tracing::warn!("OCR batch cancelled");
                Err(PipelineError::Cancelled)
            }
        }
    }

    /// Build the document sections for a batch
    pub fn sections(&self, batch: &ExtractionBatch) -> Vec<Section> {
        batch
            .iter()
            .enumerate()
            .map(|(idx, result)| {
                let heading = if self.number_headings {
                    format!("Image {}: {}", idx + 1, result.display_name)
                } else {
                    result.display_name.clone()
                };

                match &result.outcome {
                    ExtractionOutcome::Recognized(lines) if lines.is_empty() => {
                        Section::new(heading, Vec::new()).with_note(NO_TEXT_PLACEHOLDER)
                    }
                    ExtractionOutcome::Recognized(lines) => Section::new(heading, lines.clone()),
                    ExtractionOutcome::Failed(reason) => Section::new(heading, Vec::new())
                        .with_note(format!("OCR failed: {}", reason)),
                }
            })
            .collect()
    }

    /// Render a batch into a document
    pub fn serialize(&self, batch: &ExtractionBatch) -> Result<ExportedDocument> {
        let sections = self.sections(batch);
        let bytes = self.writer.build_document(&sections).map_err(|e| {
            tracing::error!("Document serialization failed: {}", e);
            PipelineError::from(e)
        })?;
        Ok(ExportedDocument::new(bytes))
    }

    /// Run a batch and serialize it in one go
    pub async fn export(
        &self,
        images: Vec<ImageInput>,
    ) -> Result<(ExtractionBatch, ExportedDocument)> {
        let batch = self.run_batch(images).await?;
        let document = self.serialize(&batch)?;
        Ok((batch, document))
    }

    async fn recognize_decoded(
        &self,
        index: usize,
        display_name: String,
        raster: DynamicImage,
    ) -> ExtractionResult {
        tracing::debug!("Recognizing image {} ({})", index, display_name);

        match self.ocr.recognize(&raster).await {
            Ok(lines) => {
                tracing::debug!("Image {} ({}): {} lines", index, display_name, lines.len());
                ExtractionResult::recognized(display_name, lines)
            }
            Err(e) => {
                tracing::warn!("OCR failed for image {} ({}): {}", index, display_name, e);
                ExtractionResult::failed(display_name, e.to_string())
            }
        }
    }
}

/// Resolves once the flag is set; never resolves if the sender goes away
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
