//! OCR Providers
//!
//! Defines the engine trait and implementations for different OCR backends.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use image::DynamicImage;
use tempfile::TempDir;

use super::types::{split_lines, OcrError, OcrProvider};

/// OCR engine trait
///
/// `recognize` returns the recognized lines in reading order. An image with
/// no text yields an empty vector, not an error.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> OcrProvider;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Whether concurrent `recognize` calls are safe
    fn is_reentrant(&self) -> bool {
        true
    }

    /// Perform OCR on a decoded image
    async fn recognize(
        &self,
        image: &DynamicImage,
        language: Option<&str>,
    ) -> Result<Vec<String>, OcrError>;
}

/// Encode a raster as PNG for engines that take encoded input
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| OcrError::ImageEncoding(e.to_string()))?;
    Ok(buffer)
}

/// Tesseract OCR provider
///
/// Shells out to the `tesseract` binary. Each call works in its own
/// temporary directory, so calls may overlap freely. The directory and the
/// child process go away when the call completes or is dropped.
pub struct TesseractProvider {
    /// Path or name of the tesseract binary
    binary: String,
    /// Default language
    default_language: String,
    /// Parent of the per-call work directories (system temp dir if unset)
    work_dir: Option<PathBuf>,
}

impl TesseractProvider {
    pub fn new(binary: &str, default_language: &str) -> Self {
        Self {
            binary: binary.to_string(),
            default_language: default_language.to_string(),
            work_dir: None,
        }
    }

    /// Create per-call work directories under `dir`
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    fn call_dir(&self) -> Result<TempDir, OcrError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ocr_");
        let dir = match &self.work_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.map_err(|e| OcrError::ProcessingError(format!("Failed to create temp dir: {}", e)))
    }
}

impl Default for TesseractProvider {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

#[async_trait]
impl OcrEngine for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        tokio::process::Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn recognize(
        &self,
        image: &DynamicImage,
        language: Option<&str>,
    ) -> Result<Vec<String>, OcrError> {
        let lang = language.unwrap_or(&self.default_language);
        let png = encode_png(image)?;

        // Removed on drop, including when this future is cancelled
        let call_dir = self.call_dir()?;
        let input_path = call_dir.path().join("input.png");
        let output_base = call_dir.path().join("output");
        let output_file = call_dir.path().join("output.txt");

        tokio::fs::write(&input_path, &png)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

        let output = tokio::process::Command::new(&self.binary)
            .arg(&input_path)
            .arg(&output_base)
            .arg("-l")
            .arg(lang)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = tokio::fs::read_to_string(&output_file)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to read output: {}", e)))?;

        Ok(split_lines(&text))
    }
}

/// Ollama vision model provider
pub struct OllamaProvider {
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn default_url() -> Self {
        Self::new("http://localhost:11434", "llava")
    }

    fn prompt(language: Option<&str>) -> String {
        let lang_hint = language
            .map(|l| format!(" The text is in {}.", l))
            .unwrap_or_default();

        format!(
            "Extract all text from this image exactly as written, one line per line of text.{} \
             Return only the extracted text, nothing else. If there is no text, return nothing.",
            lang_hint
        )
    }
}

#[async_trait]
impl OcrEngine for OllamaProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn recognize(
        &self,
        image: &DynamicImage,
        language: Option<&str>,
    ) -> Result<Vec<String>, OcrError> {
        use base64::Engine;

        let url = format!("{}/api/generate", self.base_url);
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(encode_png(image)?);

        let request = serde_json::json!({
            "model": self.model,
            "prompt": Self::prompt(language),
            "images": [image_base64],
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = result["response"]
            .as_str()
            .ok_or_else(|| OcrError::ApiError("Response has no text field".to_string()))?;

        Ok(split_lines(text))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Mock engine keyed on image width
    ///
    /// Test images are synthesized with distinct widths so the engine can
    /// tell them apart without real recognition.
    pub struct MockEngine {
        pub responses: HashMap<u32, Result<Vec<String>, OcrError>>,
        pub available: bool,
        pub reentrant: bool,
        /// Per-width artificial latency
        pub delays: HashMap<u32, Duration>,
        pub calls: AtomicUsize,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self {
                responses: HashMap::new(),
                available: true,
                reentrant: true,
                delays: HashMap::new(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn with_lines(mut self, width: u32, lines: &[&str]) -> Self {
            self.responses
                .insert(width, Ok(lines.iter().map(|l| l.to_string()).collect()));
            self
        }

        pub fn with_failure(mut self, width: u32, message: &str) -> Self {
            self.responses
                .insert(width, Err(OcrError::ProcessingError(message.to_string())));
            self
        }

        pub fn with_delay(mut self, width: u32, delay: Duration) -> Self {
            self.delays.insert(width, delay);
            self
        }

        pub fn non_reentrant(mut self) -> Self {
            self.reentrant = false;
            self
        }

        pub fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OcrEngine for MockEngine {
        fn provider_type(&self) -> OcrProvider {
            OcrProvider::Custom
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        fn is_reentrant(&self) -> bool {
            self.reentrant
        }

        async fn recognize(
            &self,
            image: &DynamicImage,
            _language: Option<&str>,
        ) -> Result<Vec<String>, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delays.get(&image.width()) {
                tokio::time::sleep(*delay).await;
            } else {
                tokio::task::yield_now().await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.responses
                .get(&image.width())
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}
