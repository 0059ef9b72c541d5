//! OCR engine handle
//!
//! Owns one engine for the lifetime of the process and enforces its
//! lifecycle and concurrency contract.
//!
//! # Design
//!
//! ```text
//!  Uninitialized ──initialize()──▶ Ready ──shutdown()──▶ ShutDown
//!                                   │
//!                              recognize()
//!                                   │
//!                    [gate: only for non-reentrant engines]
//!                                   │
//!                         [timeout per recognize call]
//! ```
//!
//! The handle is shared through `Arc` by every concurrent extraction. An
//! engine that reports itself as non-reentrant sees at most one call at a
//! time; reentrant engines are called without any locking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::provider::{OcrEngine, OllamaProvider, TesseractProvider};
use super::types::{OcrError, OcrProvider};
use crate::config::OcrConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Uninitialized,
    Ready,
    ShutDown,
}

/// Handle statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    /// Calls currently inside the engine
    pub active: usize,
    /// Calls that returned lines
    pub succeeded: usize,
    /// Calls that returned an error or timed out
    pub failed: usize,
}

/// Shared, lifecycle-managed OCR engine
pub struct OcrHandle {
    engine: Arc<dyn OcrEngine>,
    state: RwLock<HandleState>,
    /// Serializes calls into non-reentrant engines
    gate: Option<Mutex<()>>,
    language: Option<String>,
    timeout: Option<Duration>,
    active: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl OcrHandle {
    /// Wrap an engine; the handle starts uninitialized
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        let gate = if engine.is_reentrant() {
            None
        } else {
            Some(Mutex::new(()))
        };

        Self {
            engine,
            state: RwLock::new(HandleState::Uninitialized),
            gate,
            language: None,
            timeout: None,
            active: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Build the engine selected by configuration
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let engine: Arc<dyn OcrEngine> = match config.provider {
            OcrProvider::Tesseract => Arc::new(TesseractProvider::new(
                &config.tesseract_binary,
                &config.language,
            )),
            OcrProvider::Ollama => Arc::new(OllamaProvider::new(
                &config.ollama_url,
                &config.ollama_model,
            )),
            OcrProvider::Custom => {
                return Err(OcrError::ProviderNotAvailable(
                    "custom engines must be passed to OcrHandle::new".to_string(),
                ))
            }
        };

        let handle = Self::new(engine).with_language(&config.language);
        Ok(match config.timeout_secs {
            0 => handle,
            secs => handle.with_timeout(Duration::from_secs(secs)),
        })
    }

    /// Language hint passed to every call
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    /// Per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn provider_type(&self) -> OcrProvider {
        self.engine.provider_type()
    }

    pub fn state(&self) -> HandleState {
        *self.state.read()
    }

    /// Make the engine ready for use
    ///
    /// Idempotent while ready. Fails if the engine is unavailable or the
    /// handle was already shut down.
    pub async fn initialize(&self) -> Result<(), OcrError> {
        match self.state() {
            HandleState::Ready => return Ok(()),
            HandleState::ShutDown => return Err(OcrError::ShutDown),
            HandleState::Uninitialized => {}
        }

        if !self.engine.is_available().await {
            return Err(OcrError::ProviderNotAvailable(format!(
                "{:?} provider is not available",
                self.engine.provider_type()
            )));
        }

        let mut state = self.state.write();
        if *state == HandleState::ShutDown {
            return Err(OcrError::ShutDown);
        }
        *state = HandleState::Ready;
        tracing::info!("OCR engine {:?} initialized", self.engine.provider_type());
        Ok(())
    }

    /// Stop accepting new calls
    ///
    /// Calls already inside the engine run to completion.
    pub fn shutdown(&self) {
        let mut state = self.state.write();
        if *state != HandleState::ShutDown {
            *state = HandleState::ShutDown;
            tracing::info!("OCR engine {:?} shut down", self.engine.provider_type());
        }
    }

    /// Recognize the lines of text in an image
    pub async fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
        match self.state() {
            HandleState::Ready => {}
            HandleState::Uninitialized => return Err(OcrError::NotInitialized),
            HandleState::ShutDown => return Err(OcrError::ShutDown),
        }

        let _guard = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let active = ActiveCall::enter(&self.active);
        let call = self.engine.recognize(image, self.language.as_deref());
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(OcrError::Timeout(limit)),
            },
            None => call.await,
        };
        drop(active);

        match &result {
            Ok(_) => self.succeeded.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.failed.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    pub fn stats(&self) -> HandleStats {
        HandleStats {
            active: self.active.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Counts a call as active until dropped, even if the caller abandons it
struct ActiveCall<'a>(&'a AtomicUsize);

impl<'a> ActiveCall<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
