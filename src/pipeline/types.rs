//! Extraction result types

use serde::Serialize;

/// Placeholder paragraph for images without recognized text
pub const NO_TEXT_PLACEHOLDER: &str = "No text extracted from this image.";

/// Outcome of recognizing one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum ExtractionOutcome {
    /// Lines in reading order; empty when the image has no text
    Recognized(Vec<String>),
    /// OCR failed for this image; carries the reason
    Failed(String),
}

/// Text recognized in one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub display_name: String,
    pub outcome: ExtractionOutcome,
}

impl ExtractionResult {
    pub fn recognized(display_name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            display_name: display_name.into(),
            outcome: ExtractionOutcome::Recognized(lines),
        }
    }

    pub fn failed(display_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            outcome: ExtractionOutcome::Failed(reason.into()),
        }
    }

    /// Recognized lines; empty for failed images
    pub fn lines(&self) -> &[String] {
        match &self.outcome {
            ExtractionOutcome::Recognized(lines) => lines,
            ExtractionOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Failed(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.outcome {
            ExtractionOutcome::Failed(reason) => Some(reason),
            ExtractionOutcome::Recognized(_) => None,
        }
    }

    /// Recognized successfully but without any text
    pub fn is_empty(&self) -> bool {
        matches!(&self.outcome, ExtractionOutcome::Recognized(lines) if lines.is_empty())
    }

    /// Lines joined with newlines
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn char_count(&self) -> usize {
        self.lines().iter().map(|l| l.chars().count()).sum::<usize>()
            + self.lines().len().saturating_sub(1)
    }

    pub fn word_count(&self) -> usize {
        self.lines().iter().map(|l| l.split_whitespace().count()).sum()
    }
}

/// Failed image in a batch summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImage {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Counts for a finished batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub recognized: usize,
    pub empty: usize,
    pub failed: Vec<FailedImage>,
}

impl BatchSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered results of one pipeline run, one per input image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionBatch {
    results: Vec<ExtractionResult>,
}

impl ExtractionBatch {
    pub fn new(results: Vec<ExtractionResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[ExtractionResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ExtractionResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractionResult> {
        self.results.iter()
    }

    pub fn summary(&self) -> BatchSummary {
        let failed: Vec<FailedImage> = self
            .results
            .iter()
            .enumerate()
            .filter_map(|(index, r)| {
                r.failure().map(|reason| FailedImage {
                    index,
                    name: r.display_name.clone(),
                    reason: reason.to_string(),
                })
            })
            .collect();

        BatchSummary {
            total: self.results.len(),
            recognized: self.results.len() - failed.len(),
            empty: self.results.iter().filter(|r| r.is_empty()).count(),
            failed,
        }
    }
}

/// Serialized `.docx` document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    bytes: Vec<u8>,
}

impl ExportedDocument {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for ExportedDocument {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_stats() {
        let result = ExtractionResult::recognized(
            "page.png",
            vec!["Hello world".to_string(), "again".to_string()],
        );
        assert_eq!(result.text(), "Hello world\nagain");
        assert_eq!(result.char_count(), 17);
        assert_eq!(result.word_count(), 3);
        assert!(!result.is_empty());

        let failed = ExtractionResult::failed("bad.png", "engine crashed");
        assert!(failed.lines().is_empty());
        assert_eq!(failed.char_count(), 0);
        assert!(!failed.is_empty());
    }

    #[test]
    fn test_batch_summary() {
        let batch = ExtractionBatch::new(vec![
            ExtractionResult::recognized("a.png", vec!["Hi".to_string()]),
            ExtractionResult::failed("b.png", "timeout"),
            ExtractionResult::recognized("c.png", vec![]),
        ]);

        let summary = batch.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.recognized, 2);
        assert_eq!(summary.empty, 1);
        assert_eq!(
            summary.failed,
            vec![FailedImage {
                index: 1,
                name: "b.png".to_string(),
                reason: "timeout".to_string()
            }]
        );
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(ExtractionResult::failed("b.png", "timeout")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "displayName": "b.png",
                "outcome": {"status": "failed", "value": "timeout"}
            })
        );
    }
}
