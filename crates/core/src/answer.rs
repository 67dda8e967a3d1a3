//! Per-question outcomes and the assembled pipeline result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::SourceDescriptor;

/// The outcome for one question, before assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer_text: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl AnswerRecord {
    pub fn answered(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer_text: answer.into(),
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failed(question: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer_text: String::new(),
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }

    /// The string placed in the caller-facing `answers` list.
    pub fn display_text(&self) -> String {
        match (&self.succeeded, &self.error_detail) {
            (false, Some(detail)) => format!("Error: {detail}"),
            _ => self.answer_text.clone(),
        }
    }
}

/// Which model produced the answers, and how much text it saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier as configured.
    pub llm: String,
    /// Character count of the extracted text before truncation.
    pub text_length: usize,
    /// Character count actually placed in each prompt.
    pub budgeted_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(flatten)]
    pub source: SourceDescriptor,
    pub request_id: String,
    pub total_questions: usize,
    #[serde(default)]
    pub failed_questions: usize,
    /// Size in bytes of the acquired document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
    pub processing_timestamp: DateTime<Utc>,
    pub model_info: ModelInfo,
}

/// The result of one pipeline run. Built once, returned, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// One entry per question, in question order.
    pub answers: Vec<String>,
    /// The records the answers were derived from, same order.
    pub records: Vec<AnswerRecord>,
    pub metadata: ResultMetadata,
}

impl PipelineResult {
    pub fn all_succeeded(&self) -> bool {
        self.records.iter().all(|r| r.succeeded)
    }
}
