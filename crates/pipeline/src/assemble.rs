//! Result assembly.

use chrono::Utc;
use docqa_core::{AnswerRecord, ModelInfo, PipelineResult, ResultMetadata, SourceDescriptor};

/// Collects what a run learned about its document, then turns the answer
/// records into a [`PipelineResult`].
pub struct ResultAssembler {
    pub request_id: String,
    pub source: SourceDescriptor,
    pub file_size: Option<usize>,
    pub model_info: ModelInfo,
}

impl ResultAssembler {
    /// Records must already be in question order; nothing is reordered,
    /// merged, or dropped.
    pub fn finish(self, records: Vec<AnswerRecord>) -> PipelineResult {
        let answers = records.iter().map(AnswerRecord::display_text).collect();
        let failed_questions = records.iter().filter(|r| !r.succeeded).count();

        PipelineResult {
            answers,
            metadata: ResultMetadata {
                source: self.source,
                request_id: self.request_id,
                total_questions: records.len(),
                failed_questions,
                file_size: self.file_size,
                processing_timestamp: Utc::now(),
                model_info: self.model_info,
            },
            records,
        }
    }
}
