//! The document-to-answer pipeline.
//!
//! Acquire → extract → budget, once per document; then, for each question in
//! order, build a prompt and ask the model; finally assemble the result.
//! [`Pipeline::run`] is the single operation every outer surface calls.

pub mod assemble;
pub mod engine;
pub mod prompt;

use std::sync::Arc;
use std::time::Instant;

use docqa_config::{AppConfig, FailureMode};
use docqa_core::{AnswerRecord, DocumentSource, ModelInfo, PipelineError, PipelineResult, Provider, Result};
use docqa_documents::{AcquiredDocument, FormatExtractor, SourceAcquirer, budget};
use tracing::{Instrument, info, info_span, warn};

pub use assemble::ResultAssembler;
pub use engine::AnswerEngine;
pub use prompt::{FALLBACK_PHRASE, PromptBuilder};

/// Stateless between runs; safe to share behind an `Arc`.
pub struct Pipeline {
    acquirer: SourceAcquirer,
    engine: AnswerEngine,
    text_budget: usize,
    failure_mode: FailureMode,
}

impl Pipeline {
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Self {
        Self {
            acquirer: SourceAcquirer::from_config(&config.documents),
            engine: AnswerEngine::new(provider, config),
            text_budget: config.documents.text_budget_chars,
            failure_mode: config.pipeline.failure_mode,
        }
    }

    pub fn with_engine(mut self, engine: AnswerEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn model(&self) -> &str {
        self.engine.model()
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Answer every question against one document.
    ///
    /// Fails before touching the document when `questions` is empty. The
    /// temporary artifact is gone by the time this returns, on every path.
    pub async fn run(&self, source: DocumentSource, questions: &[String]) -> Result<PipelineResult> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let descriptor = source.descriptor();
        let span = info_span!("pipeline", request_id = %request_id, source = %descriptor);

        async move {
            if questions.is_empty() {
                return Err(PipelineError::Validation(
                    "at least one question is required".into(),
                ));
            }

            let started = Instant::now();
            info!(questions = questions.len(), "Processing document");

            let AcquiredDocument { artifact, document } = self.acquirer.acquire(&source).await?;
            let file_size = document.len();
            let format = document.format;

            let extracted = FormatExtractor::extract(document).await;
            drop(artifact);
            let (_, text) = extracted.inspect_err(|e| warn!(kind = e.kind(), error = %e, "Extraction failed"))?;

            let text_length = text.chars().count();
            let budgeted = budget(&text, self.text_budget);
            let budgeted_length = budgeted.chars().count();
            info!(%format, text_length, budgeted_length, "Document text ready");

            let mut records = Vec::with_capacity(questions.len());
            for (index, question) in questions.iter().enumerate() {
                let prompt = PromptBuilder::build(budgeted, question);
                match self.engine.ask(prompt).await {
                    Ok(answer) => records.push(AnswerRecord::answered(question, answer)),
                    Err(e) => match self.failure_mode {
                        FailureMode::FailFast => {
                            warn!(question_index = index, error = %e, "Model call failed, aborting batch");
                            return Err(PipelineError::ModelInvocation {
                                question_index: index,
                                source: e,
                            });
                        }
                        FailureMode::PerQuestion => {
                            warn!(question_index = index, error = %e, "Model call failed, recording and continuing");
                            records.push(AnswerRecord::failed(question, e.to_string()));
                        }
                    },
                }
            }

            let result = ResultAssembler {
                request_id: request_id.clone(),
                source: descriptor.clone(),
                file_size: Some(file_size),
                model_info: ModelInfo {
                    llm: self.engine.model().to_string(),
                    text_length,
                    budgeted_length,
                },
            }
            .finish(records);

            info!(
                failed = result.metadata.failed_questions,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Document processed"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }
}
