//! Prompt construction.

/// What the model is told to say when the document has no answer.
pub const FALLBACK_PHRASE: &str = "Information not found in the document.";

/// Builds the per-question prompt.
///
/// The template is fixed: the budgeted text verbatim, the literal question,
/// then the instruction to answer only from the document. The same inputs
/// always give the same prompt.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(budgeted_text: &str, question: &str) -> String {
        format!(
            "Document Text:\n{budgeted_text}\n\n\
             Question: {question}\n\n\
             Please provide a clear, concise answer based on the document content. \
             If the answer is not found in the document, say \"{FALLBACK_PHRASE}\""
        )
    }
}
