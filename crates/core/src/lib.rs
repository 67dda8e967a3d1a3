//! # docqa Core
//!
//! Domain types, traits, and error definitions for the docqa
//! document-to-answer pipeline. This crate has no framework dependencies:
//! it defines the model that the document, provider, pipeline and gateway
//! crates implement against.
//!
//! - [`document`]: where a document comes from and what format it is in
//! - [`answer`]: per-question records and the assembled result
//! - [`provider`]: the abstraction over generative-language-model services
//! - [`error`]: the caller-facing error taxonomy

pub mod answer;
pub mod document;
pub mod error;
pub mod message;
pub mod provider;

pub use answer::{AnswerRecord, ModelInfo, PipelineResult, ResultMetadata};
pub use document::{DocumentFormat, DocumentSource, RawDocument, SourceDescriptor};
pub use error::{PipelineError, ProviderError, Result, StatusClass};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
