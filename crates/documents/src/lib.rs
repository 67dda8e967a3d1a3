//! Turning a [`DocumentSource`](docqa_core::DocumentSource) into bounded plain text.
//!
//! - [`acquire`] fetches or accepts the bytes and classifies their format
//! - [`artifact`] holds those bytes on disk for exactly one request
//! - [`extract`] converts a [`RawDocument`](docqa_core::RawDocument) to text
//! - [`budget`] caps the text before it goes into a prompt

pub mod acquire;
pub mod artifact;
pub mod budget;
pub mod extract;

pub use acquire::{AcquiredDocument, SourceAcquirer};
pub use artifact::TempArtifact;
pub use budget::budget;
pub use extract::FormatExtractor;
