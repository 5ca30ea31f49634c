//! relkg Extractor - Relation extraction pipeline
//!
//! Turns free text into a deduplicated set of `(head, type, tail)` triplets:
//! the text is split into overlapping token windows, each window is decoded
//! by a sequence-to-sequence generator, and the linearized output is parsed
//! and accumulated into a [`KnowledgeBase`].

pub mod knowledge_base;
pub mod parser;
pub mod pipeline;
pub mod segmenter;

pub use knowledge_base::{AddOutcome, KnowledgeBase};
pub use parser::{strip_sentinels, ParserState, Token, TripletParser};
pub use pipeline::{build_batch, Extraction, ExtractionMode, ExtractionStats, Extractor};
pub use segmenter::{segment, SpanSegmenter};
