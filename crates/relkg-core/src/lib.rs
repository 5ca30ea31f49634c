//! relkg Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout relkg:
//! - Extraction models (spans, provenance, triplets, entities)
//! - Common error types
//! - Collaborator traits for tokenizers, generators and entity resolvers
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, GeneratorConfig, LoggingConfig, MarkerConfig,
    ResolverConfig, ServerConfig,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for relkg operations
#[derive(Error, Debug)]
pub enum RelkgError {
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Resolver error: {0}")]
    Resolver(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RelkgError>;

// ============================================================================
// Spans and Provenance
// ============================================================================

/// Half-open token interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of token positions covered
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `position` falls inside the span
    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end
    }

    /// Clamp the span so it does not extend past `limit`
    pub fn clip(&self, limit: usize) -> Self {
        Self {
            start: self.start.min(limit),
            end: self.end.min(limit),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Ordered set of spans supporting a triplet
///
/// Spans keep their order of first appearance and are never duplicated
/// when merged through [`Provenance::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provenance {
    spans: Vec<Span>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provenance made of a single span
    pub fn single(span: Span) -> Self {
        Self { spans: vec![span] }
    }

    /// Add a span unless it is already present. Returns true if it was added.
    pub fn insert(&mut self, span: Span) -> bool {
        if self.spans.contains(&span) {
            return false;
        }
        self.spans.push(span);
        true
    }

    /// Union `other` into this provenance, preserving first-appearance order.
    /// Returns the number of spans added.
    pub fn merge(&mut self, other: &Provenance) -> usize {
        other.spans.iter().filter(|s| self.insert(**s)).count()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl FromIterator<Span> for Provenance {
    fn from_iter<I: IntoIterator<Item = Span>>(iter: I) -> Self {
        let mut provenance = Provenance::new();
        for span in iter {
            provenance.insert(span);
        }
        provenance
    }
}

// ============================================================================
// Triplets and Entities
// ============================================================================

/// A `(head, type, tail)` relation extracted from text
///
/// Identity is the `(head, type, tail)` tuple; provenance is metadata and
/// never takes part in comparisons made by the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Triplet {
    /// Subject entity
    pub head: String,

    /// Relation label
    #[serde(rename = "type")]
    pub relation: String,

    /// Object entity
    pub tail: String,

    /// Token spans supporting this triplet
    #[serde(default)]
    pub provenance: Provenance,
}

impl Triplet {
    /// Create a triplet with empty provenance
    pub fn new(
        head: impl Into<String>,
        relation: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
            provenance: Provenance::new(),
        }
    }

    /// Attach a provenance span
    pub fn with_span(mut self, span: Span) -> Self {
        self.provenance.insert(span);
        self
    }

    /// Identity key used for deduplication
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.head, &self.relation, &self.tail)
    }

    /// Whether both triplets describe the same relation, ignoring provenance
    pub fn same_relation(&self, other: &Triplet) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.head, self.relation, self.tail)
    }
}

/// Canonical entity record returned by an [`EntityResolver`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical title
    pub title: String,

    /// Source page URL
    pub url: String,

    /// Short summary of the entity
    pub summary: String,
}

impl Entity {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            summary: summary.into(),
        }
    }
}

/// Outcome of an entity lookup
///
/// Not-found, ambiguous and transport failures all map to `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Entity),
    Absent,
}

impl Resolution {
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            Self::Resolved(entity) => Some(entity),
            Self::Absent => None,
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Self::Resolved(entity) => Some(entity),
            Self::Absent => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

// ============================================================================
// Generation Types
// ============================================================================

/// Token ids and attention mask produced by a tokenizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl Encoding {
    pub fn new(ids: Vec<u32>, attention_mask: Vec<u32>) -> Self {
        Self {
            ids,
            attention_mask,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Batched generator input, one row per window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationBatch {
    pub input_ids: Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u32>>,
}

impl GenerationBatch {
    /// Number of rows in the batch
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Decoding parameters passed to the generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum length of each generated sequence
    pub max_length: usize,

    /// Beam search length penalty
    pub length_penalty: f32,

    /// Beam width
    pub num_beams: usize,

    /// Candidates returned per input row
    pub num_return_sequences: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 256,
            length_penalty: 0.0,
            num_beams: 3,
            num_return_sequences: 3,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for tokenizers
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids and attention mask
    fn encode(&self, text: &str) -> Result<Encoding>;

    /// Decode token ids, keeping marker tokens verbatim
    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// Id used to right-pad shorter rows in a batch
    fn pad_token_id(&self) -> u32;
}

/// Trait for sequence-to-sequence generators
///
/// Returns `batch.len() * params.num_return_sequences` decoded strings,
/// grouped per input row in row order, then candidate order.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        batch: &GenerationBatch,
        params: &GenerationParams,
    ) -> Result<Vec<String>>;

    /// Generator name for logging
    fn name(&self) -> &str;
}

/// Trait for entity lookup services
///
/// Lookups are exact-title matches; the same candidate must resolve to the
/// same canonical title within one run.
#[async_trait::async_trait]
pub trait EntityResolver: Send + Sync {
    async fn resolve(&self, candidate: &str) -> Resolution;

    /// Resolver name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
